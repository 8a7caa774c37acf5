//! Response payloads and failure kinds of the conversion service.

/// Body of a successful `POST /api/analyze`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisReport {
    #[serde(default, rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    pub fields: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Connection refused, reset, body read failure, ...
    #[error("{label}: transport error: {message}")]
    Transport { label: &'static str, message: String },

    /// The service answered with a non-2xx status.
    #[error("{label}: rejected with HTTP {status}")]
    Rejected {
        label: &'static str,
        status: u16,
        detail: String,
    },

    /// 2xx, but the body was not what the endpoint promises.
    #[error("{label}: malformed response: {reason}")]
    Malformed { label: &'static str, reason: String },
}

impl RemoteError {
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport { .. })
    }
}
