use super::*;

/// Error bodies are only kept for logs; cap what we hold on to.
const DETAIL_LIMIT: usize = 512;

pub(super) fn transport(label: &'static str, err: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        label,
        message: format!("{:#}", anyhow::Error::new(err)),
    }
}

impl ConversionClient {
    pub(super) fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        label: &'static str,
    ) -> Result<reqwest::blocking::Response, RemoteError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail = resp
            .text()
            .map(|mut body| {
                if body.len() > DETAIL_LIMIT {
                    let mut cut = DETAIL_LIMIT;
                    while !body.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    body.truncate(cut);
                }
                body
            })
            .unwrap_or_default();

        Err(RemoteError::Rejected {
            label,
            status: status.as_u16(),
            detail,
        })
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub(super) fn file_part(file: &SelectedFile) -> reqwest::blocking::multipart::Part {
    reqwest::blocking::multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone())
}
