//! `/api/analyze` and `/api/convert`.

use reqwest::blocking::multipart::Form;

use super::http_client::{file_part, transport};
use super::*;

impl ConversionClient {
    pub fn analyze_file(&self, file: &SelectedFile) -> Result<AnalysisReport, RemoteError> {
        const LABEL: &str = "analyze";

        let form = Form::new().part("file", file_part(file));
        let resp = self
            .client
            .post(self.url("/api/analyze"))
            .multipart(form)
            .send()
            .map_err(|e| transport(LABEL, e))?;

        let resp = self.ensure_ok(resp, LABEL)?;
        let body = resp.bytes().map_err(|e| transport(LABEL, e))?;
        let report: AnalysisReport =
            serde_json::from_slice(&body).map_err(|e| RemoteError::Malformed {
                label: LABEL,
                reason: e.to_string(),
            })?;

        tracing::debug!(
            file = %file.name,
            fields = report.fields.len(),
            "analysis response parsed"
        );
        Ok(report)
    }

    pub fn convert_file(&self, form: &ConversionForm) -> Result<Vec<u8>, RemoteError> {
        const LABEL: &str = "convert";

        let mut body = Form::new();
        if let Some(file) = &form.file {
            body = body.part("file", file_part(file));
        }
        for (name, value) in &form.fields {
            body = body.text(name.clone(), value.clone());
        }
        if let Some(mapping) = &form.mapping {
            body = body.text("mapping", mapping.clone());
        }

        let resp = self
            .client
            .post(self.url("/api/convert"))
            .multipart(body)
            .send()
            .map_err(|e| transport(LABEL, e))?;

        let resp = self.ensure_ok(resp, LABEL)?;
        let bytes = resp.bytes().map_err(|e| transport(LABEL, e))?;
        tracing::debug!(bytes = bytes.len(), "conversion response received");
        Ok(bytes.to_vec())
    }
}
