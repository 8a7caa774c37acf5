//! Driving the controller without a UI, for scripted conversions.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::controller::{Controller, Outcome};
use crate::delivery::DownloadDir;
use crate::model::{Mode, SelectedFile};
use crate::remote::Backend;
use crate::surface::Surface;

/// Surface that saves deliveries to disk and remembers alerts instead of
/// showing them.
pub struct ConsoleSurface {
    downloads: DownloadDir,
    pub alerts: Vec<String>,
    pub saved: Vec<PathBuf>,
}

impl ConsoleSurface {
    pub fn new(downloads: DownloadDir) -> Self {
        Self {
            downloads,
            alerts: Vec::new(),
            saved: Vec::new(),
        }
    }
}

impl Surface for ConsoleSurface {
    fn mode_selected(&mut self, active: Mode) {
        tracing::debug!(mode = %active, "mode active");
    }

    fn set_mapping_area_visible(&mut self, visible: bool) {
        tracing::debug!(visible, "mapping area");
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn deliver(&mut self, payload: &[u8], suggested_name: &str) -> Result<()> {
        let path = self.downloads.save(payload, suggested_name)?;
        self.saved.push(path);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ConversionRequest {
    pub file: SelectedFile,
    pub advanced: bool,
    /// Source field -> new name; every source must be one the service reported.
    pub maps: Vec<(String, String)>,
    pub fields: Vec<(String, String)>,
}

/// Runs one conversion to completion and returns where the result was saved.
pub fn convert(
    backend: Arc<dyn Backend>,
    downloads: DownloadDir,
    req: ConversionRequest,
) -> Result<PathBuf> {
    let mut ctl = Controller::new(backend);
    let mut ui = ConsoleSurface::new(downloads);

    for (name, value) in req.fields {
        ctl.set_form_field(name, value);
    }
    if req.advanced {
        ctl.select_mode(Mode::Advanced, &mut ui);
    }
    ctl.file_changed(Some(req.file));

    if req.advanced {
        let outcomes = ctl.wait_idle(&mut ui);
        if !outcomes
            .iter()
            .any(|o| matches!(o, Outcome::FieldsRendered { .. }))
        {
            anyhow::bail!("field analysis failed (see log output)");
        }
        for (source, target) in req.maps {
            let index = ctl.mappings().position(&source).with_context(|| {
                format!(
                    "unknown source field {:?} (fields: {})",
                    source,
                    ctl.mappings()
                        .rows()
                        .iter()
                        .map(|r| r.source())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?;
            ctl.set_target(index, target);
        }
    }

    ctl.submit();
    let outcomes = ctl.wait_idle(&mut ui);
    match outcomes.last() {
        Some(Outcome::Delivered { .. }) => ui
            .saved
            .pop()
            .context("conversion delivered but nothing was saved"),
        _ => {
            let alert = ui
                .alerts
                .pop()
                .unwrap_or_else(|| "conversion did not complete".to_string());
            anyhow::bail!(alert)
        }
    }
}
