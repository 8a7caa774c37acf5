//! The mode and mapping controller.
//!
//! All state lives on the thread that owns the [`Controller`]. Network calls
//! run on short-lived worker threads and report back over a channel;
//! completions are only applied from [`Controller::pump`] or
//! [`Controller::wait_idle`], so handlers never observe a half-applied
//! response.
//!
//! Analysis requests are not serialized: two quick file changes can have two
//! requests in flight, and whichever response arrives last decides the
//! rendered rows.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::model::{CONVERTED_FILE_NAME, ConversionForm, Mode, SelectedFile};
use crate::remote::{AnalysisReport, Backend, RemoteError};
use crate::surface::Surface;

mod mapping;
pub use self::mapping::{MappingEntry, MappingList};

/// Alert text for a conversion the service refused.
pub const ALERT_CONVERSION_FAILED: &str = "Conversion failed";
/// Alert text for a conversion that never got an answer.
pub const ALERT_TRANSPORT: &str = "An error occurred";
/// Alert text when the converted bytes could not be handed to the user.
pub const ALERT_DELIVERY: &str = "Could not save the converted file";

enum Completion {
    Analysis {
        seq: u64,
        file: String,
        result: Result<AnalysisReport, RemoteError>,
    },
    Conversion {
        result: Result<Vec<u8>, RemoteError>,
    },
}

/// What applying one completion did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    FieldsRendered { seq: u64, count: usize },
    AnalysisFailed { seq: u64 },
    Delivered { bytes: usize },
    ConversionFailed,
}

pub struct Controller {
    backend: Arc<dyn Backend>,

    mode: Mode,
    file: Option<SelectedFile>,
    form_fields: Vec<(String, String)>,
    mappings: MappingList,

    next_seq: u64,
    rendered_seq: Option<u64>,
    in_flight: usize,

    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Controller {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            mode: Mode::Normal,
            file: None,
            form_fields: Vec::new(),
            mappings: MappingList::default(),
            next_seq: 0,
            rendered_seq: None,
            in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn mappings(&self) -> &MappingList {
        &self.mappings
    }

    /// Requests issued but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn select_mode(&mut self, mode: Mode, surface: &mut dyn Surface) {
        tracing::debug!(from = %self.mode, to = %mode, "mode selected");
        self.mode = mode;
        surface.mode_selected(mode);
        surface.set_mapping_area_visible(mode == Mode::Advanced);

        if mode == Mode::Advanced
            && let Some(file) = self.file.clone()
        {
            self.start_analysis(file);
        }
    }

    /// The file picker changed. `None` means the selection was cleared.
    pub fn file_changed(&mut self, file: Option<SelectedFile>) {
        self.file = file;
        if self.mode != Mode::Advanced {
            return;
        }
        if let Some(file) = self.file.clone() {
            self.start_analysis(file);
        }
    }

    /// Renders `fields` as fresh mapping rows, discarding the old ones.
    pub fn render_mappings(&mut self, fields: &[String]) {
        self.mappings.render(fields);
    }

    pub fn set_target(&mut self, index: usize, target: impl Into<String>) -> bool {
        self.mappings.set_target(index, target)
    }

    /// Declares an extra text field sent with every conversion. Setting the
    /// same name again replaces the value.
    pub fn set_form_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.form_fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.form_fields.push((name, value)),
        }
    }

    /// The payload `submit` would send right now.
    pub fn conversion_form(&self) -> ConversionForm {
        let mapping = match self.mode {
            Mode::Advanced => Some(self.mappings.to_json()),
            Mode::Normal => None,
        };
        ConversionForm {
            file: self.file.clone(),
            fields: self.form_fields.clone(),
            mapping,
        }
    }

    pub fn submit(&mut self) {
        let form = self.conversion_form();
        tracing::info!(
            mode = %self.mode,
            file = form.file.as_ref().map(|f| f.name.as_str()).unwrap_or("-"),
            mapping = form.mapping.as_deref().unwrap_or("-"),
            "submitting conversion"
        );

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.in_flight += 1;
        let spawned = std::thread::Builder::new()
            .name("fluxconv-convert".to_string())
            .spawn(move || {
                let result = backend.convert(&form);
                let _ = tx.send(Completion::Conversion { result });
            });
        if let Err(err) = spawned {
            let _ = self.tx.send(Completion::Conversion {
                result: Err(RemoteError::Transport {
                    label: "convert",
                    message: format!("spawn worker: {}", err),
                }),
            });
        }
    }

    fn start_analysis(&mut self, file: SelectedFile) {
        self.next_seq += 1;
        let seq = self.next_seq;
        let name = file.name.clone();
        tracing::info!(seq, file = %name, bytes = file.len(), "analyzing file");

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.in_flight += 1;
        let spawned = std::thread::Builder::new()
            .name(format!("fluxconv-analyze-{}", seq))
            .spawn(move || {
                let result = backend.analyze(&file);
                let _ = tx.send(Completion::Analysis {
                    seq,
                    file: file.name,
                    result,
                });
            });
        if let Err(err) = spawned {
            let _ = self.tx.send(Completion::Analysis {
                seq,
                file: name,
                result: Err(RemoteError::Transport {
                    label: "analyze",
                    message: format!("spawn worker: {}", err),
                }),
            });
        }
    }

    /// Applies every completion that has already arrived, without blocking.
    pub fn pump(&mut self, surface: &mut dyn Surface) -> Vec<Outcome> {
        let mut out = Vec::new();
        while let Ok(c) = self.rx.try_recv() {
            out.push(self.apply(c, surface));
        }
        out
    }

    /// Blocks for the next completion and applies it. `None` when nothing is
    /// in flight.
    pub fn next_outcome(&mut self, surface: &mut dyn Surface) -> Option<Outcome> {
        if self.in_flight == 0 {
            return None;
        }
        // `self.tx` keeps the channel open, so `recv` only returns once a
        // worker has reported.
        let c = self.rx.recv().ok()?;
        Some(self.apply(c, surface))
    }

    /// Blocks until every issued request has been applied.
    pub fn wait_idle(&mut self, surface: &mut dyn Surface) -> Vec<Outcome> {
        let mut out = Vec::new();
        while let Some(o) = self.next_outcome(surface) {
            out.push(o);
        }
        out
    }

    fn apply(&mut self, c: Completion, surface: &mut dyn Surface) -> Outcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match c {
            Completion::Analysis {
                seq,
                file,
                result: Ok(report),
            } => {
                if let Some(prev) = self.rendered_seq
                    && prev > seq
                {
                    tracing::warn!(
                        seq,
                        newer = prev,
                        file = %file,
                        "older analysis response arrived last; it replaces the newer rows"
                    );
                }
                self.rendered_seq = Some(seq);
                self.render_mappings(&report.fields);
                tracing::info!(seq, file = %file, fields = report.fields.len(), "fields rendered");
                Outcome::FieldsRendered {
                    seq,
                    count: report.fields.len(),
                }
            }

            Completion::Analysis {
                seq,
                file,
                result: Err(err),
            } => {
                if err.is_transport() {
                    tracing::error!(seq, file = %file, error = %err, "analysis request failed");
                } else {
                    tracing::warn!(seq, file = %file, error = %err, "analysis failed");
                }
                if let RemoteError::Rejected { detail, .. } = &err
                    && !detail.is_empty()
                {
                    tracing::debug!(seq, detail = %detail, "analysis rejection body");
                }
                Outcome::AnalysisFailed { seq }
            }

            Completion::Conversion { result: Ok(bytes) } => {
                match surface.deliver(&bytes, CONVERTED_FILE_NAME) {
                    Ok(()) => Outcome::Delivered { bytes: bytes.len() },
                    Err(err) => {
                        let err = format!("{:#}", err);
                        tracing::error!(error = %err, "delivering converted file");
                        surface.alert(ALERT_DELIVERY);
                        Outcome::ConversionFailed
                    }
                }
            }

            Completion::Conversion { result: Err(err) } => {
                if err.is_transport() {
                    tracing::error!(error = %err, "conversion request failed");
                    surface.alert(ALERT_TRANSPORT);
                } else {
                    if let RemoteError::Rejected { detail, .. } = &err {
                        tracing::debug!(detail = %detail, "conversion rejection body");
                    }
                    tracing::warn!(error = %err, "conversion failed");
                    surface.alert(ALERT_CONVERSION_FAILED);
                }
                Outcome::ConversionFailed
            }
        }
    }
}
