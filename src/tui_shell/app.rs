use std::collections::VecDeque;
use std::sync::OnceLock;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;

use crate::controller::{Controller, Outcome};
use crate::delivery::DownloadDir;
use crate::model::{Mode, SelectedFile};
use crate::surface::Surface;

use super::input::Input;

const LOG_KEEP: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum EntryKind {
    Output,
    Error,
}

#[derive(Clone, Debug)]
pub(super) struct LogLine {
    pub(super) ts: String,
    pub(super) kind: EntryKind,
    pub(super) text: String,
}

fn clock_format() -> &'static [BorrowedFormatItem<'static>] {
    static FMT: OnceLock<Vec<BorrowedFormatItem<'static>>> = OnceLock::new();
    FMT.get_or_init(|| {
        time::format_description::parse_borrowed::<2>("[hour]:[minute]:[second]")
            .expect("valid time format")
    })
}

fn now_clock() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(clock_format()).unwrap_or_default()
}

/// What the controller sees of the terminal.
pub(super) struct Screen {
    pub(super) active_mode: Mode,
    pub(super) mapping_visible: bool,
    pub(super) alerts: VecDeque<String>,
    pub(super) log: Vec<LogLine>,
    downloads: DownloadDir,
}

impl Screen {
    fn new(downloads: DownloadDir) -> Self {
        Self {
            active_mode: Mode::Normal,
            mapping_visible: false,
            alerts: VecDeque::new(),
            log: Vec::new(),
            downloads,
        }
    }

    pub(super) fn push_log(&mut self, kind: EntryKind, text: impl Into<String>) {
        self.log.push(LogLine {
            ts: now_clock(),
            kind,
            text: text.into(),
        });
        if self.log.len() > LOG_KEEP {
            let drop = self.log.len() - LOG_KEEP;
            self.log.drain(..drop);
        }
    }
}

impl Surface for Screen {
    fn mode_selected(&mut self, active: Mode) {
        self.active_mode = active;
    }

    fn set_mapping_area_visible(&mut self, visible: bool) {
        self.mapping_visible = visible;
    }

    fn alert(&mut self, message: &str) {
        self.push_log(EntryKind::Error, message);
        self.alerts.push_back(message.to_string());
    }

    fn deliver(&mut self, payload: &[u8], suggested_name: &str) -> Result<()> {
        let path = self.downloads.save(payload, suggested_name)?;
        self.push_log(
            EntryKind::Output,
            format!("saved {} ({} bytes)", path.display(), payload.len()),
        );
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum PromptKind {
    FilePath,
    /// Editing the target of the row that showed `source` at `index`.
    Target { index: usize, source: String },
}

#[derive(Debug)]
pub(super) struct Prompt {
    pub(super) kind: PromptKind,
    pub(super) input: Input,
}

impl Prompt {
    pub(super) fn label(&self) -> String {
        match &self.kind {
            PromptKind::FilePath => "file: ".to_string(),
            PromptKind::Target { source, .. } => format!("{} -> ", source),
        }
    }
}

pub(super) struct App {
    pub(super) ctl: Controller,
    pub(super) screen: Screen,
    pub(super) base_url: String,

    pub(super) file_path: Option<String>,
    pub(super) selected_row: usize,
    pub(super) prompt: Option<Prompt>,

    pub(super) quit: bool,
}

impl App {
    pub(super) fn new(ctl: Controller, base_url: String, downloads: DownloadDir) -> Self {
        let mut screen = Screen::new(downloads);
        screen.active_mode = ctl.mode();
        screen.mapping_visible = ctl.mode() == Mode::Advanced;
        Self {
            ctl,
            screen,
            base_url,
            file_path: None,
            selected_row: 0,
            prompt: None,
            quit: false,
        }
    }

    /// Applies finished requests and notes them in the activity log.
    pub(super) fn pump(&mut self) {
        for outcome in self.ctl.pump(&mut self.screen) {
            match outcome {
                Outcome::FieldsRendered { seq, count } => {
                    self.selected_row = 0;
                    self.screen.push_log(
                        EntryKind::Output,
                        format!("analysis #{}: {} fields", seq, count),
                    );
                }
                // Analysis failures only reach the log file; conversions
                // already went through the surface.
                Outcome::AnalysisFailed { .. }
                | Outcome::Delivered { .. }
                | Outcome::ConversionFailed => {}
            }
        }
    }

    pub(super) fn load_file(&mut self, path: String, file: SelectedFile) {
        self.screen.push_log(
            EntryKind::Output,
            format!("selected {} ({} bytes)", file.name, file.len()),
        );
        if file.is_empty() {
            self.screen
                .push_log(EntryKind::Error, format!("{} is empty", file.name));
        }
        self.file_path = Some(path);
        self.ctl.file_changed(Some(file));
    }

    fn clear_file(&mut self) {
        self.file_path = None;
        self.ctl.file_changed(None);
        self.screen.push_log(EntryKind::Output, "file selection cleared");
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        if !self.screen.alerts.is_empty() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.screen.alerts.pop_front();
            }
            return;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('n') => self.ctl.select_mode(Mode::Normal, &mut self.screen),
            KeyCode::Char('a') => self.ctl.select_mode(Mode::Advanced, &mut self.screen),
            KeyCode::Char('f') => {
                let mut input = Input::default();
                input.set(self.file_path.clone().unwrap_or_default());
                self.prompt = Some(Prompt {
                    kind: PromptKind::FilePath,
                    input,
                });
            }
            KeyCode::Char('s') => {
                self.screen.push_log(EntryKind::Output, "conversion submitted");
                self.ctl.submit();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_row = self.selected_row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let rows = self.ctl.mappings().len();
                if rows > 0 {
                    self.selected_row = (self.selected_row + 1).min(rows - 1);
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => self.edit_selected_target(),
            KeyCode::Char('x') | KeyCode::Delete => {
                if self.screen.mapping_visible {
                    self.ctl.set_target(self.selected_row, "");
                }
            }
            _ => {}
        }
    }

    fn edit_selected_target(&mut self) {
        if !self.screen.mapping_visible {
            return;
        }
        let Some(row) = self.ctl.mappings().rows().get(self.selected_row) else {
            return;
        };
        let mut input = Input::default();
        input.set(row.target().to_string());
        let kind = PromptKind::Target {
            index: self.selected_row,
            source: row.source().to_string(),
        };
        self.prompt = Some(Prompt { kind, input });
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
            KeyCode::Backspace => prompt.input.backspace(),
            KeyCode::Delete => prompt.input.delete(),
            KeyCode::Left => prompt.input.move_left(),
            KeyCode::Right => prompt.input.move_right(),
            KeyCode::Home => prompt.input.move_home(),
            KeyCode::End => prompt.input.move_end(),
            KeyCode::Char(c) => prompt.input.insert_char(c),
            _ => {}
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let value = prompt.input.buf;
        match prompt.kind {
            PromptKind::FilePath => {
                let path = value.trim();
                if path.is_empty() {
                    self.clear_file();
                    return;
                }
                match SelectedFile::read(std::path::Path::new(path)) {
                    Ok(file) => self.load_file(path.to_string(), file),
                    Err(err) => {
                        let err = format!("{:#}", err);
                        tracing::warn!(path, error = %err, "file not loaded");
                        self.screen.push_log(EntryKind::Error, err);
                    }
                }
            }
            PromptKind::Target { index, source } => {
                // Rows may have been re-rendered while the prompt was open.
                let same_row = self
                    .ctl
                    .mappings()
                    .rows()
                    .get(index)
                    .is_some_and(|r| r.source() == source);
                if !same_row || !self.ctl.set_target(index, value) {
                    tracing::warn!(index, source = %source, "mapping rows changed; edit discarded");
                    self.screen
                        .push_log(EntryKind::Error, "mapping rows changed; edit discarded");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::ConversionForm;
    use crate::remote::{AnalysisReport, Backend, RemoteError};

    struct StaticBackend;

    impl Backend for StaticBackend {
        fn analyze(&self, _file: &SelectedFile) -> Result<AnalysisReport, RemoteError> {
            Ok(AnalysisReport {
                file_name: None,
                fields: vec!["name".to_string(), "age".to_string()],
            })
        }

        fn convert(&self, _form: &ConversionForm) -> Result<Vec<u8>, RemoteError> {
            Err(RemoteError::Rejected {
                label: "convert",
                status: 400,
                detail: String::new(),
            })
        }
    }

    /// Answers each analysis with the next field list in line.
    struct ScriptedBackend {
        answers: std::sync::Mutex<std::collections::VecDeque<Vec<String>>>,
    }

    impl ScriptedBackend {
        fn new(answers: &[&[&str]]) -> Arc<Self> {
            let answers = answers
                .iter()
                .map(|fields| fields.iter().map(|f| f.to_string()).collect())
                .collect();
            Arc::new(Self {
                answers: std::sync::Mutex::new(answers),
            })
        }
    }

    impl Backend for ScriptedBackend {
        fn analyze(&self, _file: &SelectedFile) -> Result<AnalysisReport, RemoteError> {
            let fields = self.answers.lock().unwrap().pop_front().unwrap_or_default();
            Ok(AnalysisReport {
                file_name: None,
                fields,
            })
        }

        fn convert(&self, _form: &ConversionForm) -> Result<Vec<u8>, RemoteError> {
            Ok(b"{}".to_vec())
        }
    }

    fn app(dir: &std::path::Path) -> App {
        app_with(dir, Arc::new(StaticBackend))
    }

    fn app_with(dir: &std::path::Path, backend: Arc<dyn Backend>) -> App {
        App::new(
            Controller::new(backend),
            "http://127.0.0.1:1".to_string(),
            DownloadDir::new(dir),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn settle(app: &mut App) {
        app.ctl.wait_idle(&mut app.screen);
    }

    #[test]
    fn keys_drive_mode_analysis_and_target_editing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.screen.active_mode, Mode::Advanced);
        assert!(app.screen.mapping_visible);

        app.load_file("in.xml".to_string(), SelectedFile::new("in.xml", b"<r/>".to_vec()));
        settle(&mut app);
        assert_eq!(app.ctl.mappings().len(), 2);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        for c in "years".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert!(app.prompt.is_none());
        assert_eq!(app.ctl.mappings().rows()[1].target(), "years");
        assert_eq!(
            app.ctl.conversion_form().mapping.as_deref(),
            Some(r#"{"age":"years"}"#)
        );

        press(&mut app, KeyCode::Char('n'));
        assert!(!app.screen.mapping_visible);
        press(&mut app, KeyCode::Enter);
        assert!(app.prompt.is_none(), "no editing while the mapping area is hidden");
    }

    #[test]
    fn target_edit_is_dropped_when_rows_are_replaced_under_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new(&[&["name", "age"], &["id", "secret"]]);
        let mut app = app_with(dir.path(), backend);

        press(&mut app, KeyCode::Char('a'));
        app.load_file("a.xml".to_string(), SelectedFile::new("a.xml", b"<a/>".to_vec()));
        settle(&mut app);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.prompt.as_ref().unwrap().label(), "name -> ");

        // A later analysis lands while the editor is still open.
        app.load_file("b.xml".to_string(), SelectedFile::new("b.xml", b"<b/>".to_vec()));
        settle(&mut app);
        assert_eq!(app.ctl.mappings().rows()[0].source(), "id");

        for c in "fullName".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert!(app.prompt.is_none());
        assert!(app.ctl.mappings().rows().iter().all(|r| r.target().is_empty()));
        assert_eq!(app.ctl.conversion_form().mapping.as_deref(), Some("{}"));
        let last = app.screen.log.last().unwrap();
        assert_eq!(last.kind, EntryKind::Error);
        assert_eq!(last.text, "mapping rows changed; edit discarded");
    }

    #[test]
    fn target_edit_applies_when_rows_are_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new(&[&["name", "age"]]);
        let mut app = app_with(dir.path(), backend);

        press(&mut app, KeyCode::Char('a'));
        app.load_file("a.xml".to_string(), SelectedFile::new("a.xml", b"<a/>".to_vec()));
        settle(&mut app);

        press(&mut app, KeyCode::Enter);
        for c in "fullName".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.ctl.conversion_form().mapping.as_deref(),
            Some(r#"{"name":"fullName"}"#)
        );
    }

    #[test]
    fn empty_file_is_selected_with_a_note() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());

        app.load_file("e.xml".to_string(), SelectedFile::new("e.xml", Vec::new()));

        assert!(app.ctl.selected_file().is_some());
        let last = app.screen.log.last().unwrap();
        assert_eq!(last.kind, EntryKind::Error);
        assert_eq!(last.text, "e.xml is empty");
    }

    #[test]
    fn conversion_failure_shows_one_alert_that_blocks_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());

        press(&mut app, KeyCode::Char('s'));
        settle(&mut app);
        assert_eq!(app.screen.alerts.len(), 1);

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.quit, "alert must be dismissed first");
        press(&mut app, KeyCode::Enter);
        assert!(app.screen.alerts.is_empty());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.quit);
    }

    #[test]
    fn unreadable_path_is_logged_not_selected() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());

        press(&mut app, KeyCode::Char('f'));
        for c in dir.path().join("missing.xml").display().to_string().chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert!(app.ctl.selected_file().is_none());
        let last = app.screen.log.last().unwrap();
        assert_eq!(last.kind, EntryKind::Error);
        assert!(last.text.contains("missing.xml"), "{}", last.text);
    }
}
