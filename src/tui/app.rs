//! Main TUI application loop.
//!
//! Handles:
//! - Screen navigation through the guarded navigator
//! - Input event handling per screen
//! - Handing queued backend requests to the worker and applying responses

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::adapters::{HttpBackend, SpoolPrinter};
use crate::application::{AppContext, ExportOutcome, Notice, Screen};
use crate::config::Config;
use crate::domain::FieldKind;
use crate::ports::ClinicalBackend;
use crate::NephroguardError;

use super::ui::{
    admin::{render_admin, AdminFocus, AdminState},
    banner_height,
    history::{render_history, HistoryState},
    home::render_home,
    login::{render_login, LoginState},
    performance::render_performance,
    prediction::{render_prediction, PredictionState},
    render_banner, render_disclaimer, render_header, render_status,
    upload::{render_upload, UploadState},
};
use super::worker::RequestWorker;

/// Main application state
pub struct App {
    ctx: AppContext,
    worker: RequestWorker,
    printer: SpoolPrinter,
    /// Outcome of the most recent action
    notice: Option<Notice>,
    should_quit: bool,
    login_state: LoginState,
    upload_state: UploadState,
    prediction_state: PredictionState,
    history_state: HistoryState,
    admin_state: AdminState,
}

impl App {
    /// Build the application against the configured backend and spool directory.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self::with_dependencies(
            backend,
            SpoolPrinter::from_config(config),
        ))
    }

    /// Create application with injected dependencies (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(backend: Arc<dyn ClinicalBackend>, printer: SpoolPrinter) -> Self {
        Self {
            ctx: AppContext::new(),
            worker: RequestWorker::new(backend),
            printer,
            notice: None,
            should_quit: false,
            login_state: LoginState::default(),
            upload_state: UploadState::default(),
            prediction_state: PredictionState::default(),
            history_state: HistoryState::default(),
            admin_state: AdminState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        self.ctx.start();

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.pump();

            terminal.draw(|f| self.draw(f))?;

            // Short poll to stay responsive
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }
        tracing::info!(pending = self.worker.in_flight(), "Leaving main loop");
        Ok(())
    }

    /// Apply finished responses, then start whatever the context queued.
    fn pump(&mut self) {
        while let Some(response) = self.worker.try_recv() {
            if let Some(notice) = self.ctx.apply(response) {
                self.notice = Some(notice);
            }
        }
        for request in self.ctx.drain_requests() {
            self.worker.dispatch(request);
        }
    }

    fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(banner_height(&self.ctx)),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(f.area());

        render_header(f, chunks[0], &self.ctx);
        if banner_height(&self.ctx) > 0 {
            render_banner(f, chunks[1]);
        }

        let content = chunks[2];
        match self.ctx.screen() {
            Screen::Home => render_home(f, content, &self.ctx),
            Screen::Login => render_login(f, content, &self.login_state, self.ctx.is_logging_in()),
            Screen::Upload => render_upload(f, content, &self.upload_state, self.ctx.is_parsing()),
            Screen::Prediction => render_prediction(f, content, &self.ctx, &self.prediction_state),
            Screen::History => render_history(f, content, &self.ctx, &self.history_state),
            Screen::Performance => render_performance(f, content),
            Screen::Admin => render_admin(f, content, &self.ctx, &self.admin_state),
        }

        render_status(f, chunks[3], self.notice.as_ref(), self.worker.in_flight());
        render_disclaimer(f, chunks[4]);
    }

    fn report(&mut self, outcome: Result<(), NephroguardError>) {
        if let Err(e) = outcome {
            tracing::debug!(error = %e, "Action rejected");
            self.notice = Some(Notice::error(e.to_string()));
        }
    }

    fn go(&mut self, target: Screen) {
        if !self.ctx.navigate(target) {
            self.notice = Some(Notice::error(format!("{} is not available", target.title())));
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }

        match key {
            KeyCode::F(1) => return self.go(Screen::Home),
            KeyCode::F(2) => return self.go(Screen::Login),
            KeyCode::F(3) => return self.go(Screen::Upload),
            KeyCode::F(4) => {
                if !self.ctx.manual_entry() {
                    self.notice = Some(Notice::error("Log in to enter values"));
                }
                return;
            }
            KeyCode::F(5) => return self.go(Screen::History),
            KeyCode::F(6) => return self.go(Screen::Performance),
            KeyCode::F(7) => return self.go(Screen::Admin),
            KeyCode::F(9) => {
                if self.ctx.identity().is_some() {
                    self.ctx.logout();
                    self.admin_state.clear_form();
                    self.prediction_state = PredictionState::default();
                    self.notice = Some(Notice::info("Logged out"));
                }
                return;
            }
            _ => {}
        }

        match self.ctx.screen() {
            Screen::Login => self.handle_login_key(key),
            Screen::Upload => self.handle_upload_key(key),
            Screen::Prediction => self.handle_prediction_key(key, ctrl),
            Screen::History => self.handle_history_key(key, ctrl),
            Screen::Admin => self.handle_admin_key(key, ctrl),
            Screen::Home | Screen::Performance => {}
        }
    }

    fn handle_login_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => self.login_state.toggle_focus(),
            KeyCode::Char(c) => self.login_state.input_char(c),
            KeyCode::Backspace => self.login_state.delete_char(),
            KeyCode::Enter => {
                let outcome = self
                    .ctx
                    .login(&self.login_state.username, &self.login_state.password);
                if outcome.is_ok() {
                    self.login_state.clear_password();
                }
                self.report(outcome);
            }
            _ => {}
        }
    }

    fn handle_upload_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) => self.upload_state.path.push(c),
            KeyCode::Backspace => {
                self.upload_state.path.pop();
            }
            KeyCode::Esc => self.upload_state.path.clear(),
            KeyCode::Enter => {
                let path = self.upload_state.path.trim().to_string();
                let outcome = self.ctx.upload_report(Path::new(&path));
                if outcome.is_ok() {
                    self.notice = Some(Notice::info("Parsing report..."));
                }
                self.report(outcome);
            }
            _ => {}
        }
    }

    fn handle_prediction_key(&mut self, key: KeyCode, ctrl: bool) {
        if ctrl {
            match key {
                KeyCode::Char('s') => {
                    let name = self.prediction_state.patient_name.clone();
                    let outcome = self.ctx.save_record(&name);
                    self.report(outcome);
                }
                KeyCode::Char('r') => {
                    self.ctx.reset();
                    self.prediction_state = PredictionState::default();
                    self.notice = Some(Notice::info("Form reset"));
                }
                _ => {}
            }
            return;
        }

        let field = self.prediction_state.selected_field();
        match key {
            KeyCode::Up => self.prediction_state.prev_row(),
            KeyCode::Down | KeyCode::Tab => self.prediction_state.next_row(),
            KeyCode::Enter => {
                let outcome = self.ctx.submit_diagnosis();
                self.report(outcome);
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if field.is_some() => {
                if let Some(field) = field.filter(|f| matches!(f.kind(), FieldKind::Choice(_))) {
                    self.ctx.cycle_field(field, key != KeyCode::Left);
                }
            }
            KeyCode::Char(c) => match field {
                Some(field) => {
                    if matches!(field.kind(), FieldKind::Text) {
                        let value = format!("{}{c}", self.ctx.form().get(field));
                        let outcome = self.ctx.set_field(field, &value);
                        self.report(outcome);
                    }
                }
                None => self.prediction_state.patient_name.push(c),
            },
            KeyCode::Backspace => match field {
                Some(field) => {
                    if matches!(field.kind(), FieldKind::Text) {
                        let mut value = self.ctx.form().get(field);
                        value.pop();
                        let outcome = self.ctx.set_field(field, &value);
                        self.report(outcome);
                    }
                }
                None => {
                    self.prediction_state.patient_name.pop();
                }
            },
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyCode, ctrl: bool) {
        if self.ctx.selected_record().is_some() {
            match key {
                KeyCode::Esc => self.ctx.close_record_view(),
                KeyCode::Char('p') if ctrl => {
                    self.notice = Some(match self.ctx.print_selected_record(&self.printer) {
                        Ok(receipt) => Notice::success(format!("Report sent to {}", receipt.location)),
                        Err(e) => Notice::error(e.to_string()),
                    });
                }
                _ => {}
            }
            return;
        }

        if ctrl {
            if key == KeyCode::Char('e') {
                let date = self.history_state.report_date.clone();
                self.notice = Some(match self.ctx.export_daily_report(&date, &self.printer) {
                    Ok(ExportOutcome::NoRecords) => {
                        Notice::info(format!("No records found for {}", date.trim()))
                    }
                    Ok(ExportOutcome::Printed { count, receipt }) => Notice::success(format!(
                        "Daily report ({count} patients) sent to {}",
                        receipt.location
                    )),
                    Err(e) => Notice::error(e.to_string()),
                });
            }
            return;
        }

        let hits = self.ctx.search_history(&self.history_state.query).len();
        match key {
            KeyCode::Tab => self.history_state.toggle_focus(),
            KeyCode::Up => {
                self.history_state.selected = self.history_state.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                self.history_state.selected += 1;
                self.history_state.clamp(hits);
            }
            KeyCode::Enter => {
                let record = self
                    .ctx
                    .search_history(&self.history_state.query)
                    .get(self.history_state.selected)
                    .map(|r| (*r).clone());
                if let Some(record) = record {
                    self.ctx.view_record(record);
                }
            }
            KeyCode::Char(c) => self.history_state.input_char(c),
            KeyCode::Backspace => self.history_state.delete_char(),
            _ => {}
        }
    }

    fn handle_admin_key(&mut self, key: KeyCode, ctrl: bool) {
        let selected_id = self
            .ctx
            .roster()
            .get(self.admin_state.selected)
            .map(|e| e.id);

        if ctrl {
            if key == KeyCode::Char('e') {
                if let Some(id) = selected_id {
                    let outcome = self.ctx.edit_user(id);
                    self.report(outcome);
                }
            }
            return;
        }

        match key {
            KeyCode::Tab => self.admin_state.next_focus(),
            KeyCode::Esc => self.admin_state.pending_removal = None,
            KeyCode::Up if self.admin_state.focus == AdminFocus::Roster => {
                self.admin_state.selected = self.admin_state.selected.saturating_sub(1);
                self.admin_state.pending_removal = None;
            }
            KeyCode::Down if self.admin_state.focus == AdminFocus::Roster => {
                let last = self.ctx.roster().len().saturating_sub(1);
                self.admin_state.selected = (self.admin_state.selected + 1).min(last);
                self.admin_state.pending_removal = None;
            }
            KeyCode::Delete if self.admin_state.focus == AdminFocus::Roster => {
                let Some(id) = selected_id else { return };
                let confirmed = self.admin_state.pending_removal == Some(id);
                let outcome = self.ctx.remove_access(id, confirmed);
                self.admin_state.pending_removal = if confirmed { None } else { Some(id) };
                if confirmed {
                    self.report(outcome);
                }
            }
            KeyCode::Enter if self.admin_state.focus != AdminFocus::Roster => {
                let outcome = self
                    .ctx
                    .create_account(&self.admin_state.username, &self.admin_state.password);
                if outcome.is_ok() {
                    self.admin_state.clear_form();
                }
                self.report(outcome);
            }
            KeyCode::Char(c) => self.admin_state.input_char(c),
            KeyCode::Backspace => self.admin_state.delete_char(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{record, ScriptedBackend};
    use crate::application::NoticeLevel;
    use crate::domain::{FormField, Identity, Role};
    use std::time::Instant;

    fn app(backend: &Arc<ScriptedBackend>, dir: &Path) -> App {
        App::with_dependencies(backend.clone(), SpoolPrinter::new(dir, None))
    }

    /// Pump until every queued and in-flight request has been applied.
    fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            app.pump();
            if app.worker.in_flight() == 0 {
                app.pump();
                if app.worker.in_flight() == 0 {
                    return;
                }
            }
            assert!(Instant::now() < deadline, "requests did not settle");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    fn log_in(app: &mut App) {
        app.handle_key(KeyCode::F(2), KeyModifiers::NONE);
        type_text(app, "admin");
        app.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        type_text(app, "123");
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        settle(app);
    }

    #[test]
    fn test_login_by_keyboard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(ScriptedBackend::default());
        backend.push_login(Ok(Identity::new("admin", Role::Admin)));
        let mut app = app(&backend, dir.path());

        log_in(&mut app);

        assert_eq!(app.ctx.screen(), Screen::Upload);
        assert!(app.login_state.password.is_empty());
        let notice = app.notice.as_ref().expect("welcome notice");
        assert_eq!(notice.text, "Welcome, admin");
    }

    #[test]
    fn test_guarded_screen_reports_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(ScriptedBackend::default());
        let mut app = app(&backend, dir.path());

        app.handle_key(KeyCode::F(7), KeyModifiers::NONE);
        assert_eq!(app.ctx.screen(), Screen::Home);
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[test]
    fn test_manual_entry_diagnose_and_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(ScriptedBackend::default());
        let mut app = app(&backend, dir.path());
        log_in(&mut app);

        app.handle_key(KeyCode::F(4), KeyModifiers::NONE);
        assert_eq!(app.ctx.screen(), Screen::Prediction);

        let first = FormField::ALL[0];
        let before = app.ctx.form().get(first);
        if matches!(first.kind(), FieldKind::Text) {
            type_text(&mut app, "4");
            assert_eq!(app.ctx.form().get(first), format!("{before}4"));
            app.handle_key(KeyCode::Backspace, KeyModifiers::NONE);
            assert_eq!(app.ctx.form().get(first), before);
        }

        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        settle(&mut app);
        assert!(app.ctx.result().is_some());

        app.handle_key(KeyCode::Up, KeyModifiers::NONE);
        type_text(&mut app, "Jane Doe");
        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);
        settle(&mut app);

        let saved = backend.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Jane Doe");
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Success));
    }

    #[test]
    fn test_history_view_and_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(ScriptedBackend::default());
        backend.push_history(Ok(vec![
            record("2024-05-02 09:15", "Jane Doe", "admin", "CKD DETECTED"),
            record("2024-05-03 10:00", "John Roe", "admin", "NO CKD DETECTED"),
        ]));
        let mut app = app(&backend, dir.path());
        log_in(&mut app);

        app.handle_key(KeyCode::F(5), KeyModifiers::NONE);
        settle(&mut app);
        assert_eq!(app.ctx.history().len(), 2);

        type_text(&mut app, "john");
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.ctx.selected_record().map(|r| r.name.as_str()), Some("John Roe"));

        app.handle_key(KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Success));
        app.handle_key(KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.ctx.selected_record().is_none());

        app.history_state.report_date = "2024-05-02".to_string();
        app.handle_key(KeyCode::Char('e'), KeyModifiers::CONTROL);
        let notice = app.notice.as_ref().expect("export notice");
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(notice.text.contains("1 patients"));
        assert!(dir.path().join("daily-report-2024-05-02.html").exists());

        app.history_state.report_date = "1999-01-01".to_string();
        app.handle_key(KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Info));
    }

    #[test]
    fn test_admin_removal_needs_two_presses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(ScriptedBackend::default());
        backend.push_login(Ok(Identity::new("admin", Role::Admin)));
        let mut app = app(&backend, dir.path());
        log_in(&mut app);
        app.handle_key(KeyCode::F(7), KeyModifiers::NONE);
        assert_eq!(app.ctx.screen(), Screen::Admin);
        app.notice = None;

        app.handle_key(KeyCode::Delete, KeyModifiers::NONE);
        assert_eq!(app.admin_state.pending_removal, Some(1));
        assert!(app.notice.is_none());

        app.handle_key(KeyCode::Delete, KeyModifiers::NONE);
        assert!(app.admin_state.pending_removal.is_none());
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Error));
        assert_eq!(app.ctx.roster().len(), 1);

        app.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        type_text(&mut app, "nurse1");
        app.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        type_text(&mut app, "pw");
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        settle(&mut app);
        assert_eq!(app.ctx.roster().len(), 2);
        assert!(app.admin_state.password.is_empty());
    }

    #[test]
    fn test_logout_returns_home() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(ScriptedBackend::default());
        let mut app = app(&backend, dir.path());
        log_in(&mut app);

        app.handle_key(KeyCode::F(9), KeyModifiers::NONE);
        assert!(app.ctx.identity().is_none());
        assert_eq!(app.ctx.screen(), Screen::Home);
    }
}
