//! The orchestration root.
//!
//! `AppContext` owns every piece of client state and is mutated only on the
//! UI thread. Operations queue [`Request`]s; [`AppContext::apply`] folds the
//! matching [`Response`] back in and yields at most one [`Notice`].

use std::path::Path;

use crate::domain::{
    ClinicalForm, DiagnosisResult, Employee, FormField, Identity, PatientRecord,
};
use crate::ports::{ClinicalBackend, PrintReceipt, ReportPrinter};
use crate::NephroguardError;

use super::acquisition::DataAcquisitionPipeline;
use super::admin::AdminUserManager;
use super::diagnosis::DiagnosisOrchestrator;
use super::dispatch::{execute, Request, Response};
use super::fencing::{RequestFence, RequestKind};
use super::navigator::{Navigator, Screen};
use super::records::{self, ExportOutcome, HistoryStatus, RecordPersistence};
use super::session::SessionGuard;
use super::Notice;

/// Result of the startup liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online,
    Unreachable,
}

#[derive(Debug)]
pub struct AppContext {
    session: SessionGuard,
    navigator: Navigator,
    form: ClinicalForm,
    result: Option<DiagnosisResult>,
    acquisition: DataAcquisitionPipeline,
    diagnosis: DiagnosisOrchestrator,
    records: RecordPersistence,
    admin: AdminUserManager,
    backend_status: BackendStatus,
    health: RequestFence,
    started: bool,
    outbox: Vec<Request>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: SessionGuard::new(),
            navigator: Navigator::default(),
            form: ClinicalForm::default(),
            result: None,
            acquisition: DataAcquisitionPipeline::default(),
            diagnosis: DiagnosisOrchestrator::default(),
            records: RecordPersistence::default(),
            admin: AdminUserManager::default(),
            backend_status: BackendStatus::Unknown,
            health: RequestFence::new(RequestKind::Health),
            started: false,
            outbox: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access for the front-end
    // ------------------------------------------------------------------

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.navigator.current()
    }

    #[must_use]
    pub fn form(&self) -> &ClinicalForm {
        &self.form
    }

    #[must_use]
    pub fn result(&self) -> Option<&DiagnosisResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn backend_status(&self) -> BackendStatus {
        self.backend_status
    }

    #[must_use]
    pub fn is_logging_in(&self) -> bool {
        self.session.is_logging_in()
    }

    #[must_use]
    pub fn is_parsing(&self) -> bool {
        self.acquisition.is_busy()
    }

    #[must_use]
    pub fn is_predicting(&self) -> bool {
        self.diagnosis.is_loading()
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.records.is_saving()
    }

    #[must_use]
    pub fn is_creating_account(&self) -> bool {
        self.admin.is_creating()
    }

    #[must_use]
    pub fn history_status(&self) -> HistoryStatus {
        self.records.status()
    }

    #[must_use]
    pub fn history(&self) -> &[PatientRecord] {
        self.records.records()
    }

    #[must_use]
    pub fn selected_record(&self) -> Option<&PatientRecord> {
        self.records.selected()
    }

    #[must_use]
    pub fn roster(&self) -> &[Employee] {
        self.admin.roster()
    }

    // ------------------------------------------------------------------
    // Lifecycle and navigation
    // ------------------------------------------------------------------

    /// Queue the one-time liveness check. Later calls do nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        tracing::info!("Probing backend");
        let ticket = self.health.issue();
        self.outbox.push(Request::Health(ticket));
    }

    /// Jump to `target` if its guard admits the current identity.
    ///
    /// Leaving Upload or Prediction invalidates their pending calls.
    /// Every arrival on History triggers a fresh fetch.
    pub fn navigate(&mut self, target: Screen) -> bool {
        let from = self.navigator.current();
        if !self.navigator.navigate(target, self.session.identity()) {
            return false;
        }
        if from != target {
            match from {
                Screen::Upload => self.acquisition.cancel(),
                Screen::Prediction => self.diagnosis.cancel(),
                Screen::History => self.records.close_record_view(),
                _ => {}
            }
        }
        if target == Screen::History {
            let request = self.records.begin_history();
            self.outbox.push(request);
        }
        true
    }

    /// # Errors
    /// `Busy` if a login is already pending.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), NephroguardError> {
        let request = self.session.begin_login(username, password)?;
        self.outbox.push(request);
        Ok(())
    }

    /// Drop the session, go home, and abandon every pending call.
    ///
    /// The working form and verdict are cleared so the next user starts blank.
    pub fn logout(&mut self) {
        self.session.logout();
        self.navigator.go_home();
        self.acquisition.cancel();
        self.diagnosis.cancel();
        self.records.cancel();
        self.records.close_record_view();
        self.admin.cancel();
        self.form = ClinicalForm::default();
        self.result = None;
        self.outbox.retain(|r| matches!(r, Request::Health(_)));
    }

    // ------------------------------------------------------------------
    // Data acquisition and the form
    // ------------------------------------------------------------------

    /// # Errors
    /// `Unauthorized` without a session; otherwise see
    /// [`DataAcquisitionPipeline::begin_parse`].
    pub fn upload_report(&mut self, path: &Path) -> Result<(), NephroguardError> {
        if !self.session.is_authenticated() {
            return Err(NephroguardError::Unauthorized("log in to upload reports".to_string()));
        }
        let request = self.acquisition.begin_parse(path)?;
        self.outbox.push(request);
        Ok(())
    }

    /// Skip parsing and go straight to the form.
    pub fn manual_entry(&mut self) -> bool {
        self.navigate(Screen::Prediction)
    }

    /// # Errors
    /// `Validation` when a choice field is given a value outside its set.
    pub fn set_field(&mut self, field: FormField, value: &str) -> Result<(), NephroguardError> {
        self.form.set(field, value).map_err(NephroguardError::Validation)
    }

    pub fn cycle_field(&mut self, field: FormField, forward: bool) {
        self.form.cycle(field, forward);
    }

    /// Restore the default form and drop any verdict, pending or shown.
    pub fn reset(&mut self) {
        self.diagnosis.cancel();
        self.form = ClinicalForm::default();
        self.result = None;
        tracing::debug!("Form reset");
    }

    // ------------------------------------------------------------------
    // Diagnosis and records
    // ------------------------------------------------------------------

    /// # Errors
    /// `Busy` while a submission is outstanding.
    pub fn submit_diagnosis(&mut self) -> Result<(), NephroguardError> {
        let request = self.diagnosis.begin_submit(&self.form, &mut self.result)?;
        self.outbox.push(request);
        Ok(())
    }

    /// # Errors
    /// See [`RecordPersistence::begin_save`].
    pub fn save_record(&mut self, patient_name: &str) -> Result<(), NephroguardError> {
        let request = self.records.begin_save(
            &self.form,
            self.result.as_ref(),
            self.session.identity(),
            patient_name,
        )?;
        self.outbox.push(request);
        Ok(())
    }

    #[must_use]
    pub fn search_history(&self, query: &str) -> Vec<&PatientRecord> {
        records::search(self.records.records(), query)
    }

    /// # Errors
    /// See [`records::export_daily_report`].
    pub fn export_daily_report<P: ReportPrinter>(
        &self,
        date: &str,
        printer: &P,
    ) -> Result<ExportOutcome, NephroguardError> {
        records::export_daily_report(self.records.records(), date, printer)
    }

    pub fn view_record(&mut self, record: PatientRecord) {
        self.records.view_record(record);
    }

    pub fn close_record_view(&mut self) {
        self.records.close_record_view();
    }

    /// Print the record open in the detail view.
    ///
    /// # Errors
    /// `Validation` when no record is open; `Print` if the printer fails.
    pub fn print_selected_record<P: ReportPrinter>(
        &self,
        printer: &P,
    ) -> Result<PrintReceipt, NephroguardError> {
        let record = self
            .records
            .selected()
            .ok_or_else(|| NephroguardError::Validation("No record selected".to_string()))?;
        printer
            .print(&records::record_document(record))
            .map_err(|e| NephroguardError::Print(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// # Errors
    /// See [`AdminUserManager::begin_create_account`].
    pub fn create_account(&mut self, username: &str, password: &str) -> Result<(), NephroguardError> {
        let request = self
            .admin
            .begin_create_account(self.session.identity(), username, password)?;
        self.outbox.push(request);
        Ok(())
    }

    /// # Errors
    /// See [`AdminUserManager::remove_access`].
    pub fn remove_access(&self, id: u32, confirmed: bool) -> Result<(), NephroguardError> {
        self.admin.remove_access(id, confirmed)
    }

    /// # Errors
    /// See [`AdminUserManager::edit_user`].
    pub fn edit_user(&self, id: u32) -> Result<(), NephroguardError> {
        self.admin.edit_user(id)
    }

    // ------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------

    /// Take every queued request.
    pub fn drain_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Fold one response into the state. Stale responses yield `None`.
    pub fn apply(&mut self, response: Response) -> Option<Notice> {
        match response {
            Response::Health(ticket, outcome) => {
                if !self.health.settle(ticket) {
                    return None;
                }
                match outcome {
                    Ok(()) => {
                        tracing::info!("Backend online");
                        self.backend_status = BackendStatus::Online;
                        None
                    }
                    Err(err) => {
                        tracing::warn!("Backend unreachable: {}", err);
                        self.backend_status = BackendStatus::Unreachable;
                        Some(Notice::error("Backend unreachable: clinical services are offline"))
                    }
                }
            }
            Response::Login(ticket, outcome) => {
                match self.session.finish_login(ticket, outcome)? {
                    Ok(identity) => {
                        let welcome = format!("Welcome, {}", identity.username);
                        self.navigator.navigate(Screen::Upload, Some(identity));
                        Some(Notice::success(welcome))
                    }
                    Err(message) => Some(Notice::error(message)),
                }
            }
            Response::ParseReport(ticket, outcome) => {
                match self.acquisition.finish_parse(ticket, outcome, &mut self.form)? {
                    Ok(()) => {
                        self.navigate(Screen::Prediction);
                        Some(Notice::success("Report parsed. Review the extracted values."))
                    }
                    Err(message) => Some(Notice::error(message)),
                }
            }
            Response::Predict(ticket, outcome) => {
                match self.diagnosis.finish_submit(ticket, outcome, &mut self.result)? {
                    Ok(()) => {
                        let prediction = self
                            .result
                            .as_ref()
                            .map(|r| r.prediction.clone())
                            .unwrap_or_default();
                        Some(Notice::info(format!("Diagnosis complete: {prediction}")))
                    }
                    Err(message) => Some(Notice::error(message)),
                }
            }
            Response::SavePatient(ticket, outcome) => {
                match self.records.finish_save(ticket, outcome)? {
                    Ok(()) => Some(Notice::success("Patient record saved")),
                    Err(message) => Some(Notice::error(message)),
                }
            }
            Response::History(ticket, outcome) => {
                if !self.records.finish_history(ticket, outcome) {
                    return None;
                }
                (self.records.status() == HistoryStatus::Failed)
                    .then(|| Notice::error("Could not load patient history"))
            }
            Response::CreateAccount(ticket, outcome) => {
                match self.admin.finish_create_account(ticket, outcome)? {
                    Ok(employee) => Some(Notice::success(format!(
                        "Account '{}' created",
                        employee.username
                    ))),
                    Err(message) => Some(Notice::error(message)),
                }
            }
        }
    }

    /// Run queued requests synchronously until the outbox is empty.
    pub fn run_pending<B: ClinicalBackend + ?Sized>(&mut self, backend: &B) -> Vec<Notice> {
        let mut notices = Vec::new();
        loop {
            let batch = self.drain_requests();
            if batch.is_empty() {
                break;
            }
            for request in batch {
                if let Some(notice) = self.apply(execute(backend, request)) {
                    notices.push(notice);
                }
            }
        }
        notices
    }
}
