//! Scripted backend double for orchestration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::domain::{
    ClinicalForm, CreateUserRequest, Credentials, DiagnosisResult, Identity, PatientRecord, Role,
    SavePatientRequest, TdfAdvisory, TdfColor,
};
use crate::ports::{BackendError, ClinicalBackend, PrintDocument, PrintReceipt, ReportDocument, ReportPrinter};

/// Answers each endpoint from a queue; an empty queue gives a canned success.
#[derive(Default)]
pub struct ScriptedBackend {
    health: Mutex<VecDeque<Result<(), BackendError>>>,
    login: Mutex<VecDeque<Result<Identity, BackendError>>>,
    create_user: Mutex<VecDeque<Result<(), BackendError>>>,
    parse: Mutex<VecDeque<Result<ClinicalForm, BackendError>>>,
    predict: Mutex<VecDeque<Result<DiagnosisResult, BackendError>>>,
    save: Mutex<VecDeque<Result<(), BackendError>>>,
    history: Mutex<VecDeque<Result<Vec<PatientRecord>, BackendError>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    saved: Mutex<Vec<SavePatientRequest>>,
}

pub fn sample_result() -> DiagnosisResult {
    DiagnosisResult {
        prediction: "CKD DETECTED".into(),
        confidence: "87.5%".into(),
        stage: "Stage 3a".into(),
        gfr: "52.4".into(),
        tdf: TdfAdvisory {
            status: "CONTRAINDICATED".into(),
            color: TdfColor::Red,
            msg: "High toxicity risk".into(),
        },
    }
}

pub fn record(date: &str, name: &str, created_by: &str, diagnosis: &str) -> PatientRecord {
    PatientRecord {
        id: None,
        date: date.into(),
        name: name.into(),
        age: "40".into(),
        gender: "female".into(),
        diagnosis: diagnosis.into(),
        stage: "Stage 2".into(),
        tdf_status: "SAFE".into(),
        gfr: "75.0".into(),
        created_by: created_by.into(),
        extra: Default::default(),
    }
}

impl ScriptedBackend {
    fn hit(&self, endpoint: &'static str) {
        *self
            .calls
            .lock()
            .expect("calls lock")
            .entry(endpoint)
            .or_insert(0) += 1;
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn saved(&self) -> Vec<SavePatientRequest> {
        self.saved.lock().expect("saved lock").clone()
    }

    pub fn push_health(&self, r: Result<(), BackendError>) {
        self.health.lock().expect("lock").push_back(r);
    }
    pub fn push_login(&self, r: Result<Identity, BackendError>) {
        self.login.lock().expect("lock").push_back(r);
    }
    pub fn push_create_user(&self, r: Result<(), BackendError>) {
        self.create_user.lock().expect("lock").push_back(r);
    }
    pub fn push_parse(&self, r: Result<ClinicalForm, BackendError>) {
        self.parse.lock().expect("lock").push_back(r);
    }
    pub fn push_predict(&self, r: Result<DiagnosisResult, BackendError>) {
        self.predict.lock().expect("lock").push_back(r);
    }
    pub fn push_save(&self, r: Result<(), BackendError>) {
        self.save.lock().expect("lock").push_back(r);
    }
    pub fn push_history(&self, r: Result<Vec<PatientRecord>, BackendError>) {
        self.history.lock().expect("lock").push_back(r);
    }
}

impl ClinicalBackend for ScriptedBackend {
    fn health(&self) -> Result<(), BackendError> {
        self.hit("health");
        self.health.lock().expect("lock").pop_front().unwrap_or(Ok(()))
    }

    fn login(&self, credentials: &Credentials) -> Result<Identity, BackendError> {
        self.hit("login");
        self.login
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(Identity::new(credentials.username.clone(), Role::User)))
    }

    fn create_user(&self, _request: &CreateUserRequest) -> Result<(), BackendError> {
        self.hit("create_user");
        self.create_user.lock().expect("lock").pop_front().unwrap_or(Ok(()))
    }

    fn parse_report(&self, _document: &ReportDocument) -> Result<ClinicalForm, BackendError> {
        self.hit("parse_report");
        self.parse
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(ClinicalForm::default()))
    }

    fn predict(&self, _form: &ClinicalForm) -> Result<DiagnosisResult, BackendError> {
        self.hit("predict");
        self.predict
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(sample_result()))
    }

    fn save_patient(&self, record: &SavePatientRequest) -> Result<(), BackendError> {
        self.hit("save_patient");
        self.saved.lock().expect("lock").push(record.clone());
        self.save.lock().expect("lock").pop_front().unwrap_or(Ok(()))
    }

    fn get_history(&self) -> Result<Vec<PatientRecord>, BackendError> {
        self.hit("get_history");
        self.history
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Printer double that keeps every document it was handed.
#[derive(Default)]
pub struct CapturingPrinter {
    pub printed: Mutex<Vec<PrintDocument>>,
}

impl ReportPrinter for CapturingPrinter {
    type Error = std::io::Error;

    fn print(&self, document: &PrintDocument) -> Result<PrintReceipt, Self::Error> {
        self.printed.lock().expect("lock").push(document.clone());
        Ok(PrintReceipt {
            location: format!("memory:{}", document.file_stem),
        })
    }
}
