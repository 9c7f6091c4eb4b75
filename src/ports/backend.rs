//! Backend port: Trait for the remote clinical services.
//!
//! One trait covers the credential service, the document parser, the scoring
//! model, and the record store. They share an origin and an error taxonomy.

use crate::domain::{
    ClinicalForm, CreateUserRequest, Credentials, DiagnosisResult, Identity, PatientRecord,
    SavePatientRequest,
};

/// Failure of a backend call.
///
/// `Transport` means no response arrived. `Rejected` means a response arrived
/// with a non-success status. The two are never conflated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Rejected with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Rejection carrying a server-supplied message.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Server-supplied message of a rejection, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref().filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }

    /// HTTP status of a rejection.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// File extensions the parsing service understands.
pub const ACCEPTED_EXTENSIONS: [&str; 6] = ["txt", "csv", "pdf", "jpg", "jpeg", "png"];

/// A lab report to be parsed into a clinical form.
#[derive(Clone)]
pub struct ReportDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ReportDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportDocument")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Remote clinical services.
///
/// Implementations must be callable from worker threads.
pub trait ClinicalBackend: Send + Sync {
    /// Dedicated liveness endpoint.
    ///
    /// # Errors
    /// `Rejected` with status 404 when the service has no such endpoint.
    fn health(&self) -> Result<(), BackendError>;

    /// Exchange credentials for an identity.
    ///
    /// # Errors
    /// Returns error if the service rejects the credentials or is unreachable.
    fn login(&self, credentials: &Credentials) -> Result<Identity, BackendError>;

    /// Create a staff account. The service re-checks the caller's role.
    ///
    /// # Errors
    /// Returns error if the service refuses or is unreachable.
    fn create_user(&self, request: &CreateUserRequest) -> Result<(), BackendError>;

    /// Extract a clinical form from a document.
    ///
    /// # Errors
    /// Any non-success status is a parse failure.
    fn parse_report(&self, document: &ReportDocument) -> Result<ClinicalForm, BackendError>;

    /// Score a clinical form.
    ///
    /// # Errors
    /// Returns error if the service rejects the form or is unreachable.
    fn predict(&self, form: &ClinicalForm) -> Result<DiagnosisResult, BackendError>;

    /// Store a patient record.
    ///
    /// # Errors
    /// Returns error if the store refuses or is unreachable.
    fn save_patient(&self, record: &SavePatientRequest) -> Result<(), BackendError>;

    /// Full record history, newest first.
    ///
    /// # Errors
    /// Returns error if the store is unreachable or the payload is malformed.
    fn get_history(&self) -> Result<Vec<PatientRecord>, BackendError>;
}

impl<T: ClinicalBackend + ?Sized> ClinicalBackend for std::sync::Arc<T> {
    fn health(&self) -> Result<(), BackendError> {
        (**self).health()
    }
    fn login(&self, credentials: &Credentials) -> Result<Identity, BackendError> {
        (**self).login(credentials)
    }
    fn create_user(&self, request: &CreateUserRequest) -> Result<(), BackendError> {
        (**self).create_user(request)
    }
    fn parse_report(&self, document: &ReportDocument) -> Result<ClinicalForm, BackendError> {
        (**self).parse_report(document)
    }
    fn predict(&self, form: &ClinicalForm) -> Result<DiagnosisResult, BackendError> {
        (**self).predict(form)
    }
    fn save_patient(&self, record: &SavePatientRequest) -> Result<(), BackendError> {
        (**self).save_patient(record)
    }
    fn get_history(&self) -> Result<Vec<PatientRecord>, BackendError> {
        (**self).get_history()
    }
}
