//! # Nephroguard
//!
//! Terminal client for Chronic Kidney Disease screening in HIV care.
//!
//! This crate provides:
//! - Role-guarded navigation over the clinical workflow screens
//! - Lab report acquisition (document parsing or manual entry)
//! - Submission to a remote scoring service with TDF toxicity advisory
//! - Patient record saving, history search and daily report printing
//! - Staff account creation for administrators
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (ClinicalForm, DiagnosisResult, PatientRecord)
//! - `ports`: Trait definitions for the remote services and the printer
//! - `adapters`: Concrete implementations (reqwest HTTP client, report spooler)
//! - `application`: Orchestration components and the `AppContext` root
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::AppContext;
pub use config::Config;
pub use domain::{ClinicalForm, DiagnosisResult, Identity, PatientRecord, Role};

/// Result type for Nephroguard operations
pub type Result<T> = std::result::Result<T, NephroguardError>;

/// Main error type for Nephroguard
#[derive(Debug, thiserror::Error)]
pub enum NephroguardError {
    #[error("Backend call failed: {0}")]
    Backend(#[from] ports::BackendError),

    #[error("{0}")]
    Validation(String),

    #[error("Another {0} is already in progress")]
    Busy(&'static str),

    #[error("Not permitted: {0}")]
    Unauthorized(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Printing failed: {0}")]
    Print(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
