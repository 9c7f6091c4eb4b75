//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the orchestration core and the remote services and printer.

mod backend;
mod printer;

pub use backend::{BackendError, ClinicalBackend, ReportDocument, ACCEPTED_EXTENSIONS};
pub use printer::{PrintDocument, PrintReceipt, ReportPrinter};
