//! Domain layer: Core business types.
//!
//! Plain serializable types with no I/O. Wire names match the backend's
//! JSON contracts.

mod diagnosis;
mod employee;
mod form;
mod record;
mod session;

pub use diagnosis::{is_negative_label, DiagnosisResult, TdfAdvisory, TdfColor};
pub use employee::{bootstrap_roster, CreateUserRequest, Employee, EmployeeStatus};
pub use form::{CellFinding, ClinicalForm, FieldKind, FormField, Gender, Presence, YesNo};
pub use record::{PatientRecord, SavePatientRequest};
pub use session::{Credentials, Identity, Role};
