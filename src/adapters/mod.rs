//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: reqwest client for the clinical REST service
//! - `spool`: HTML report spooling and print command
//! - `sanitize`: PII filtering for logs

pub mod http;
pub mod sanitize;
pub mod spool;

pub use http::HttpBackend;
pub use spool::{SpoolError, SpoolPrinter};
