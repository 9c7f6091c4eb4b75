//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides the clinical workflow screens:
//! - Login and role-guarded navigation
//! - Lab report upload and the clinical form
//! - Diagnosis with TDF advisory
//! - Patient history, printing, and staff administration

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::MedicalTheme;
pub use worker::RequestWorker;
