//! Application layer: use cases and the state they share.
//!
//! Components hold state and produce [`Request`]s. Nothing here performs
//! I/O; see [`dispatch::execute`] for where requests meet the backend.

pub mod acquisition;
pub mod admin;
pub mod context;
pub mod diagnosis;
pub mod dispatch;
pub mod fencing;
pub mod navigator;
pub mod records;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use acquisition::DataAcquisitionPipeline;
pub use admin::AdminUserManager;
pub use context::{AppContext, BackendStatus};
pub use diagnosis::DiagnosisOrchestrator;
pub use dispatch::{execute, Request, Response};
pub use fencing::{RequestFence, RequestKind, Ticket};
pub use navigator::{Access, Navigator, Screen};
pub use records::{ExportOutcome, HistoryStatus, RecordPersistence};
pub use session::SessionGuard;

use crate::ports::BackendError;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// One line of feedback for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Message for a failed call: `connectivity` if the service was unreachable,
/// else the server's own message, else `fallback`.
pub(crate) fn failure_text(err: &BackendError, connectivity: &str, fallback: &str) -> String {
    if err.is_transport() {
        return connectivity.to_string();
    }
    err.server_message().unwrap_or(fallback).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_text_precedence() {
        let offline = BackendError::Transport("refused".into());
        assert_eq!(failure_text(&offline, "offline", "fallback"), "offline");

        let said = BackendError::rejected(400, "Username exists");
        assert_eq!(failure_text(&said, "offline", "fallback"), "Username exists");

        let blank = BackendError::rejected(500, "   ");
        assert_eq!(failure_text(&blank, "offline", "fallback"), "fallback");

        let garbled = BackendError::Decode("expected value".into());
        assert_eq!(failure_text(&garbled, "offline", "fallback"), "fallback");
    }
}
