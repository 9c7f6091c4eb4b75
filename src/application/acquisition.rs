//! Data acquisition: fill the clinical form from a lab report.
//!
//! The manual-entry path needs no state here; the context just moves to the
//! prediction screen with the form as it is.

use std::path::Path;

use crate::domain::ClinicalForm;
use crate::ports::{BackendError, ReportDocument, ACCEPTED_EXTENSIONS};
use crate::NephroguardError;

use super::dispatch::Request;
use super::fencing::{RequestFence, RequestKind, Ticket};

/// Read a report from disk, checking its extension first.
///
/// # Errors
/// `Validation` if no path is given, the extension is unsupported, or the
/// file cannot be read.
pub fn load_document(path: &Path) -> Result<ReportDocument, NephroguardError> {
    if path.as_os_str().is_empty() {
        return Err(NephroguardError::Validation("No file selected".to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(NephroguardError::Validation(format!(
            "Unsupported file type '.{extension}' (expected one of: {})",
            ACCEPTED_EXTENSIONS.join(", ")
        )));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = std::fs::read(path).map_err(|e| {
        NephroguardError::Validation(format!("Cannot read {}: {e}", path.display()))
    })?;

    Ok(ReportDocument { file_name, bytes })
}

/// Drives the document path. At most one parse is in flight.
#[derive(Debug)]
pub struct DataAcquisitionPipeline {
    fence: RequestFence,
}

impl Default for DataAcquisitionPipeline {
    fn default() -> Self {
        Self {
            fence: RequestFence::new(RequestKind::ParseReport),
        }
    }
}

impl DataAcquisitionPipeline {
    /// True while a parse is outstanding; the upload trigger is disabled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.fence.is_busy()
    }

    /// Load `path` and issue a parse request.
    ///
    /// # Errors
    /// `Busy` while a parse is outstanding; `Validation` for local problems
    /// with the file. No request is issued in either case.
    pub fn begin_parse(&mut self, path: &Path) -> Result<Request, NephroguardError> {
        if self.fence.is_busy() {
            return Err(NephroguardError::Busy(RequestKind::ParseReport.label()));
        }
        let document = load_document(path)?;
        let ticket = self.fence.issue();
        tracing::info!(bytes = document.bytes.len(), "Submitting report for parsing");
        Ok(Request::ParseReport(ticket, document))
    }

    /// Apply a parse response. `None` when stale.
    ///
    /// Success replaces `form` wholesale. Failure leaves it untouched.
    pub fn finish_parse(
        &mut self,
        ticket: Ticket,
        outcome: Result<ClinicalForm, BackendError>,
        form: &mut ClinicalForm,
    ) -> Option<Result<(), String>> {
        if !self.fence.settle(ticket) {
            return None;
        }
        Some(match outcome {
            Ok(parsed) => {
                *form = parsed;
                tracing::info!("Report parsed into clinical form");
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Report parsing failed: {}", err);
                let detail = match &err {
                    BackendError::Transport(_) => "the parsing service is unreachable".to_string(),
                    other => other
                        .server_message()
                        .map_or_else(|| "the document could not be read".to_string(), str::to_string),
                };
                Err(format!("Failed to parse document: {detail}"))
            }
        })
    }

    /// Discard any outstanding parse.
    pub fn cancel(&mut self) {
        self.fence.cancel();
    }
}
