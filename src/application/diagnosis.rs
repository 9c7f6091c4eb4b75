//! Diagnosis orchestrator: submit a clinical form for scoring.
//!
//! All clinical logic (GFR, staging, TDF advisory) lives in the scoring
//! service. The result is shown exactly as returned.

use crate::domain::{ClinicalForm, DiagnosisResult};
use crate::ports::BackendError;
use crate::NephroguardError;

use super::dispatch::Request;
use super::fencing::{RequestFence, RequestKind, Ticket};
use super::failure_text;

const SCORING_UNREACHABLE: &str = "Network error: cannot connect to the scoring service";
const SCORING_FALLBACK: &str = "Unknown Error";

/// One scoring submission at a time.
#[derive(Debug)]
pub struct DiagnosisOrchestrator {
    fence: RequestFence,
}

impl Default for DiagnosisOrchestrator {
    fn default() -> Self {
        Self {
            fence: RequestFence::new(RequestKind::Predict),
        }
    }
}

impl DiagnosisOrchestrator {
    /// True while a submission is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.fence.is_busy()
    }

    /// Issue a scoring request for `form`.
    ///
    /// Clears `result` before anything is sent, so a stale verdict is never
    /// shown next to a form it does not belong to.
    ///
    /// # Errors
    /// `Busy` while a submission is outstanding; `result` is then left as is.
    pub fn begin_submit(
        &mut self,
        form: &ClinicalForm,
        result: &mut Option<DiagnosisResult>,
    ) -> Result<Request, NephroguardError> {
        let ticket = self.fence.try_issue().map_err(NephroguardError::Busy)?;
        *result = None;
        tracing::info!("Submitting clinical form for scoring");
        Ok(Request::Predict(ticket, form.clone()))
    }

    /// Apply a scoring response. `None` when stale.
    pub fn finish_submit(
        &mut self,
        ticket: Ticket,
        outcome: Result<DiagnosisResult, BackendError>,
        result: &mut Option<DiagnosisResult>,
    ) -> Option<Result<(), String>> {
        if !self.fence.settle(ticket) {
            return None;
        }
        Some(match outcome {
            Ok(verdict) => {
                tracing::info!(
                    stage = %verdict.stage,
                    tdf = %verdict.tdf.status,
                    "Scoring complete"
                );
                *result = Some(verdict);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Scoring failed: {}", err);
                *result = None;
                Err(match &err {
                    BackendError::Transport(_) => SCORING_UNREACHABLE.to_string(),
                    _ => format!(
                        "Server Error: {}",
                        failure_text(&err, SCORING_UNREACHABLE, SCORING_FALLBACK)
                    ),
                })
            }
        })
    }

    /// Discard any outstanding submission.
    pub fn cancel(&mut self) {
        self.fence.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::sample_result;

    #[test]
    fn test_submit_clears_previous_result() {
        let mut orchestrator = DiagnosisOrchestrator::default();
        let mut result = Some(sample_result());
        let request = orchestrator
            .begin_submit(&ClinicalForm::default(), &mut result)
            .expect("idle");
        assert!(result.is_none());
        assert!(orchestrator.is_loading());
        assert!(matches!(request, Request::Predict(..)));
    }

    #[test]
    fn test_busy_submit_rejected_and_result_untouched() {
        let mut orchestrator = DiagnosisOrchestrator::default();
        let mut result = None;
        let first = orchestrator
            .begin_submit(&ClinicalForm::default(), &mut result)
            .expect("idle");
        let mut shown = Some(sample_result());
        assert!(matches!(
            orchestrator.begin_submit(&ClinicalForm::default(), &mut shown),
            Err(NephroguardError::Busy(_))
        ));
        assert!(shown.is_some());

        orchestrator
            .finish_submit(first.ticket(), Ok(sample_result()), &mut result)
            .expect("current")
            .expect("ok");
        assert_eq!(result, Some(sample_result()));
        assert!(!orchestrator.is_loading());
    }

    #[test]
    fn test_rejection_surfaces_server_error() {
        let mut orchestrator = DiagnosisOrchestrator::default();
        let mut result = None;
        let request = orchestrator
            .begin_submit(&ClinicalForm::default(), &mut result)
            .expect("idle");
        let outcome = orchestrator
            .finish_submit(
                request.ticket(),
                Err(BackendError::rejected(500, "invalid age")),
                &mut result,
            )
            .expect("current");
        let message = outcome.unwrap_err();
        assert!(message.contains("invalid age"));
        assert!(result.is_none());
    }

    #[test]
    fn test_transport_failure_reported_as_network_error() {
        let mut orchestrator = DiagnosisOrchestrator::default();
        let mut result = None;
        let request = orchestrator
            .begin_submit(&ClinicalForm::default(), &mut result)
            .expect("idle");
        let message = orchestrator
            .finish_submit(
                request.ticket(),
                Err(BackendError::Transport("connection refused".into())),
                &mut result,
            )
            .expect("current")
            .unwrap_err();
        assert!(message.starts_with("Network error"));
        assert!(result.is_none());
    }

    #[test]
    fn test_cancelled_submission_discarded() {
        let mut orchestrator = DiagnosisOrchestrator::default();
        let mut result = None;
        let request = orchestrator
            .begin_submit(&ClinicalForm::default(), &mut result)
            .expect("idle");
        orchestrator.cancel();
        assert!(orchestrator
            .finish_submit(request.ticket(), Ok(sample_result()), &mut result)
            .is_none());
        assert!(result.is_none());
    }
}
