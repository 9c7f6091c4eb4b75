//! Backend requests and their responses.
//!
//! The context never calls the backend directly. It queues a [`Request`];
//! whoever drives the context (the TUI worker, or a test) runs it with
//! [`execute`] and feeds the [`Response`] back through `AppContext::apply`.

use crate::domain::{
    ClinicalForm, CreateUserRequest, Credentials, DiagnosisResult, Identity, PatientRecord,
    SavePatientRequest,
};
use crate::ports::{BackendError, ClinicalBackend, ReportDocument};

use super::fencing::Ticket;

#[derive(Debug, Clone)]
pub enum Request {
    Health(Ticket),
    Login(Ticket, Credentials),
    ParseReport(Ticket, ReportDocument),
    Predict(Ticket, ClinicalForm),
    SavePatient(Ticket, SavePatientRequest),
    History(Ticket),
    CreateAccount(Ticket, CreateUserRequest),
}

impl Request {
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Health(t)
            | Self::Login(t, _)
            | Self::ParseReport(t, _)
            | Self::Predict(t, _)
            | Self::SavePatient(t, _)
            | Self::History(t)
            | Self::CreateAccount(t, _) => *t,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Response {
    Health(Ticket, Result<(), BackendError>),
    Login(Ticket, Result<Identity, BackendError>),
    ParseReport(Ticket, Result<ClinicalForm, BackendError>),
    Predict(Ticket, Result<DiagnosisResult, BackendError>),
    SavePatient(Ticket, Result<(), BackendError>),
    History(Ticket, Result<Vec<PatientRecord>, BackendError>),
    /// Carries the created username on success.
    CreateAccount(Ticket, Result<String, BackendError>),
}

/// Run one request against the backend. Blocks until the call returns.
pub fn execute<B: ClinicalBackend + ?Sized>(backend: &B, request: Request) -> Response {
    let ticket = request.ticket();
    tracing::debug!(kind = ticket.kind.label(), generation = ticket.generation, "Executing request");

    match request {
        Request::Health(t) => Response::Health(t, check_health(backend)),
        Request::Login(t, credentials) => Response::Login(t, backend.login(&credentials)),
        Request::ParseReport(t, document) => {
            Response::ParseReport(t, backend.parse_report(&document))
        }
        Request::Predict(t, form) => Response::Predict(t, backend.predict(&form)),
        Request::SavePatient(t, body) => Response::SavePatient(t, backend.save_patient(&body)),
        Request::History(t) => Response::History(t, backend.get_history()),
        Request::CreateAccount(t, body) => {
            let outcome = backend
                .create_user(&body)
                .map(|()| body.new_username.clone());
            Response::CreateAccount(t, outcome)
        }
    }
}

/// Use the dedicated health endpoint; fall back to the history listing when
/// the service does not expose one.
fn check_health<B: ClinicalBackend + ?Sized>(backend: &B) -> Result<(), BackendError> {
    match backend.health() {
        Err(err) if err.status() == Some(404) => {
            tracing::info!("No health endpoint; probing record history instead");
            match backend.get_history() {
                // A 2xx with an unexpected body still proves the service is up.
                Ok(_) | Err(BackendError::Decode(_)) => Ok(()),
                Err(err) => Err(err),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fencing::RequestKind;
    use crate::application::testing::ScriptedBackend;

    fn ticket(kind: RequestKind) -> Ticket {
        Ticket {
            kind,
            generation: 1,
        }
    }

    #[test]
    fn test_health_uses_dedicated_endpoint() {
        let backend = ScriptedBackend::default();
        let response = execute(&backend, Request::Health(ticket(RequestKind::Health)));
        assert!(matches!(response, Response::Health(_, Ok(()))));
        assert_eq!(backend.calls("health"), 1);
        assert_eq!(backend.calls("get_history"), 0);
    }

    #[test]
    fn test_health_falls_back_on_404() {
        let backend = ScriptedBackend::default();
        backend.push_health(Err(BackendError::rejected(404, "Not Found")));
        backend.push_history(Err(BackendError::Transport("refused".into())));
        let response = execute(&backend, Request::Health(ticket(RequestKind::Health)));
        assert!(matches!(
            response,
            Response::Health(_, Err(BackendError::Transport(_)))
        ));
        assert_eq!(backend.calls("get_history"), 1);
    }

    #[test]
    fn test_health_fallback_undecodable_history_counts_as_online() {
        let backend = ScriptedBackend::default();
        backend.push_health(Err(BackendError::rejected(404, "Not Found")));
        backend.push_history(Err(BackendError::Decode(
            "invalid type: map, expected a sequence".into(),
        )));
        let response = execute(&backend, Request::Health(ticket(RequestKind::Health)));
        assert!(matches!(response, Response::Health(_, Ok(()))));

        backend.push_health(Err(BackendError::rejected(404, "Not Found")));
        backend.push_history(Err(BackendError::rejected(500, "boom")));
        let response = execute(&backend, Request::Health(ticket(RequestKind::Health)));
        assert!(matches!(response, Response::Health(_, Err(_))));
    }

    #[test]
    fn test_health_does_not_fall_back_on_transport_failure() {
        let backend = ScriptedBackend::default();
        backend.push_health(Err(BackendError::Transport("refused".into())));
        let _ = execute(&backend, Request::Health(ticket(RequestKind::Health)));
        assert_eq!(backend.calls("get_history"), 0);
    }
}
