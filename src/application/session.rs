//! Session guard: the current identity and its authorization predicates.

use crate::domain::{Credentials, Identity};
use crate::ports::BackendError;
use crate::NephroguardError;

use super::dispatch::Request;
use super::fencing::{RequestFence, RequestKind, Ticket};
use super::failure_text;

const LOGIN_UNREACHABLE: &str = "Server connection failed";
const LOGIN_FALLBACK: &str = "Login failed";

/// Holds at most one authenticated identity.
///
/// Credentials are checked only by the credential service.
#[derive(Debug)]
pub struct SessionGuard {
    identity: Option<Identity>,
    fence: RequestFence,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: None,
            fence: RequestFence::new(RequestKind::Login),
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether a login call is outstanding.
    #[must_use]
    pub fn is_logging_in(&self) -> bool {
        self.fence.is_busy()
    }

    /// Start a login.
    ///
    /// # Errors
    /// `Busy` if a login is already outstanding.
    pub fn begin_login(&mut self, username: &str, password: &str) -> Result<Request, NephroguardError> {
        let ticket = self.fence.try_issue().map_err(NephroguardError::Busy)?;
        tracing::info!("Login requested");
        Ok(Request::Login(ticket, Credentials::new(username, password)))
    }

    /// Apply a login response. `None` when the response is stale.
    ///
    /// On failure the message is the server's, or a connectivity notice.
    pub fn finish_login(
        &mut self,
        ticket: Ticket,
        outcome: Result<Identity, BackendError>,
    ) -> Option<Result<&Identity, String>> {
        if !self.fence.settle(ticket) {
            return None;
        }
        match outcome {
            Ok(identity) => {
                tracing::info!(role = %identity.role, "Login succeeded");
                let stored: &Identity = self.identity.insert(identity);
                Some(Ok(stored))
            }
            Err(err) => {
                tracing::warn!("Login failed: {}", err);
                Some(Err(failure_text(&err, LOGIN_UNREACHABLE, LOGIN_FALLBACK)))
            }
        }
    }

    /// Drop the identity unconditionally. Any pending login is discarded.
    pub fn logout(&mut self) -> Option<Identity> {
        self.fence.cancel();
        let previous = self.identity.take();
        if previous.is_some() {
            tracing::info!("Logged out");
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn ticket_of(request: &Request) -> Ticket {
        request.ticket()
    }

    #[test]
    fn test_login_success_stores_identity() {
        let mut guard = SessionGuard::new();
        let request = guard.begin_login("admin", "123").expect("idle");
        assert!(guard.is_logging_in());

        let applied = guard
            .finish_login(ticket_of(&request), Ok(Identity::new("admin", Role::Admin)))
            .expect("current");
        assert_eq!(applied.expect("ok").username, "admin");
        assert!(guard.identity().is_some_and(Identity::is_admin));
        assert!(!guard.is_logging_in());
    }

    #[test]
    fn test_login_messages() {
        let mut guard = SessionGuard::new();
        let t = ticket_of(&guard.begin_login("x", "y").expect("idle"));
        let rejected = guard
            .finish_login(t, Err(BackendError::rejected(401, "Invalid credentials")))
            .expect("current");
        assert_eq!(rejected.unwrap_err(), "Invalid credentials");

        let t = ticket_of(&guard.begin_login("x", "y").expect("idle"));
        let unreachable = guard
            .finish_login(t, Err(BackendError::Transport("refused".into())))
            .expect("current");
        assert_eq!(unreachable.unwrap_err(), "Server connection failed");

        let t = ticket_of(&guard.begin_login("x", "y").expect("idle"));
        let bare = guard
            .finish_login(t, Err(BackendError::Rejected { status: 500, message: None }))
            .expect("current");
        assert_eq!(bare.unwrap_err(), "Login failed");
        assert!(!guard.is_authenticated());
    }

    #[test]
    fn test_second_login_while_pending_is_busy() {
        let mut guard = SessionGuard::new();
        let _pending = guard.begin_login("a", "b").expect("idle");
        assert!(matches!(
            guard.begin_login("a", "b"),
            Err(NephroguardError::Busy(_))
        ));
    }

    #[test]
    fn test_logout_discards_pending_login() {
        let mut guard = SessionGuard::new();
        let t = ticket_of(&guard.begin_login("a", "b").expect("idle"));
        assert!(guard.logout().is_none());
        assert!(guard
            .finish_login(t, Ok(Identity::new("a", Role::User)))
            .is_none());
        assert!(!guard.is_authenticated());
    }
}
