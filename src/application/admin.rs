//! Admin user manager: staff roster and account creation.

use crate::domain::{bootstrap_roster, CreateUserRequest, Employee, EmployeeStatus, Identity, Role};
use crate::ports::BackendError;
use crate::NephroguardError;

use super::dispatch::Request;
use super::fencing::{RequestFence, RequestKind, Ticket};
use super::failure_text;

const CREATE_UNREACHABLE: &str = "Server connection failed";
const CREATE_FALLBACK: &str = "Account creation failed";

/// Roster view plus the account-creation flow.
///
/// The roster is write-through: an entry is added only after the credential
/// service confirms the account exists.
#[derive(Debug)]
pub struct AdminUserManager {
    roster: Vec<Employee>,
    next_id: u32,
    fence: RequestFence,
}

impl Default for AdminUserManager {
    fn default() -> Self {
        let roster = bootstrap_roster();
        let next_id = roster.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            roster,
            next_id,
            fence: RequestFence::new(RequestKind::CreateAccount),
        }
    }
}

impl AdminUserManager {
    #[must_use]
    pub fn roster(&self) -> &[Employee] {
        &self.roster
    }

    #[must_use]
    pub fn is_creating(&self) -> bool {
        self.fence.is_busy()
    }

    /// Issue an account creation on behalf of `actor`.
    ///
    /// # Errors
    /// `Unauthorized` unless `actor` is an administrator; `Validation` for a
    /// blank username or password; `Busy` while a creation is pending.
    pub fn begin_create_account(
        &mut self,
        actor: Option<&Identity>,
        username: &str,
        password: &str,
    ) -> Result<Request, NephroguardError> {
        let Some(actor) = actor.filter(|a| a.is_admin()) else {
            return Err(NephroguardError::Unauthorized(
                "only administrators can create accounts".to_string(),
            ));
        };
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(NephroguardError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        let ticket = self.fence.try_issue().map_err(NephroguardError::Busy)?;
        tracing::info!("Creating staff account");
        Ok(Request::CreateAccount(
            ticket,
            CreateUserRequest {
                current_role: actor.role,
                new_username: username.to_string(),
                new_password: password.to_string(),
            },
        ))
    }

    /// Apply a creation response. `None` when stale.
    pub fn finish_create_account(
        &mut self,
        ticket: Ticket,
        outcome: Result<String, BackendError>,
    ) -> Option<Result<&Employee, String>> {
        if !self.fence.settle(ticket) {
            return None;
        }
        match outcome {
            Ok(username) => {
                let id = self.next_id;
                self.next_id += 1;
                self.roster.push(Employee {
                    id,
                    username,
                    role: Role::User,
                    status: EmployeeStatus::Active,
                });
                tracing::info!(id, "Staff account created");
                self.roster.last().map(Ok)
            }
            Err(err) => {
                tracing::warn!("Account creation failed: {}", err);
                Some(Err(failure_text(&err, CREATE_UNREACHABLE, CREATE_FALLBACK)))
            }
        }
    }

    /// Revoke an account's access.
    ///
    /// # Errors
    /// `Validation` for an unknown id or a missing confirmation. Revocation
    /// itself is not offered by the credential service, so a confirmed
    /// request yields `Unsupported` and the roster is unchanged.
    pub fn remove_access(&self, id: u32, confirmed: bool) -> Result<(), NephroguardError> {
        let Some(employee) = self.roster.iter().find(|e| e.id == id) else {
            return Err(NephroguardError::Validation(format!("No staff member with id {id}")));
        };
        if !confirmed {
            return Err(NephroguardError::Validation(format!(
                "Confirmation required to remove access for {}",
                employee.username
            )));
        }
        Err(NephroguardError::Unsupported(
            "removing access is not available on this server".to_string(),
        ))
    }

    /// Edit a roster entry.
    ///
    /// # Errors
    /// Always `Unsupported`; unknown ids are reported as `Validation`.
    pub fn edit_user(&self, id: u32) -> Result<(), NephroguardError> {
        if !self.roster.iter().any(|e| e.id == id) {
            return Err(NephroguardError::Validation(format!("No staff member with id {id}")));
        }
        Err(NephroguardError::Unsupported(
            "editing accounts is not available on this server".to_string(),
        ))
    }

    /// Discard any pending creation.
    pub fn cancel(&mut self) {
        self.fence.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::new("admin", Role::Admin)
    }

    #[test]
    fn test_roster_starts_with_admin() {
        let manager = AdminUserManager::default();
        assert_eq!(manager.roster().len(), 1);
        assert_eq!(manager.roster()[0].username, "admin");
        assert_eq!(manager.roster()[0].role, Role::Admin);
    }

    #[test]
    fn test_non_admin_cannot_create() {
        let mut manager = AdminUserManager::default();
        let user = Identity::new("nurse", Role::User);
        assert!(matches!(
            manager.begin_create_account(Some(&user), "new", "pw"),
            Err(NephroguardError::Unauthorized(_))
        ));
        assert!(matches!(
            manager.begin_create_account(None, "new", "pw"),
            Err(NephroguardError::Unauthorized(_))
        ));
        assert!(!manager.is_creating());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut manager = AdminUserManager::default();
        assert!(matches!(
            manager.begin_create_account(Some(&admin()), "  ", "pw"),
            Err(NephroguardError::Validation(_))
        ));
        assert!(matches!(
            manager.begin_create_account(Some(&admin()), "nurse", ""),
            Err(NephroguardError::Validation(_))
        ));
    }

    #[test]
    fn test_roster_grows_only_on_success() {
        let mut manager = AdminUserManager::default();
        let request = manager
            .begin_create_account(Some(&admin()), "nurse_akinyi", "s3cret")
            .expect("valid");
        let Request::CreateAccount(_, body) = &request else {
            panic!("expected account creation");
        };
        assert_eq!(body.current_role, Role::Admin);

        let failed = manager
            .finish_create_account(request.ticket(), Err(BackendError::rejected(400, "Username exists")))
            .expect("current");
        assert_eq!(failed.unwrap_err(), "Username exists");
        assert_eq!(manager.roster().len(), 1);

        let request = manager
            .begin_create_account(Some(&admin()), "nurse_akinyi", "s3cret")
            .expect("valid");
        let created = manager
            .finish_create_account(request.ticket(), Ok("nurse_akinyi".into()))
            .expect("current")
            .expect("ok")
            .clone();
        assert_eq!(created.id, 2);
        assert_eq!(created.role, Role::User);
        assert_eq!(created.status, EmployeeStatus::Active);
        assert_eq!(manager.roster().len(), 2);
    }

    #[test]
    fn test_remove_access_needs_confirmation_and_is_unsupported() {
        let manager = AdminUserManager::default();
        assert!(matches!(
            manager.remove_access(1, false),
            Err(NephroguardError::Validation(_))
        ));
        assert!(matches!(
            manager.remove_access(1, true),
            Err(NephroguardError::Unsupported(_))
        ));
        assert!(matches!(
            manager.remove_access(42, true),
            Err(NephroguardError::Validation(_))
        ));
        assert_eq!(manager.roster().len(), 1);
    }

    #[test]
    fn test_edit_user_unsupported() {
        let manager = AdminUserManager::default();
        assert!(matches!(manager.edit_user(1), Err(NephroguardError::Unsupported(_))));
    }
}
