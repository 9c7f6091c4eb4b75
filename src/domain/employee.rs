//! Staff roster entries shown in the admin panel.

use serde::Serialize;
use zeroize::Zeroize;

use super::Role;

/// Account status in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeStatus {
    Active,
}

impl std::fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: u32,
    pub username: String,
    pub role: Role,
    pub status: EmployeeStatus,
}

/// Accounts known to exist before any creation in this session.
///
/// The record store seeds exactly one administrator.
#[must_use]
pub fn bootstrap_roster() -> Vec<Employee> {
    vec![Employee {
        id: 1,
        username: "admin".to_string(),
        role: Role::Admin,
        status: EmployeeStatus::Active,
    }]
}

/// Body of an account-creation request.
#[derive(Clone, Serialize)]
pub struct CreateUserRequest {
    pub current_role: Role,
    pub new_username: String,
    pub new_password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("current_role", &self.current_role)
            .field("new_username", &self.new_username)
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

impl Drop for CreateUserRequest {
    fn drop(&mut self) {
        self.new_password.zeroize();
    }
}
