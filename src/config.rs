//! Runtime configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `NEPHROGUARD_BACKEND_URL` | `http://127.0.0.1:5000` |
//! | `NEPHROGUARD_REQUEST_TIMEOUT_SECS` | `30` (`0` disables) |
//! | `NEPHROGUARD_REPORT_DIR` | `reports` |
//! | `NEPHROGUARD_PRINT_COMMAND` | unset |

use std::path::PathBuf;
use std::time::Duration;

use crate::NephroguardError;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Origin of every backend endpoint, without trailing slash
    pub backend_url: String,
    /// Per-request timeout; `None` waits forever
    pub request_timeout: Option<Duration>,
    /// Directory where printable reports are written
    pub report_dir: PathBuf,
    /// Program and arguments run with the report path appended
    pub print_command: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            print_command: None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, NephroguardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns error if a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NephroguardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("NEPHROGUARD_BACKEND_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(NephroguardError::Config(format!(
                    "NEPHROGUARD_BACKEND_URL must be an http(s) URL, got '{url}'"
                )));
            }
            config.backend_url = url;
        }

        if let Some(raw) = lookup("NEPHROGUARD_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                NephroguardError::Config(format!(
                    "NEPHROGUARD_REQUEST_TIMEOUT_SECS must be a whole number, got '{raw}'"
                ))
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(dir) = lookup("NEPHROGUARD_REPORT_DIR").filter(|d| !d.trim().is_empty()) {
            config.report_dir = PathBuf::from(dir.trim());
        }

        config.print_command = lookup("NEPHROGUARD_PRINT_COMMAND")
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());

        Ok(config)
    }
}
