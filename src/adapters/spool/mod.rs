//! Spool printer: writes report HTML to disk and optionally hands it to a
//! print command (`lp`, `xdg-open`, a browser).
//!
//! The command is started detached from the terminal and never waited on by
//! the caller; its exit status is only logged.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use crate::config::Config;
use crate::ports::{PrintDocument, PrintReceipt, ReportPrinter};

#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    #[error("Cannot write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Print command '{program}' could not be started: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SpoolPrinter {
    dir: PathBuf,
    command: Option<Vec<String>>,
}

impl SpoolPrinter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, command: Option<Vec<String>>) -> Self {
        Self {
            dir: dir.into(),
            command,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.report_dir.clone(), config.print_command.clone())
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn spool(&self, document: &PrintDocument) -> Result<PathBuf, SpoolError> {
        let path = self.dir.join(format!("{}.html", document.file_stem));
        let wrap = |source| SpoolError::Write {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(wrap)?;
        fs::write(&path, document.html.as_bytes()).map_err(wrap)?;
        Ok(path)
    }

    fn run_command(&self, argv: &[String], path: &Path) -> Result<(), SpoolError> {
        let Some((program, args)) = argv.split_first() else {
            return Ok(());
        };
        let mut child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpoolError::Launch {
                program: program.clone(),
                source,
            })?;

        // Reap the child off the UI thread.
        let program = program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => {
                tracing::debug!(program = %program, "Print command finished");
            }
            Ok(status) => tracing::warn!(program = %program, %status, "Print command failed"),
            Err(e) => tracing::warn!(program = %program, error = %e, "Print command lost"),
        });
        Ok(())
    }
}

impl ReportPrinter for SpoolPrinter {
    type Error = SpoolError;

    fn print(&self, document: &PrintDocument) -> Result<PrintReceipt, Self::Error> {
        let path = self.spool(document)?;
        tracing::info!(file = %path.display(), "Report spooled");
        if let Some(argv) = &self.command {
            self.run_command(argv, &path)?;
        }
        Ok(PrintReceipt {
            location: path.display().to_string(),
        })
    }
}
