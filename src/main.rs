//! NephroGuard: CKD screening client for HIV care.
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nephroguard::adapters::sanitize::SanitizingMakeWriter;
use nephroguard::tui::App;
use nephroguard::Config;

fn main() -> Result<()> {
    // Logging to the terminal would corrupt the alternate screen, so an
    // interactive session logs to a file unless told otherwise.
    let log_mode = std::env::var("NEPHROGUARD_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let interactive = std::io::stdout().is_terminal();
    let use_file = match log_mode.as_str() {
        "file" => true,
        "stdout" => false,
        _ => interactive,
    };

    let (writer, _guard) = if use_file {
        let log_file = std::env::var("NEPHROGUARD_LOG_FILE")
            .unwrap_or_else(|_| "nephroguard.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: the open below reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let config = Config::from_env()?;
    tracing::info!(backend = %config.backend_url, "Starting NephroGuard...");

    let mut app = App::new(&config)?;
    app.run()?;

    tracing::info!("NephroGuard shutdown complete.");
    Ok(())
}
