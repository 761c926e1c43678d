//! Diagnostic logging setup.
//!
//! The chat screen owns the terminal, so diagnostics can only go to a file.
//! Without `--log` no subscriber is installed and events are discarded.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PARLEY_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

pub fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(std::env::var(LOG_ENV).ok()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| -> Box<dyn Error> { err })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_info() {
        assert_eq!(env_filter(None).to_string(), "info");
        assert_eq!(env_filter(Some("  ".into())).to_string(), "info");
    }

    #[test]
    fn filter_accepts_directives() {
        assert_eq!(
            env_filter(Some("parley=debug".into())).to_string(),
            "parley=debug"
        );
    }

    #[test]
    fn no_log_file_installs_nothing() {
        assert!(init_tracing(None).is_ok());
    }

    #[test]
    fn log_file_receives_events() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("parley.log");

        init_tracing(Some(&path)).expect("subscriber installed");
        tracing::warn!("written to the log file");

        let contents = std::fs::read_to_string(&path).expect("log file");
        assert!(contents.contains("written to the log file"));
        assert!(init_tracing(Some(&path)).is_err());
    }
}
