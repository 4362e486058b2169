use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult};

/// Route run events to two sinks: every event as NDJSON in `path`, and
/// warnings in compact form on stderr.
///
/// `RUST_LOG` narrows both; it defaults to `info`.
pub fn init_run_logging(path: &Path) -> RegistryResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let ndjson = tracing_subscriber::fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_current_span(false)
        .with_writer(Mutex::new(file));
    let console = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(LevelFilter::WARN);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(ndjson)
        .with(console)
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_events_land_in_ndjson_file() {
        let dir = std::env::temp_dir().join(format!("etlcheck_logs_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("log dir");
        let path = dir.join("logs.ndjson");

        init_run_logging(&path).expect("subscriber");
        tracing::info!(event = "run_started", run_id = "abc");

        let written = std::fs::read_to_string(&path).expect("logs");
        let line = written
            .lines()
            .find(|line| line.contains("run_started"))
            .expect("event line");
        let parsed: serde_json::Value = serde_json::from_str(line).expect("json line");
        assert_eq!(parsed["fields"]["run_id"], "abc");
        assert_eq!(parsed["level"], "INFO");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
