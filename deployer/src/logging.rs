// deployer/src/logging.rs

use crate::config::load_env_file;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static LOG_INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "info";
const FILTER_ENV: &str = "RUST_LOG";

/// Installs the global subscriber. Logs go to stderr: stdout is reserved for
/// the deployment result. `.env` is merged first so `RUST_LOG` may live there.
pub fn init_logging() {
    load_env_file();
    LOG_INIT.call_once(|| {
        let _ = fmt()
            .with_env_filter(env_filter(FILTER_ENV))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

fn env_filter(var: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
