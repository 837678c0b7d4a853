use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber shared by the demo binaries.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info` plus debug detail from the cloud bindings
/// - Writes to stdout to improve visibility in environments that hide stderr
pub fn init_logging_default() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,clients=debug"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(|| io::stdout())
        .try_init();
}
