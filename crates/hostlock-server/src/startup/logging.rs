//! Logging initialization
//!
//! Logs go to stdout by default; with a configured log directory they also
//! land in a daily-rolling `hostlock.log`. The filter honors `RUST_LOG`
//! and defaults to `info`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the global subscriber.
///
/// The returned guard must stay alive for the whole process; dropping it
/// stops the background log writer.
pub fn init_logging(log_dir: Option<&str>) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "hostlock.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .init();
            Ok(None)
        }
    }
}
