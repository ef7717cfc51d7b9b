use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Stdout subscriber for the current thread while the config that picks
/// the real log targets is still being read.
pub fn bootstrap_logging() -> DefaultGuard {
    tracing::subscriber::set_default(fmt().with_env_filter(env_filter()).finish())
}

/// Stdout always; a daily rolling file as well when `log_dir` is set.
/// The returned guard must live as long as the process logs.
pub fn init_logging(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = env_filter();

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "landrec.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_subscriber_records_warnings() {
        let _guard = bootstrap_logging();
        assert!(tracing::enabled!(tracing::Level::WARN));
    }
}
