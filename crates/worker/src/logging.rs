use queuebot_core::config::{LogFormat, LoggingConfig};
use tracing::Level;

/// Installs the global subscriber from `logging`. Output goes to stderr so
/// CLI results on stdout stay machine-readable. A second call is a no-op.
pub fn init_logging(logging: &LoggingConfig) {
    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
