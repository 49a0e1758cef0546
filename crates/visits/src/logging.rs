use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber.
///
/// Logs go to stderr so that reports written to stdout stay clean.  The
/// level defaults to `INFO` and can be overridden with `RUST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_err()
    {
        warn!("Unable to initialize logging -- has it already been initialized?")
    }
}

/// Routes logs through the test harness so they are shown only for failing
/// tests.  Safe to call from every test.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(env_filter)
        .try_init();
}
