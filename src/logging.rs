use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

// Sets up tracing. Goes to stderr, filtered by the TRACE env var, and off by
// default unless `verbose` is set, in which case debug is the default.
//
// EnvFilter syntax, for example:
//
// All targets, info level:             info
// Only the matching engine, debug:     capgains::compute=debug
pub(crate) fn setup_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("TRACE")
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
