use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a retrace verbosity level. Level 3 also logs every
/// per-termination decision.
pub fn filter_directive(verbosity: u8) -> &'static str {
    if verbosity >= 3 {
        "cable_path=debug,info"
    } else {
        "cable_path=info"
    }
}

pub fn init_cli_logger(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity)));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    // try_init so embedding callers and tests may install their own subscriber
    if json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init();
    }
}
