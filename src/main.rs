use cable_path::config::DEFAULT_VERBOSITY;
use cable_path::utils::error::{CableTraceError, ErrorSeverity};
use cable_path::utils::{logger, validation::Validate};
use cable_path::{CancellationFlag, CliConfig, ConsoleReporter, LogFormat, RetraceApp};
use clap::Parser;

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: &CableTraceError) -> ! {
    tracing::error!(
        "❌ Retrace failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e.severity()).max(1));
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();
    let settings = config.settings();

    let verbosity = match &settings {
        Ok(settings) => settings.verbosity,
        Err(_) => config.verbosity.unwrap_or(DEFAULT_VERBOSITY),
    };
    logger::init_cli_logger(verbosity, config.log_format == LogFormat::Json);
    tracing::debug!("CLI config: {:?}", config);

    let settings = match settings.and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };

    let cancel = CancellationFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current termination");
            on_signal.cancel();
        }
    });

    let reporter = ConsoleReporter::new(std::io::stdout(), settings.verbosity);
    let app = RetraceApp::new(settings, cancel);

    match app.run(reporter).await {
        Ok(run) => {
            let summary = &run.summary;
            if summary.total_failed() > 0 {
                tracing::warn!(
                    "{} endpoints could not be traced and were cleared",
                    summary.total_failed()
                );
            }
            if summary.cancelled {
                tracing::warn!("Retrace cancelled; finished terminations were kept");
                std::process::exit(130);
            }
            tracing::info!("✅ Retrace completed successfully!");
        }
        Err(e) => fail(&e),
    }
}
