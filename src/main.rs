use clap::Parser;
use tokio::signal;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use yieldex::cli::commands::{self, CliContext};
use yieldex::cli::Cli;
use yieldex::config::LoggingConfig;
use yieldex::coordination::CancelToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(&cli)?;
    init_logging(&config.logging);

    let cancel = CancelToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown signal received; finishing the in-flight step");
        signal_cancel.cancel();
    });

    let json = cli.json;
    let ctx = CliContext::new(config, cancel, json)?;
    if let Err(e) = commands::run(cli, ctx).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},yieldex=debug,hyper=warn,reqwest=warn", logging.level))
    });

    // `rolling::daily` panics when the first file cannot be created, so preflight the directory.
    let file_layer = logging.dir.as_deref().and_then(|log_dir| {
        let writable = std::fs::create_dir_all(log_dir).is_ok()
            && std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(std::path::Path::new(log_dir).join("yieldex.log"))
                .is_ok();
        if !writable {
            eprintln!("Warning: Could not write to log directory {log_dir}, file logging disabled");
            return None;
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "yieldex.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Process-lifetime guard
        Box::leak(Box::new(guard));

        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
    });

    let console_layer = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
