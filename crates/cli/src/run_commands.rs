//! `printrelay run`: load settings, connect the bot and serve until stopped.

use std::sync::Arc;

use {
    anyhow::{Context, Result},
    printrelay_print::{PrintOrchestrator, ProcessRunner},
    printrelay_telegram::BotConfig,
    tracing::{error, info, warn},
};

pub async fn handle_run() -> Result<()> {
    let settings = match printrelay_config::from_env() {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        },
    };

    info!(
        printer = %settings.printer,
        debug = settings.debug,
        restricted = settings.allowed_users.is_restricted(),
        page_confirm_limit = settings.page_confirm_limit,
        confirm_timeout_secs = settings.confirm_timeout.as_secs(),
        work_dir = %settings.work_dir.display(),
        "configuration loaded"
    );

    tokio::fs::create_dir_all(&settings.work_dir)
        .await
        .with_context(|| format!("creating work directory {}", settings.work_dir.display()))?;

    let orchestrator = Arc::new(PrintOrchestrator::new(
        Arc::clone(&settings),
        Arc::new(ProcessRunner),
    ));
    match orchestrator.converter().locate() {
        Some(path) => info!(converter = %path.display(), "document converter found"),
        None => warn!("no document converter found, office documents will be refused"),
    }

    let polling =
        printrelay_telegram::start_polling(BotConfig::from(&*settings), Arc::clone(&orchestrator))
            .await
            .context("connecting to Telegram")?;

    info!("printrelay running, press Ctrl+C to stop");

    tokio::select! {
        () = shutdown_signal() => info!("shutdown requested"),
        () = polling.stopped() => warn!("polling stopped on its own"),
    }

    // Updates already being handled finish before held jobs are dropped.
    polling.shutdown().await;
    orchestrator.shutdown().await;

    info!("printrelay stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
