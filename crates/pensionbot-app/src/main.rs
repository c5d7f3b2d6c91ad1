//! pensionbot application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Build the chat worker and start the chatbot facade's initialization
//! 3. Build the direct worker
//! 4. Serve the axum REST API until Ctrl-C

mod cli;

use std::sync::Arc;

use clap::Parser;

use pensionbot_api::routes;
use pensionbot_api::state::AppState;
use pensionbot_chat::{ChatbotService, ProcessWorker, WorkerCommand, WorkerInvoker, WorkerPolicy};
use pensionbot_core::config::PensionbotConfig;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = PensionbotConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting pensionbot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Chat worker, optionally bounded.
    let chat_command = WorkerCommand::from(&config.worker);
    tracing::info!(
        program = %chat_command.program,
        args = ?chat_command.args,
        timeout_secs = ?config.worker.timeout_secs,
        max_concurrent = ?config.worker.max_concurrent,
        "Chat worker configured"
    );
    let chat_worker = WorkerPolicy::from(&config.worker).apply(Arc::new(ProcessWorker::new(chat_command)));

    // Initialization runs in the background; requests wait on readiness.
    let chatbot = ChatbotService::start(chat_worker);

    let direct_command = WorkerCommand::from(&config.direct_worker);
    tracing::info!(
        program = %direct_command.program,
        args = ?direct_command.args,
        "Direct worker configured"
    );
    let direct_worker: Arc<dyn WorkerInvoker> = Arc::new(ProcessWorker::new(direct_command));

    let state = AppState::new(config, chatbot, direct_worker);

    if let Err(e) = routes::start_server(state).await {
        tracing::error!(error = %e, "API server failed");
        return Err(e.into());
    }

    Ok(())
}
