//! Command routing: config, logging and server assembly shared by every command

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_core::{Executor, ProtocolHandler, ServerConfig, create_cache, logging};
use tracing::{debug, info, warn};

use crate::args::{Cli, Commands};
use crate::{commands, demo_tools};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    logging::init(&config.logging)?;
    debug!(?config, "configuration loaded");

    let command = cli.command.unwrap_or(Commands::Serve { http: None });
    if command == Commands::Tools {
        return commands::tools::show_tools(&demo_tools::registry()?);
    }

    let handler = Arc::new(build_handler(&config)?);
    let cancel = CancellationToken::new();
    let _signal = spawn_ctrl_c(cancel.clone());

    let result = match command {
        Commands::Serve { http: None } => commands::serve::run(handler.clone(), cancel.clone()).await,
        Commands::Serve { http: Some(_) } => {
            commands::serve::run_http(handler.clone(), &config.http, cancel.clone()).await
        }
        Commands::Call { tool, args } => commands::call::run(&handler, &tool, &args, &cancel).await,
        Commands::Stream { tool, args } => {
            commands::stream::run(&handler, &tool, &args, &cancel).await
        }
        Commands::Tools => Ok(()),
    };

    handler.close().await;
    result
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig::load(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("loading configuration from {}", path.display()),
            None => "loading configuration".to_string(),
        }
    })?;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(Commands::Serve {
        http: Some(Some(address)),
    }) = &cli.command
    {
        config.http.address = address.clone();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_handler(config: &ServerConfig) -> anyhow::Result<ProtocolHandler> {
    let registry = demo_tools::registry()?;
    let cache = create_cache(&config.cache).context("creating response cache")?;
    info!(
        tools = registry.len(),
        cache = config.cache.enabled,
        max_concurrent = config.executor.max_concurrent,
        "toolgate starting"
    );

    Ok(
        ProtocolHandler::new(Arc::new(registry), Executor::new(config.executor.clone()))
            .with_cache(cache, config.cache.clone()),
    )
}

/// Cancel `token` on the first Ctrl-C
fn spawn_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    })
}
