// uconf - PC build configurator for the terminal
//
// Talks to the configurator REST backend: browse components by category,
// narrow by use case and brand, pick parts and see only compatible ones,
// compare shop prices, save builds and follow price-drop notifications.
//
// Architecture:
// - catalog: domain types, filters, price cache, selection store
// - workflow: compatibility query builder and fetch orchestration
// - api: reqwest client, error taxonomy, session and token file
// - notifications: cancellable unread-count poller and subscriptions
// - tui (ratatui): the interactive configurator
// - demo (axum): in-memory backend for offline use and tests
// - loadtest: virtual-user ramp against the catalog endpoints

mod api;
mod catalog;
mod cli;
mod commands;
mod config;
mod demo;
mod loadtest;
mod logging;
mod notifications;
mod startup;
mod tui;
mod util;
mod workflow;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use logging::{LogBuffer, LogOutput};
use std::process::ExitCode;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // Config management works on the file itself
    if let Commands::Config {
        show,
        reset,
        edit,
        update,
        path,
    } = command
    {
        cli::handle_config(show, reset, edit, update, path)?;
        return Ok(ExitCode::SUCCESS);
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    // TUI mode captures logs for the log strip; everything else logs to stderr
    let log_buffer = LogBuffer::new();
    let output = if matches!(command, Commands::Tui) {
        LogOutput::Buffer(log_buffer.clone())
    } else {
        LogOutput::Stderr
    };
    // Flushes file logs on drop
    let _file_guard = logging::init(&config.logging, output);

    match command {
        Commands::Tui => {
            startup::log_startup(&config);
            tui::run(config, log_buffer).await?;
        }
        Commands::Components {
            category,
            usecase,
            brand,
            search,
            sort,
        } => commands::components(&config, category, usecase, brand, search, sort).await?,
        Commands::Compatible {
            category,
            with,
            usecase,
            brand,
        } => commands::compatible(&config, category, with, usecase, brand).await?,
        Commands::Brands { category } => commands::brands(&config, category).await?,
        Commands::Usecases => commands::usecases(&config).await?,
        Commands::Usecase { tag } => commands::usecase(&config, &tag).await?,
        Commands::Offers { id } => commands::offers(&config, &id).await?,
        Commands::Price { id } => commands::price(&config, &id).await?,
        Commands::Login { email, password } => commands::login(&config, &email, password).await?,
        Commands::Register {
            email,
            name,
            password,
        } => commands::register(&config, &email, &name, password).await?,
        Commands::Logout => commands::logout()?,
        Commands::Whoami => commands::whoami(&config).await?,
        Commands::Builds { action } => commands::builds(&config, action).await?,
        Commands::Subscribe { id } => commands::subscribe(&config, &id, true).await?,
        Commands::Unsubscribe { id } => commands::subscribe(&config, &id, false).await?,
        Commands::Subscriptions { ids } => commands::subscriptions(&config, &ids).await?,
        Commands::Notifications { action } => commands::notifications(&config, action).await?,
        Commands::Loadtest {
            base_url,
            time_scale,
        } => {
            let lt_config = loadtest::LoadTestConfig {
                base_url: loadtest::resolve_base_url(
                    std::env::var("BASE_URL").ok(),
                    base_url,
                    config.loadtest_base_url.as_deref(),
                ),
                time_scale,
                ..Default::default()
            };
            let report = loadtest::run(lt_config).await?;
            println!("{}", report.summary());
            if !report.passed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::DemoServer { bind } => {
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl-C received, shutting down");
                }
                let _ = shutdown_tx.send(());
            });
            startup::print_demo_banner(&config, bind);
            demo::serve(bind, shutdown_rx).await?;
        }
        Commands::Config { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}
