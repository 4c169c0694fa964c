mod commands;
mod logging;
mod observer;
mod render;
mod repl;

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use observer::CliObserver;
use super_duper_review::config::load_configuration;
use super_duper_review::strategy::AutoSelectStrategy;
use super_duper_review::{ReviewConfig, ReviewService, SqliteStore};
use tracing::{error, info};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return Ok(());
    };

    if let Commands::PrintConfig = command {
        println!("Configuration: {:?}", config);
        return Ok(());
    }

    let service = match open_service(&config, matches!(command, Commands::Review { .. })) {
        Ok(service) => service,
        Err(err) => {
            error!("Error opening database '{}': {}", config.db_path, err);
            process::exit(1);
        }
    };

    if let Err(err) = run_command(command, &service).await {
        error!("Error: {}", err);
    }

    Ok(())
}

fn open_service(config: &ReviewConfig, verbose: bool) -> Result<ReviewService, super_duper_review::Error> {
    let store = SqliteStore::open(&config.db_path)?;
    Ok(ReviewService::with_sqlite(
        store,
        config,
        Arc::new(CliObserver::new(verbose)),
    ))
}

async fn run_command(command: Commands, service: &ReviewService) -> CliResult {
    match command {
        Commands::Status { group } => {
            let status = service.group_status(group).await?;
            println!("{}", render::status_line(group, status));
        }
        Commands::Progress { session } => {
            let session_id = resolve_session(service, session).await?;
            let progress = service.session_progress(session_id).await?;
            render::print_progress(session_id, &progress);
        }
        Commands::Suggest { group } => {
            let view = service.load_group(group).await?;
            render::print_view(&view);
        }
        Commands::Queue { json } => {
            let entries = service.deletion_queue().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                render::print_queue(&entries);
            }
        }
        Commands::AutoSelect { strategy, session } => {
            let strategy: AutoSelectStrategy = strategy.parse()?;
            let session_id = resolve_session(service, session).await?;
            let changed = service.auto_select(strategy, session_id).await?;
            info!(
                "Auto-select '{}': {} files changed, {} queued for deletion",
                strategy,
                format!("{}", changed).green(),
                format!("{}", service.deletion_queue_count().await?).red(),
            );
        }
        Commands::MarkDir { path, session } => {
            let session_id = resolve_session(service, session).await?;
            let marked = service.mark_directory(&path, session_id).await?;
            info!(
                "{} files under {} marked for deletion",
                format!("{}", marked).red(),
                path
            );
        }
        Commands::Review { session } => {
            let session_id = resolve_session(service, session).await?;
            repl::run(service, session_id).await?;
        }
        Commands::ResetDecisions => {
            match prompt_confirm(
                "Are you SURE you want to delete EVERY review decision?",
                Some(false),
            ) {
                Ok(true) => {
                    service.reset().await?;
                    println!("All review decisions cleared");
                }
                _ => {
                    process::exit(0);
                }
            }
        }
        Commands::PrintConfig => {}
    }
    Ok(())
}

async fn resolve_session(
    service: &ReviewService,
    session: Option<i64>,
) -> Result<i64, Box<dyn std::error::Error>> {
    match session {
        Some(id) => Ok(id),
        None => Ok(service
            .latest_session_id()
            .await?
            .ok_or("no completed scan session found; run a scan first")?),
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
