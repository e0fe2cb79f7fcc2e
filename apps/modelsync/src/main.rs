//! modelsync - fetch, unpack and validate inference models
//!
//! Thin command line front end over the materialize crate.

mod cli;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use clap::Parser;
use modelsync_config::Config;
use modelsync_events::EventReceiver;
use modelsync_materialize::{Materializer, Readiness, ReadyManifest};
use modelsync_types::{ArtifactKey, MirrorList};
use serde_json::json;
use std::future::Future;
use std::process;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            println!("{}", json!({ "ok": false, "error": e.to_string() }));
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting modelsync v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    match cli.command {
        Commands::Ensure {
            key,
            dir,
            mirrors,
            required: _,
        } => {
            let key = ArtifactKey::new(key)?;
            let mirrors = MirrorList::parse(&mirrors)?;
            let target_dir = dir.unwrap_or_else(|| config.models_dir().join(key.as_str()));

            let (event_sender, event_receiver) = modelsync_events::channel();
            let materializer = Materializer::builder()
                .with_config(&config)?
                .with_event_sender(event_sender)
                .build()?;

            let readiness = run_with_events(
                materializer.ensure_present(&key, &mirrors, &target_dir, &cancel),
                event_receiver,
            )
            .await?;

            render_readiness(cli.global.json, &key, &target_dir, &readiness);
            Ok(())
        }

        Commands::Check { dir, required: _ } => {
            let manifest = ReadyManifest::from_config(&config.validation)?;
            let result = modelsync_materialize::check_ready(&dir, &manifest).await;

            // Failures are rendered once by main
            result?;

            if cli.global.json {
                println!(
                    "{}",
                    json!({
                        "ok": true,
                        "dir": dir.display().to_string(),
                        "required": manifest.files(),
                    })
                );
            } else {
                println!("ready: {}", dir.display());
            }

            Ok(())
        }
    }
}

/// Drive `operation` while logging the events it emits
async fn run_with_events<T>(
    operation: impl Future<Output = Result<T, modelsync_errors::Error>>,
    mut event_receiver: EventReceiver,
) -> Result<T, CliError> {
    let mut operation = Box::pin(operation);

    loop {
        select! {
            result = &mut operation => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    logging::log_event_with_tracing(&event);
                }
                return result.map_err(CliError::from);
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => logging::log_event_with_tracing(&event),
                    None => { /* Channel closed: keep waiting for the operation to finish */ }
                }
            }
        }
    }
}

fn render_readiness(
    json_mode: bool,
    key: &ArtifactKey,
    target_dir: &std::path::Path,
    readiness: &Readiness,
) {
    let (status, reused_archive, entries) = match readiness {
        Readiness::AlreadyPresent => ("already_present", false, None),
        Readiness::CompletedByPeer => ("completed_by_peer", false, None),
        Readiness::Materialized {
            reused_archive,
            entries,
            ..
        } => ("materialized", *reused_archive, Some(*entries)),
    };

    if json_mode {
        println!(
            "{}",
            json!({
                "ok": true,
                "key": key.as_str(),
                "dir": target_dir.display().to_string(),
                "status": status,
                "reused_archive": reused_archive,
                "entries": entries,
                "finished_at": chrono::Utc::now().to_rfc3339(),
            })
        );
    } else {
        println!("{key}: {status} ({})", target_dir.display());
    }
}

/// Cancel `cancel` on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let default_filter = if debug_enabled_flag {
        "info,modelsync=debug,modelsync_materialize=debug,modelsync_net=debug,modelsync_gate=debug,modelsync_archive=debug"
    } else if json_mode {
        "warn"
    } else {
        "info,modelsync_net=warn,modelsync_gate=warn,modelsync_archive=warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // Logs go to stderr so stdout stays reserved for results
    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(debug_enabled_flag)
            .with_env_filter(filter)
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &cli::GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if let Some(timeout) = global.timeout {
        if timeout == 0 {
            return Err(CliError::InvalidArguments(
                "--timeout must be greater than zero".to_string(),
            ));
        }
        config.network.timeout = timeout;
    }

    let required = command.required_files();
    if !required.is_empty() {
        config.validation.required_files = required.to_vec();
    }

    Ok(())
}
