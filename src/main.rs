use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use key_promoter::catalog::{CommandCatalog, InMemoryCatalog};
use key_promoter::config::SETTING_NAMES;
use key_promoter::export::FsExportTarget;
use key_promoter::interceptor::DispatchSlot;
use key_promoter::logging;
use key_promoter::notifications::{CollectingNotifier, LogNotifier, Notifier};
use key_promoter::promoter::{InteractionEvent, InteractionOutcome, KeyPromoter};
use key_promoter::shortcuts::Platform;
use key_promoter::storage::JsonFileStore;

mod cli;

use cli::{Cli, Commands, ConfigCommands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init();

    let started = Instant::now();
    let outcome = run(cli);
    logging::log_perf("cli_command", logging::duration_ms(started.elapsed()), 500);

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logging::log_error("cli", &format!("{:#}", err), None);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let catalog: Arc<InMemoryCatalog> = Arc::new(match &cli.catalog {
        Some(path) => InMemoryCatalog::load(path)?,
        None => {
            warn!("No --catalog given, using an empty command catalog");
            InMemoryCatalog::new()
        }
    });
    let store = Arc::new(match &cli.data {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::with_default_path(),
    });
    let notifier = Arc::new(CollectingNotifier::new());
    let platform = cli.platform.map(Platform::from).unwrap_or_else(Platform::current);

    info!(
        commands = catalog.len(),
        data = %store.path().display(),
        "Starting key promoter"
    );

    let promoter = KeyPromoter::load_for_platform(catalog.clone(), store, notifier.clone(), platform)?;
    let result = run_command(&promoter, &catalog, cli.command);

    if !notifier.is_empty() {
        debug!(count = notifier.len(), "Showing notices");
    }
    for notice in notifier.drain() {
        println!("{}", notice);
        LogNotifier.notify(notice);
    }
    result
}

fn run_command(promoter: &KeyPromoter, catalog: &Arc<InMemoryCatalog>, command: Commands) -> Result<()> {
    match command {
        Commands::Stats => {
            let report = promoter.show_statistics();
            print!("{}", report.render_text(&promoter.settings().unassigned_marker));
        }
        Commands::Export { out_dir } => {
            let path = promoter
                .export_shortcuts(&FsExportTarget::new(&out_dir))
                .context("Export failed")?;
            println!("{}", out_dir.join(path).display());
        }
        Commands::Click { label, excluded } => {
            let event = InteractionEvent::new(label, key_promoter::Channel::Pointer).excluded(excluded);
            match promoter.handle_interaction(&event) {
                InteractionOutcome::Ignored(reason) => println!("ignored: {:?}", reason),
                InteractionOutcome::Ambiguous {
                    candidates,
                    threshold,
                } => println!("ambiguous: {} candidates (threshold {})", candidates, threshold),
                InteractionOutcome::Attributed { command_ids } if command_ids.is_empty() => {
                    println!("no matching command")
                }
                InteractionOutcome::Attributed { command_ids } => {
                    println!("attributed: {}", command_ids.join(", "))
                }
            }
        }
        Commands::Invoke { command_ids } => {
            let known = Arc::clone(catalog);
            let slot = DispatchSlot::new(move |id, _ctx| known.lookup(id).is_some());
            promoter.install_interceptor(&slot);
            for id in &command_ids {
                let ok = slot.dispatch(id, None);
                println!("{}: {}", id, if ok { "ok" } else { "unknown command" });
            }
            promoter.shutdown();
        }
        Commands::Config { command } => run_config(promoter, command)?,
    }
    Ok(())
}

fn run_config(promoter: &KeyPromoter, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Get { name: Some(name) } => {
            println!("{}", promoter.settings().get(&name)?);
        }
        ConfigCommands::Get { name: None } => {
            let settings = promoter.settings();
            for name in SETTING_NAMES {
                println!("{} = {}", name, settings.get(name)?);
            }
        }
        ConfigCommands::Set { name, value } => promoter.set_setting(&name, &value)?,
        ConfigCommands::Reset { name } => promoter.reset_setting(&name)?,
    }
    Ok(())
}
