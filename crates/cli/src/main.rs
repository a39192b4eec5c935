//! Antrean CLI - workshop service queue (admin and public display) in the terminal

mod logging;
mod settings;
mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use antrean_core::application::{Collaborators, Mutation, QueueController, QueueView};
use antrean_core::domain::EntryId;
use antrean_core::error::AppError;
use antrean_core::port::id_provider::UuidProvider;
use antrean_core::port::time_provider::SystemTimeProvider;
use antrean_core::port::{
    ConfirmationPrompt, FixedAnswer, IdProvider, SilentSignal, TimeProvider, ViewId, ViewRenderer,
};
use antrean_infra_sqlite::{create_pool, run_migrations, SqliteSlot};
use antrean_infra_system::{SpeechAnnouncer, SpeechConfig, TerminalBell};

use settings::Settings;
use terminal::{StdinPrompt, TerminalRenderer};

const VALIDATION_NOTICE: &str = "Isi semua data!";

#[derive(Parser)]
#[command(name = "antrean")]
#[command(about = "Workshop service queue with live public display", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides `db_path` from settings)
    #[arg(long)]
    db: Option<String>,

    /// Settings file (default: ./antrean.toml if present)
    #[arg(long, env = "ANTREAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a customer at the end of the queue
    Add {
        customer: String,
        motor: String,
        /// License plate
        nopol: String,
    },

    /// Print the queue
    List {
        /// Show per-entry actions
        #[arg(long)]
        admin: bool,
    },

    /// Change the status of the entry at a position (1-based)
    SetStatus {
        position: usize,
        /// Queue, On Progress, Finishing (or a synonym such as "selesai")
        status: String,
    },

    /// Delete the entry at a position (1-based)
    Delete {
        position: usize,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Call the customer at a position (1-based) to the cashier
    Announce { position: usize },

    /// Live view that follows changes made from other terminals
    Display {
        /// Show per-entry actions
        #[arg(long)]
        admin: bool,
    },
}

impl Commands {
    fn role(&self) -> &'static str {
        match self {
            Commands::Display { admin: false } => "display",
            _ => "admin",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.clone()).context("Failed to load settings")?;
    if let Some(db) = cli.db.clone() {
        settings.db_path = db;
    }
    let db_path = settings.expanded_db_path()?;
    ensure_parent_dir(Path::new(&db_path))?;

    info!(db_path = %db_path, version = antrean_core::VERSION, "Opening queue store");

    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let id_provider: Arc<dyn IdProvider> = Arc::new(UuidProvider);
    let view_id = ViewId::new(format!(
        "{}-{}",
        cli.command.role(),
        id_provider.generate_id()
    ));
    let slot = Arc::new(
        SqliteSlot::open(
            pool.clone(),
            view_id,
            time_provider.clone(),
            settings.poll_interval(),
        )
        .await?,
    );

    let announcer = Arc::new(SpeechAnnouncer::new(SpeechConfig {
        program: settings.speech_program.clone(),
        timeout: settings.speech_timeout(),
        voices: settings.voices.clone(),
    }));
    let confirmation: Arc<dyn ConfirmationPrompt> = match &cli.command {
        Commands::Delete { yes: true, .. } => Arc::new(FixedAnswer(true)),
        _ => Arc::new(StdinPrompt),
    };
    let collaborators = Collaborators {
        confirmation,
        announcer: announcer.clone(),
        signal: match &cli.command {
            Commands::SetStatus { .. } => Arc::new(TerminalBell),
            _ => Arc::new(SilentSignal),
        },
    };

    let mut view = QueueView::open(
        slot,
        id_provider,
        time_provider,
        collaborators,
        settings.shop_name.clone(),
    )
    .await;
    let controller = view.controller();

    match cli.command {
        Commands::Add {
            customer,
            motor,
            nopol,
        } => {
            let entry = match controller.add_entry(&customer, &motor, &nopol).await {
                Err(e) if e.is_validation() => {
                    eprintln!("{} {}", VALIDATION_NOTICE.yellow().bold(), e);
                    anyhow::bail!(e);
                }
                other => other?,
            };
            let position = controller
                .snapshot()
                .await
                .position_of(&entry.id)
                .map(|p| p + 1)
                .unwrap_or_default();
            println!(
                "{}",
                format!("✓ {} ditambahkan (nomor {})", entry.customer, position)
                    .green()
                    .bold()
            );
        }

        Commands::List { admin } => {
            TerminalRenderer::plain().render(&controller.snapshot().await, admin);
        }

        Commands::SetStatus { position, status } => {
            let id = resolve(&controller, position).await?;
            let outcome = controller.set_status(&id, &status).await?;
            report(outcome, position, "status diperbarui");
        }

        Commands::Delete { position, .. } => {
            let id = resolve(&controller, position).await?;
            let outcome = controller.delete_entry(&id).await?;
            report(outcome, position, "dihapus");
        }

        Commands::Announce { position } => {
            let id = resolve(&controller, position).await?;
            let outcome = controller.announce(&id).await?;
            report(outcome, position, "dipanggil");
            announcer.finish().await;
        }

        Commands::Display { admin } => {
            let renderer: Arc<dyn ViewRenderer> = Arc::new(TerminalRenderer::live());
            let listener_handle = view
                .spawn_sync()
                .context("Sync listener already started")?;
            let render_handle = view.spawn_render(renderer, admin);

            info!(view = %view.view_id(), admin, "Display running, press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;

            info!("Shutdown signal received");
            view.close();
            let _ = tokio::time::timeout(Duration::from_secs(5), async {
                match listener_handle.await {
                    Ok(Err(e)) => error!(error = ?e, "Sync listener failed"),
                    Err(e) => error!(error = ?e, "Sync listener task panicked"),
                    Ok(Ok(())) => {}
                }
                let _ = render_handle.await;
            })
            .await;
        }
    }

    pool.close().await;
    Ok(())
}

/// Translate a displayed 1-based position into the entry's id
async fn resolve(controller: &QueueController, position: usize) -> Result<EntryId> {
    let index = position.checked_sub(1).ok_or_else(|| {
        AppError::Validation("positions start at 1".to_string())
    })?;
    controller
        .entry_at(index)
        .await
        .with_context(|| format!("Tidak ada antrean nomor {}", position))
}

fn report(outcome: Mutation, position: usize, done: &str) {
    match outcome {
        Mutation::Applied => println!(
            "{}",
            format!("✓ Antrean nomor {} {}", position, done).green().bold()
        ),
        Mutation::Stale => println!(
            "{}",
            format!(
                "Antrean nomor {} sudah berubah di tampilan lain, tidak ada yang diubah",
                position
            )
            .yellow()
        ),
        Mutation::Declined => println!("{}", "Dibatalkan".yellow()),
    }
}

fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    if db_path.to_string_lossy().contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["antrean", "delete", "2", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Delete {
                position: 2,
                yes: true
            }
        ));

        let cli =
            Cli::try_parse_from(["antrean", "--db", "/tmp/q.db", "set-status", "1", "selesai"])
                .unwrap();
        assert_eq!(cli.db.as_deref(), Some("/tmp/q.db"));
        assert!(matches!(cli.command, Commands::SetStatus { position: 1, .. }));
    }

    #[test]
    fn test_display_role() {
        let display = Cli::try_parse_from(["antrean", "display"]).unwrap();
        assert_eq!(display.command.role(), "display");
        let admin = Cli::try_parse_from(["antrean", "display", "--admin"]).unwrap();
        assert_eq!(admin.command.role(), "admin");
    }

    #[test]
    fn test_ensure_parent_dir_skips_memory() {
        ensure_parent_dir(Path::new("sqlite::memory:")).unwrap();
        ensure_parent_dir(Path::new("antrean.db")).unwrap();
    }
}
