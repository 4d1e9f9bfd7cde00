use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hoopsync_core::Season;
use hoopsync_sync::{Continuous, LogSink, SyncConfig, SyncReport};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "hoopsync-cli")]
#[command(about = "Mirror the league stats service into Postgres")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync pass. With no targets, syncs teams, players and games.
    /// Shot details need games and shots stored first.
    Sync {
        #[arg(value_enum)]
        targets: Vec<Target>,
        /// Season to sync, e.g. 2014-15. Defaults to HOOPSYNC_SEASON or the current season.
        #[arg(long)]
        season: Option<Season>,
    },
    /// Keep the database fresh until interrupted. Without --season, each
    /// refresh follows the calendar into the next season.
    Continuous {
        #[arg(long)]
        season: Option<Season>,
    },
    /// Apply database migrations.
    Migrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Teams,
    Players,
    Games,
    Shots,
    ShotDetails,
    Events,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let cli = Cli::parse();
    let mut config = SyncConfig::from_env();

    match cli.command.unwrap_or(Commands::Sync {
        targets: Vec::new(),
        season: None,
    }) {
        Commands::Sync { targets, season } => {
            config.season = season.or(config.season);
            sync_once(&config, &targets).await?;
        }
        Commands::Continuous { season } => {
            config.season = season.or(config.season);
            let syncer = config.build_syncer().await?;
            let mut continuous = Continuous::new(syncer)
                .with_cadence(config.cadence)
                .with_error_sink(Arc::new(LogSink));
            if let Some(season) = config.season {
                continuous = continuous.with_season(season);
            }
            continuous.run_until(shutdown_signal()).await;
        }
        Commands::Migrate => {
            let store = config.connect_store().await?;
            store.migrate().await.context("applying migrations")?;
            println!("migrations applied");
        }
    }

    Ok(())
}

async fn sync_once(config: &SyncConfig, targets: &[Target]) -> Result<()> {
    let targets = if targets.is_empty() {
        vec![Target::Teams, Target::Players, Target::Games]
    } else {
        targets.to_vec()
    };
    let syncer = config.build_syncer().await?;
    let season = config.season_or_current();

    let mut incomplete = 0;
    for target in targets {
        let report = match target {
            Target::Teams => syncer.sync_teams().await,
            Target::Players => syncer.sync_players().await,
            Target::Games => syncer.sync_all_games(season).await,
            Target::Shots => syncer.sync_shots(season).await,
            Target::ShotDetails => syncer.sync_shot_details(season).await,
            Target::Events => syncer.sync_season_events(season).await,
        }
        .with_context(|| format!("syncing {target:?}"))?;
        print_report(&report);
        if !report.is_complete() {
            incomplete += 1;
        }
    }

    if incomplete > 0 {
        bail!("{incomplete} sync step(s) finished with failures");
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!(
        "{}: attempted={} succeeded={} failed={} skipped={}",
        report.entity,
        report.attempted,
        report.succeeded,
        report.failed(),
        report.skipped
    );
    if let Some(failures) = &report.failures {
        for err in failures.errors() {
            println!("  {err}");
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("interrupt received, stopping after the current refresh"),
        Err(err) => {
            error!(error = %err, "cannot listen for interrupts");
            std::future::pending::<()>().await;
        }
    }
}
