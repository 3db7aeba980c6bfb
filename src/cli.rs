//! Command-line front end.

use std::{io, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    db::Database,
    error::{StatsError, StatsResult},
    harvest::{self, CommandHarvester, HarvestSchedule, HarvestTarget},
    models::{Granularity, HarvestTaskInput, RankingAlgorithm, RecencyWindow},
    render::{self, Response},
    series::{self, OutputFormat, SeriesRequest},
    tasks,
};

#[derive(Debug, Parser)]
#[command(name = "rankseries", version, about = "Ranked listing time series")]
pub struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path, overrides the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the reconciled series of one subject
    Stats(StatsArgs),
    /// Manage harvest tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Import a saved scraper dump
    Ingest(IngestArgs),
    /// Run every hourly task once
    Harvest,
    /// Harvest on a schedule until interrupted
    Run,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(long)]
    pub subject: String,
    #[arg(long, default_value = "top")]
    pub algorithm: String,
    #[arg(long, default_value = "day")]
    pub window: String,
    #[arg(long, default_value = "hour")]
    pub granularity: String,
    /// Inclusive start, RFC 3339
    #[arg(long)]
    pub from: DateTime<Utc>,
    /// Exclusive end, RFC 3339
    #[arg(long)]
    pub to: DateTime<Utc>,
    /// Fill dropout and poll-failure gaps
    #[arg(long)]
    pub backfill: bool,
    #[arg(long, default_value = "json")]
    pub format: String,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    Create {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value_t = 20)]
        min_items: i64,
        #[arg(long, default_value = "hour")]
        interval: String,
        #[arg(long, default_value = "top")]
        algorithm: String,
        #[arg(long, default_value = "day")]
        window: String,
    },
    Delete {
        id: i64,
    },
    List,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// JSON array of scraped posts
    #[arg(long)]
    pub file: PathBuf,
    #[arg(long)]
    pub subject: String,
    #[arg(long, default_value = "top")]
    pub algorithm: String,
    #[arg(long, default_value = "day")]
    pub window: String,
    #[arg(long, default_value = "hour")]
    pub granularity: String,
    /// When the dump was taken; defaults to now
    #[arg(long)]
    pub polled_at: Option<DateTime<Utc>>,
}

impl StatsArgs {
    fn to_request(&self) -> StatsResult<SeriesRequest> {
        Ok(SeriesRequest {
            subject_name: self.subject.clone(),
            ranking_algorithm: self.algorithm.parse()?,
            recency_window: self.window.parse()?,
            granularity: self.granularity.parse()?,
            from_time: self.from,
            to_time: self.to,
            backfill: self.backfill,
            output_format: self.format.parse()?,
        })
    }
}

fn print_json<T: Serialize>(data: T) -> Result<()> {
    let out = io::stdout().lock();
    serde_json::to_writer_pretty(out, &Response::ok(data)).context("failed to write output")?;
    println!();
    Ok(())
}

async fn stats(db: &Database, args: &StatsArgs) -> Result<()> {
    let format = args.format.parse().unwrap_or(OutputFormat::Json);
    let outcome = match args.to_request() {
        Ok(request) => series::load_series(db, &request).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(points) => render::render(&points, format, io::stdout().lock()),
        Err(err) => {
            if format == OutputFormat::Json {
                render::render_error(&err.to_string(), io::stdout().lock())?;
            }
            Err(err.into())
        }
    }
}

async fn task(db: &Database, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::Create {
            subject,
            min_items,
            interval,
            algorithm,
            window,
        } => {
            let input = HarvestTaskInput {
                subject_name: subject,
                min_item_count: min_items,
                interval: interval.parse::<Granularity>()?,
                ranking_algorithm: algorithm.parse::<RankingAlgorithm>()?,
                recency_window: window.parse::<RecencyWindow>()?,
            };
            let task = tasks::create_task(db, input).await?;
            info!("created task {} for {}", task.id, task.subject_name);
            print_json(task)
        }
        TaskCommand::Delete { id } => {
            tasks::delete_task(db, id).await?;
            info!("deleted task {id}");
            Ok(())
        }
        TaskCommand::List => print_json(tasks::list_tasks(db).await?),
    }
}

async fn ingest(db: &Database, args: IngestArgs) -> Result<()> {
    let subject_name = args.subject.trim().to_string();
    if subject_name.is_empty() {
        return Err(StatsError::validation("subject is empty").into());
    }
    let target = HarvestTarget {
        subject_name,
        ranking_algorithm: args.algorithm.parse()?,
        recency_window: args.window.parse()?,
        granularity: args.granularity.parse()?,
    };
    let polled_at = args.polled_at.unwrap_or_else(Utc::now);
    let stored = harvest::ingest_file(db, &args.file, &target, polled_at).await?;
    println!("{stored}");
    Ok(())
}

fn harvester(config: &AppConfig) -> Result<Arc<CommandHarvester>> {
    if config.harvest_command.is_empty() {
        bail!("no harvest command configured; set harvest_command or RANKSERIES_HARVEST_CMD");
    }
    Ok(Arc::new(CommandHarvester::new(&config.harvest_command)?))
}

async fn run_scheduler(db: Database, config: &AppConfig) -> Result<()> {
    let harvester = harvester(config)?;
    let schedule = HarvestSchedule {
        every: config.harvest_interval(),
        timeout: config.harvest_timeout(),
    };

    let cancel_token = CancellationToken::new();
    let worker = tokio::spawn(harvest::harvest_loop(
        db,
        harvester,
        schedule,
        cancel_token.clone(),
    ));

    info!(
        "harvesting every {}s, press Ctrl-C to stop",
        schedule.every.as_secs()
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    cancel_token.cancel();
    worker.await.context("harvest loop panicked")?;
    Ok(())
}

/// Executes a parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db {
        config.database_path = db_path;
    }

    let db = Database::new(config.database_path.clone())?;

    match cli.command {
        Command::Stats(args) => stats(&db, &args).await,
        Command::Task(command) => task(&db, command).await,
        Command::Ingest(args) => ingest(&db, args).await,
        Command::Harvest => {
            let reports =
                harvest::harvest_once(&db, harvester(&config)?, config.harvest_timeout()).await?;
            print_json(reports)
        }
        Command::Run => run_scheduler(db, &config).await,
    }
}
