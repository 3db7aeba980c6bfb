pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod harvest;
pub mod models;
pub mod render;
pub mod series;
pub mod tasks;
pub mod utils;

use std::process::ExitCode;

use clap::Parser;

pub use config::AppConfig;
pub use db::Database;
pub use error::{StatsError, StatsResult};
pub use series::{load_series, reconcile, OutputFormat, SeriesRequest};

/// Entry point of the `rankseries` binary.
pub async fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    utils::init_logging();

    log::debug!("rankseries starting up...");

    match cli::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
