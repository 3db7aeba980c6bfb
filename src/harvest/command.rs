use std::future::Future;

use anyhow::{anyhow, bail, Context, Result};
use tokio::process::Command;

use super::raw::{parse_raw_posts, HarvestTarget, RawPost};

/// Source of listing snapshots. The browser automation that reads the page
/// lives outside this crate; implementations only have to return its posts.
pub trait Harvester: Send + Sync + 'static {
    fn harvest(&self, target: &HarvestTarget)
        -> impl Future<Output = Result<Vec<RawPost>>> + Send;
}

/// Runs an external scraper as `<program> [args..] <subject> <algorithm> <window>`
/// and reads a JSON array of posts from its stdout.
#[derive(Debug, Clone)]
pub struct CommandHarvester {
    program: String,
    args: Vec<String>,
}

impl CommandHarvester {
    pub fn new(command_line: &[String]) -> Result<Self> {
        let (program, args) = command_line
            .split_first()
            .ok_or_else(|| anyhow!("harvest command is not configured"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Harvester for CommandHarvester {
    async fn harvest(&self, target: &HarvestTarget) -> Result<Vec<RawPost>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&target.subject_name)
            .arg(target.ranking_algorithm.as_str())
            .arg(target.recency_window.as_str())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run harvester '{}'", self.program))?;

        if !output.status.success() {
            bail!(
                "harvester '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_raw_posts(&output.stdout)
    }
}
