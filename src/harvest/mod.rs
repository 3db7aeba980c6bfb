//! Polling a listing and turning what came back into stored observations.

pub mod command;
pub mod ingest;
pub mod raw;
pub mod scheduler;

pub use command::{CommandHarvester, Harvester};
pub use ingest::{ingest_file, ingest_posts};
pub use raw::{HarvestTarget, RawPost};
pub use scheduler::{harvest_loop, harvest_once, HarvestOutcome, HarvestReport, HarvestSchedule};
