pub mod observation;
pub mod ranking;
pub mod task;

pub use observation::{GapKind, Observation, SeriesPoint, MAX_RANK};
pub use ranking::{Granularity, RankingAlgorithm, RecencyWindow};
pub use task::{HarvestTask, HarvestTaskInput};
