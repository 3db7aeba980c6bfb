//! Ranking view enums shared by observations, series requests and tasks.

use std::{fmt, str::FromStr};

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Popularity ordering that produced a rank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RankingAlgorithm {
    Top,
    Best,
    Hot,
    New,
}

impl RankingAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingAlgorithm::Top => "top",
            RankingAlgorithm::Best => "best",
            RankingAlgorithm::Hot => "hot",
            RankingAlgorithm::New => "new",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, RankingAlgorithm::Top)
    }
}

impl FromStr for RankingAlgorithm {
    type Err = StatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(RankingAlgorithm::Top),
            "best" => Ok(RankingAlgorithm::Best),
            "hot" => Ok(RankingAlgorithm::Hot),
            "new" => Ok(RankingAlgorithm::New),
            _ => Err(StatsError::UnsupportedAlgorithm(value.to_string())),
        }
    }
}

impl fmt::Display for RankingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-side recency filter applied at scrape time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecencyWindow {
    Hour,
    Day,
    Month,
    Year,
}

impl RecencyWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecencyWindow::Hour => "hour",
            RecencyWindow::Day => "day",
            RecencyWindow::Month => "month",
            RecencyWindow::Year => "year",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, RecencyWindow::Day)
    }
}

impl FromStr for RecencyWindow {
    type Err = StatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(RecencyWindow::Hour),
            "day" => Ok(RecencyWindow::Day),
            "month" => Ok(RecencyWindow::Month),
            "year" => Ok(RecencyWindow::Year),
            _ => Err(StatsError::UnsupportedRecencyWindow(value.to_string())),
        }
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucketing resolution of a series. Only `Hour` has a tick today; the other
/// variants are accepted on the wire and rejected at validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Minute,
    QuarterHour,
    Hour,
    Day,
    Week,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::QuarterHour => "quarter_hour",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
        }
    }

    /// Fixed tick duration, `None` when the granularity is not implemented.
    pub fn tick(&self) -> Option<TimeDelta> {
        match self {
            Granularity::Hour => Some(TimeDelta::hours(1)),
            _ => None,
        }
    }

    /// Rounds `instant` down to the start of its tick.
    pub fn align(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>, StatsError> {
        let tick = self
            .tick()
            .ok_or_else(|| StatsError::UnsupportedGranularity(self.as_str().to_string()))?;
        instant
            .duration_trunc(tick)
            .map_err(|err| StatsError::validation(format!("cannot align {instant}: {err}")))
    }
}

impl FromStr for Granularity {
    type Err = StatsError;

    /// Accepts names and the numeric codes older clients send
    /// (1 = minute, 2 = quarter hour, 3 = hour, 4 = day).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minute" | "1" => Ok(Granularity::Minute),
            "quarter_hour" | "quarterhour" | "2" => Ok(Granularity::QuarterHour),
            "hour" | "hourly" | "3" => Ok(Granularity::Hour),
            "day" | "daily" | "4" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            _ => Err(StatsError::UnsupportedGranularity(value.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
