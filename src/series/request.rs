use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{StatsError, StatsResult},
    models::{Granularity, RankingAlgorithm, RecencyWindow},
};

/// How a series response is rendered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured record list wrapped in the `{data, error}` envelope.
    #[default]
    Json,
    /// Delimited table with a header row.
    Csv,
}

impl FromStr for OutputFormat {
    type Err = StatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "application/json" => Ok(OutputFormat::Json),
            "csv" | "text/csv" => Ok(OutputFormat::Csv),
            other => Err(StatsError::validation(format!(
                "unknown output format '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Csv => f.write_str("csv"),
        }
    }
}

/// A request for one subject's ranked series over `[from_time, to_time)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub subject_name: String,
    pub ranking_algorithm: RankingAlgorithm,
    pub recency_window: RecencyWindow,
    pub granularity: Granularity,
    pub from_time: DateTime<Utc>,
    pub to_time: DateTime<Utc>,
    #[serde(default)]
    pub backfill: bool,
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl SeriesRequest {
    /// Checks every request field and returns the granularity tick.
    pub fn validate(&self) -> StatsResult<TimeDelta> {
        if !self.ranking_algorithm.is_supported() {
            return Err(StatsError::UnsupportedAlgorithm(
                self.ranking_algorithm.as_str().to_string(),
            ));
        }

        if !self.recency_window.is_supported() {
            return Err(StatsError::UnsupportedRecencyWindow(
                self.recency_window.as_str().to_string(),
            ));
        }

        let tick = self.granularity.tick().ok_or_else(|| {
            StatsError::UnsupportedGranularity(self.granularity.as_str().to_string())
        })?;

        if self.subject_name.trim().is_empty() {
            return Err(StatsError::validation("subject_name is empty"));
        }

        if self.from_time >= self.to_time {
            return Err(StatsError::validation(format!(
                "from_time ({}) must be before to_time ({})",
                self.from_time.to_rfc3339(),
                self.to_time.to_rfc3339()
            )));
        }

        Ok(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> SeriesRequest {
        SeriesRequest {
            subject_name: "memes".into(),
            ranking_algorithm: RankingAlgorithm::Top,
            recency_window: RecencyWindow::Day,
            granularity: Granularity::Hour,
            from_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            to_time: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            backfill: false,
            output_format: OutputFormat::Json,
        }
    }

    #[test]
    fn supported_request_yields_hour_tick() {
        assert_eq!(request().validate().unwrap(), TimeDelta::hours(1));
    }

    #[test]
    fn rejects_unsupported_views() {
        let mut req = request();
        req.ranking_algorithm = RankingAlgorithm::Hot;
        assert!(matches!(req.validate(), Err(StatsError::UnsupportedAlgorithm(v)) if v == "hot"));

        let mut req = request();
        req.recency_window = RecencyWindow::Year;
        assert!(matches!(req.validate(), Err(StatsError::UnsupportedRecencyWindow(_))));

        let mut req = request();
        req.granularity = Granularity::Week;
        assert!(matches!(req.validate(), Err(StatsError::UnsupportedGranularity(v)) if v == "week"));
    }

    #[test]
    fn rejects_blank_subject_and_inverted_range() {
        let mut req = request();
        req.subject_name = "   ".into();
        assert!(matches!(req.validate(), Err(StatsError::Validation(_))));

        let mut req = request();
        req.to_time = req.from_time;
        assert!(matches!(req.validate(), Err(StatsError::Validation(_))));
    }

    #[test]
    fn output_format_accepts_mime_types() {
        assert_eq!("text/csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
