use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::ValueRef, Row};

use crate::models::observation::parse_metric;

/// Fixed-width RFC 3339 so that text comparison in SQL matches time order.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_enum<T>(value: &str, field: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|err| anyhow!("{field} holds unexpected value: {err}"))
}

/// Reads a metric cell, degrading anything that is not an integer to `None`.
pub fn lenient_metric(row: &Row, column: &str) -> Result<Option<i32>> {
    let value = row.get_ref(column)?;
    Ok(match value {
        ValueRef::Integer(raw) => i32::try_from(raw).ok(),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_metric),
        ValueRef::Null | ValueRef::Real(_) | ValueRef::Blob(_) => None,
    })
}
