use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::SeriesPoint;

/// Envelope shared by success and failure responses. Exactly one side is set.
#[derive(Debug, Serialize)]
pub struct Response<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PointsBody<'a> {
    pub points: &'a [SeriesPoint],
}

pub fn render_points<W: Write>(points: &[SeriesPoint], mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, &Response::ok(PointsBody { points }))
        .context("failed to serialize series")?;
    writeln!(out)?;
    Ok(())
}

pub fn render_error<W: Write>(message: &str, mut out: W) -> Result<()> {
    serde_json::to_writer(&mut out, &Response::<()>::failed(message))
        .context("failed to serialize error response")?;
    writeln!(out)?;
    Ok(())
}
