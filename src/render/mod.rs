//! Output renderers for reconciled series.

pub mod json;
pub mod table;

use std::io::Write;

use anyhow::Result;

use crate::{models::SeriesPoint, series::OutputFormat};

pub use json::{render_error, render_points, Response};
pub use table::write_table;

/// Writes `points` to `out` in the requested format.
pub fn render<W: Write>(points: &[SeriesPoint], format: OutputFormat, out: W) -> Result<()> {
    match format {
        OutputFormat::Json => render_points(points, out),
        OutputFormat::Csv => write_table(points, out),
    }
}
