pub mod reconcile;
pub mod request;
pub mod service;

pub use reconcile::{reconcile, sort_points};
pub use request::{OutputFormat, SeriesRequest};
pub use service::load_series;
