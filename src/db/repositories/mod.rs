pub mod observations;
pub mod tasks;

pub use observations::ObservationQuery;
