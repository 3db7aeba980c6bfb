pub mod commands;

pub use commands::{create_task, delete_task, list_tasks, validate_task};
