pub mod config_store;
pub mod task_store;

pub use config_store::*;
pub use task_store::*;
