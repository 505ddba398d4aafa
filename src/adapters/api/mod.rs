pub mod client;
pub mod dto;
pub mod task_store;

pub use client::*;
pub use dto::*;
pub use task_store::*;
