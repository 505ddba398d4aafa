use crate::domain::{Task, TaskDraft, TaskId, TaskPatch};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("store rejected request (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode store response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Remote persistence for tasks. The store is authoritative: callers
/// re-list after every mutation instead of patching local copies.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task, unfiltered, in store-defined order.
    async fn list(&self) -> StoreResult<Vec<Task>>;

    /// Insert a new task; the store assigns and returns the id.
    async fn insert(&self, draft: &TaskDraft) -> StoreResult<Task>;

    /// Partial field update of the task matching `id`.
    async fn update(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<()>;

    /// Delete the task matching `id`.
    async fn delete(&self, id: TaskId) -> StoreResult<()>;
}
