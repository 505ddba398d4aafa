use super::{PostgrestClient, TaskInsertRow, TaskPatchRow, TaskRow};
use crate::domain::{Task, TaskDraft, TaskId, TaskPatch};
use crate::ports::{StoreResult, TaskStore};
use async_trait::async_trait;

const TASKS_TABLE: &str = "tasks";

pub struct SupabaseTaskStore {
    client: PostgrestClient,
}

impl SupabaseTaskStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    fn id_filter(id: TaskId) -> String {
        format!("eq.{id}")
    }
}

#[async_trait]
impl TaskStore for SupabaseTaskStore {
    async fn list(&self) -> StoreResult<Vec<Task>> {
        // Ordering by id keeps the snapshot stable between refreshes;
        // PostgREST row order is otherwise unspecified.
        let rows: Vec<TaskRow> = self
            .client
            .select(TASKS_TABLE, &[("select", "*"), ("order", "id.asc")])
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn insert(&self, draft: &TaskDraft) -> StoreResult<Task> {
        let row: TaskRow = self
            .client
            .insert(TASKS_TABLE, &TaskInsertRow::from(draft))
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<()> {
        let filter = Self::id_filter(id);
        self.client
            .update(
                TASKS_TABLE,
                &[("id", filter.as_str())],
                &TaskPatchRow::from(patch),
            )
            .await
    }

    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        let filter = Self::id_filter(id);
        self.client
            .delete(TASKS_TABLE, &[("id", filter.as_str())])
            .await
    }
}
