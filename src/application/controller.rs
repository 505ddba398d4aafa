use std::sync::Arc;

use crate::domain::{Task, TaskDraft, TaskId, TaskPatch};
use crate::ports::TaskStore;

/// Edit sub-flow state. At most one task is in edit mode at a time;
/// `text` is a scratch copy of that task's text, independent of the
/// snapshot entry until saved.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing { id: TaskId, text: String },
}

/// Mediates all reads and writes between the presentation layer and the
/// task store, keeping the local snapshot eventually consistent with
/// the store after every action.
///
/// Every mutating operation re-lists the full collection on success
/// instead of merging the returned record locally. That costs a round
/// trip per action but keeps the store authoritative. Store failures
/// never escape these methods: they are logged and the current
/// operation's remaining steps are skipped, leaving the snapshot at its
/// last successful value.
pub struct TaskListController {
    store: Arc<dyn TaskStore>,
    tasks: Vec<Task>,
    new_task_input: String,
    loading: bool,
    edit: EditState,
}

impl TaskListController {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            tasks: Vec::new(),
            new_task_input: String::new(),
            loading: false,
            edit: EditState::Idle,
        }
    }

    /// Last full snapshot returned by the store, in store order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// True only while a list request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn new_task_input(&self) -> &str {
        &self.new_task_input
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn editing_task_id(&self) -> Option<TaskId> {
        match &self.edit {
            EditState::Editing { id, .. } => Some(*id),
            EditState::Idle => None,
        }
    }

    pub fn editing_text(&self) -> Option<&str> {
        match &self.edit {
            EditState::Editing { text, .. } => Some(text),
            EditState::Idle => None,
        }
    }

    // -- input buffer (pending creation field) --------------------------

    pub fn push_input(&mut self, c: char) {
        self.new_task_input.push(c);
    }

    pub fn backspace_input(&mut self) {
        self.new_task_input.pop();
    }

    pub fn clear_input(&mut self) {
        self.new_task_input.clear();
    }

    // -- scratch text for the active edit -------------------------------

    pub fn push_edit(&mut self, c: char) {
        if let EditState::Editing { text, .. } = &mut self.edit {
            text.push(c);
        }
    }

    pub fn backspace_edit(&mut self) {
        if let EditState::Editing { text, .. } = &mut self.edit {
            text.pop();
        }
    }

    pub fn set_editing_text(&mut self, new_text: impl Into<String>) {
        if let EditState::Editing { text, .. } = &mut self.edit {
            *text = new_text.into();
        }
    }

    // -- remote operations ----------------------------------------------

    /// Replace the snapshot with the store's full collection. On
    /// failure the previous snapshot is kept; `loading` is cleared
    /// either way. No retry.
    pub async fn refresh(&mut self) {
        self.loading = true;
        match self.store.list().await {
            Ok(tasks) => self.tasks = tasks,
            Err(e) => tracing::error!("failed to list tasks: {e}"),
        }
        self.loading = false;
    }

    /// Insert a new incomplete task, then resynchronize. The input
    /// buffer is not cleared here; that is the caller's call to make.
    pub async fn create(&mut self, text: &str) {
        let draft = TaskDraft::new(text);
        match self.store.insert(&draft).await {
            Ok(_) => self.refresh().await,
            Err(e) => tracing::error!("failed to insert task: {e}"),
        }
    }

    /// Delete the task matching `id`, then resynchronize.
    pub async fn remove(&mut self, id: TaskId) {
        match self.store.delete(id).await {
            Ok(()) => self.refresh().await,
            Err(e) => tracing::error!("failed to delete task {id}: {e}"),
        }
    }

    /// Set the completion flag of the task matching `id` to the given
    /// value, then resynchronize. Callers wanting toggle semantics pass
    /// the negation of the task's current flag; this method applies the
    /// value as given.
    pub async fn set_completed(&mut self, id: TaskId, completed: bool) {
        let patch = TaskPatch::completed(completed);
        match self.store.update(id, &patch).await {
            Ok(()) => self.refresh().await,
            Err(e) => tracing::error!("failed to update task {id}: {e}"),
        }
    }

    /// Enter edit mode for `task`, seeding the scratch text from its
    /// current text. Unconditionally discards any prior in-progress
    /// edit. Local state only, no remote call.
    pub fn begin_edit(&mut self, task: &Task) {
        self.edit = EditState::Editing {
            id: task.id,
            text: task.text.clone(),
        };
    }

    /// Write the scratch text to the task matching `id`. On success the
    /// edit state returns to idle and the snapshot is resynchronized;
    /// on failure the edit state is left untouched so the unsaved text
    /// survives.
    pub async fn save_edit(&mut self, id: TaskId) {
        let text = match &self.edit {
            EditState::Editing { text, .. } => text.clone(),
            EditState::Idle => return,
        };
        let patch = TaskPatch::text(text);
        match self.store.update(id, &patch).await {
            Ok(()) => {
                self.edit = EditState::Idle;
                self.refresh().await;
            }
            Err(e) => tracing::error!("failed to save edit for task {id}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockTaskStore, StoreError};
    use mockall::Sequence;

    fn task(id: i64, text: &str, completed: bool) -> Task {
        Task {
            id: TaskId(id),
            text: text.to_string(),
            completed,
            created_at: None,
        }
    }

    fn store_failure() -> StoreError {
        StoreError::Api {
            status: 500,
            body: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_and_clears_loading() {
        let mut store = MockTaskStore::new();
        let rows = vec![task(1, "a", false), task(2, "b", true)];
        let expected = rows.clone();
        store.expect_list().times(1).returning(move || Ok(rows.clone()));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.refresh().await;

        assert_eq!(ctl.tasks(), expected.as_slice());
        assert!(!ctl.is_loading());
    }

    #[tokio::test]
    async fn refresh_is_idempotent_without_store_mutation() {
        let mut store = MockTaskStore::new();
        let rows = vec![task(1, "a", false), task(2, "b", false)];
        store
            .expect_list()
            .times(2)
            .returning(move || Ok(rows.clone()));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.refresh().await;
        let first = ctl.tasks().to_vec();
        ctl.refresh().await;

        assert_eq!(ctl.tasks(), first.as_slice());
    }

    #[tokio::test]
    async fn refresh_failure_keeps_previous_snapshot() {
        let mut store = MockTaskStore::new();
        let mut seq = Sequence::new();
        let rows = vec![task(1, "a", false)];
        let expected = rows.clone();
        store
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(rows.clone()));
        store
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(store_failure()));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.refresh().await;
        ctl.refresh().await;

        assert_eq!(ctl.tasks(), expected.as_slice());
        assert!(!ctl.is_loading());
    }

    #[tokio::test]
    async fn create_then_list_contains_new_task() {
        let mut store = MockTaskStore::new();
        store
            .expect_insert()
            .withf(|draft| draft.text == "Buy milk" && !draft.completed)
            .times(1)
            .returning(|_| Ok(task(4, "Buy milk", false)));
        store
            .expect_list()
            .times(1)
            .returning(|| Ok(vec![task(1, "a", false), task(4, "Buy milk", false)]));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.create("Buy milk").await;

        let created: Vec<_> = ctl
            .tasks()
            .iter()
            .filter(|t| t.text == "Buy milk")
            .collect();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, TaskId(4));
        assert!(!created[0].completed);
    }

    #[tokio::test]
    async fn create_does_not_clear_input_buffer() {
        let mut store = MockTaskStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Ok(task(4, "Buy milk", false)));
        store.expect_list().times(1).returning(|| Ok(vec![]));

        let mut ctl = TaskListController::new(Arc::new(store));
        for c in "Buy milk".chars() {
            ctl.push_input(c);
        }
        let text = ctl.new_task_input().to_string();
        ctl.create(&text).await;

        // Clearing the buffer is the caller's responsibility.
        assert_eq!(ctl.new_task_input(), "Buy milk");
    }

    #[tokio::test]
    async fn remove_deletes_exactly_one() {
        let mut store = MockTaskStore::new();
        store
            .expect_delete()
            .withf(|&id| id == TaskId(2))
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_list()
            .times(1)
            .returning(|| Ok(vec![task(1, "a", false), task(3, "c", false)]));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.remove(TaskId(2)).await;

        let ids: Vec<_> = ctl.tasks().iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn set_completed_applies_given_value_and_is_idempotent() {
        let mut store = MockTaskStore::new();
        store
            .expect_update()
            .withf(|&id, patch| {
                id == TaskId(5) && patch.completed == Some(true) && patch.text.is_none()
            })
            .times(2)
            .returning(|_, _| Ok(()));
        store
            .expect_list()
            .times(2)
            .returning(|| Ok(vec![task(5, "a", true)]));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.set_completed(TaskId(5), true).await;
        assert!(ctl.tasks()[0].completed);

        // Re-applying the same value leaves the snapshot unchanged.
        let before = ctl.tasks().to_vec();
        ctl.set_completed(TaskId(5), true).await;
        assert_eq!(ctl.tasks(), before.as_slice());
    }

    #[tokio::test]
    async fn begin_edit_seeds_scratch_and_overwrites_prior_edit() {
        let store = MockTaskStore::new();
        let mut ctl = TaskListController::new(Arc::new(store));

        ctl.begin_edit(&task(7, "a", false));
        assert_eq!(ctl.editing_task_id(), Some(TaskId(7)));
        assert_eq!(ctl.editing_text(), Some("a"));

        // Selecting another task discards the previous scratch text.
        ctl.set_editing_text("half-typed");
        ctl.begin_edit(&task(9, "z", false));
        assert_eq!(ctl.editing_task_id(), Some(TaskId(9)));
        assert_eq!(ctl.editing_text(), Some("z"));
    }

    #[tokio::test]
    async fn edit_round_trip_updates_text_and_returns_to_idle() {
        let mut store = MockTaskStore::new();
        store
            .expect_update()
            .withf(|&id, patch| {
                id == TaskId(7)
                    && patch.text.as_deref() == Some("b")
                    && patch.completed.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_list()
            .times(1)
            .returning(|| Ok(vec![task(7, "b", false)]));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.begin_edit(&task(7, "a", false));
        ctl.set_editing_text("b");
        ctl.save_edit(TaskId(7)).await;

        assert_eq!(ctl.edit_state(), &EditState::Idle);
        assert_eq!(ctl.tasks()[0].text, "b");
    }

    #[tokio::test]
    async fn save_edit_failure_preserves_edit_state_and_snapshot() {
        let mut store = MockTaskStore::new();
        let mut seq = Sequence::new();
        store
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![task(7, "a", false)]));
        store
            .expect_update()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(store_failure()));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.refresh().await;
        let snapshot_before = ctl.tasks().to_vec();

        ctl.begin_edit(&task(7, "a", false));
        ctl.set_editing_text("b");
        ctl.save_edit(TaskId(7)).await;

        assert_eq!(ctl.editing_task_id(), Some(TaskId(7)));
        assert_eq!(ctl.editing_text(), Some("b"));
        assert_eq!(ctl.tasks(), snapshot_before.as_slice());
    }

    #[tokio::test]
    async fn save_edit_while_idle_is_a_no_op() {
        let store = MockTaskStore::new();
        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.save_edit(TaskId(1)).await;
        assert_eq!(ctl.edit_state(), &EditState::Idle);
    }

    #[tokio::test]
    async fn store_errors_never_propagate_and_leave_state_untouched() {
        let mut store = MockTaskStore::new();
        store.expect_list().returning(|| Err(store_failure()));
        store.expect_insert().returning(|_| Err(store_failure()));
        store.expect_update().returning(|_, _| Err(store_failure()));
        store.expect_delete().returning(|_| Err(store_failure()));

        let mut ctl = TaskListController::new(Arc::new(store));
        ctl.refresh().await;
        ctl.create("x").await;
        ctl.remove(TaskId(1)).await;
        ctl.set_completed(TaskId(1), true).await;
        ctl.begin_edit(&task(1, "a", false));
        ctl.save_edit(TaskId(1)).await;

        assert!(ctl.tasks().is_empty());
        assert!(!ctl.is_loading());
        assert_eq!(ctl.editing_task_id(), Some(TaskId(1)));
    }
}
