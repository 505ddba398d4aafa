use crate::domain::{Task, TaskDraft, TaskId, TaskPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row shape of the `tasks` table as PostgREST returns it.
#[derive(Debug, Deserialize)]
pub struct TaskRow {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskInsertRow {
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: TaskId(row.id),
            text: row.text,
            completed: row.completed,
            created_at: row
                .created_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl From<&TaskDraft> for TaskInsertRow {
    fn from(draft: &TaskDraft) -> Self {
        Self {
            text: draft.text.clone(),
            completed: draft.completed,
        }
    }
}

impl From<&TaskPatch> for TaskPatchRow {
    fn from(patch: &TaskPatch) -> Self {
        Self {
            text: patch.text.clone(),
            completed: patch.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_row_decodes_and_converts() {
        let json = r#"{"id":3,"text":"Buy milk","completed":false,"created_at":"2024-05-01T12:30:00+00:00"}"#;
        let row: TaskRow = serde_json::from_str(json).unwrap();
        let task: Task = row.into();

        assert_eq!(task.id, TaskId(3));
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert!(task.created_at.is_some());
    }

    #[test]
    fn task_row_tolerates_missing_created_at() {
        let json = r#"{"id":1,"text":"a","completed":true}"#;
        let row: TaskRow = serde_json::from_str(json).unwrap();
        let task: Task = row.into();
        assert!(task.created_at.is_none());
    }

    #[test]
    fn patch_row_omits_unset_fields() {
        let patch = TaskPatch::completed(true);
        let row = TaskPatchRow::from(&patch);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"completed":true}"#);

        let patch = TaskPatch::text("b");
        let row = TaskPatchRow::from(&patch);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"text":"b"}"#);
    }
}
