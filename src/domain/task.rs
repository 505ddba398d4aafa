use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned row id. Immutable once created, unique per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        TaskId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    /// Server-assigned creation timestamp. Never written by the client.
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Checkbox marker for list rendering.
    pub fn status_marker(&self) -> &'static str {
        if self.completed {
            "[x]"
        } else {
            "[ ]"
        }
    }

}

/// Fields for a new task. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub text: String,
    pub completed: bool,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }
}

/// Partial update applied to a single task by id match. `None` fields
/// are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_defaults_to_incomplete() {
        let draft = TaskDraft::new("Buy milk");
        assert_eq!(draft.text, "Buy milk");
        assert!(!draft.completed);
    }

    #[test]
    fn status_marker_reflects_completion() {
        let task = Task {
            id: TaskId(1),
            text: "a".to_string(),
            completed: false,
            created_at: None,
        };
        assert_eq!(task.status_marker(), "[ ]");
        let done = Task {
            completed: true,
            ..task
        };
        assert_eq!(done.status_marker(), "[x]");
    }
}
