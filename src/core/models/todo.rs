use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::completion::CompletionDetail;
use crate::core::errors::TodoError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Complete,
    Incomplete,
}

impl TodoStatus {
    pub fn parse(value: &str) -> Result<Self, TodoError> {
        match value.trim() {
            "complete" => Ok(TodoStatus::Complete),
            "incomplete" => Ok(TodoStatus::Incomplete),
            other => Err(TodoError::InvalidStatus(other.to_string())),
        }
    }

    pub fn is_complete(self) -> bool {
        self == TodoStatus::Complete
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TodoStatus::Complete => "complete",
            TodoStatus::Incomplete => "incomplete",
        };
        write!(f, "{}", s)
    }
}

/// A task in the shared pool. Completion state lives in `todo_completions`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub time: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(title: String, owner: Option<Uuid>) -> Self {
        let now = Utc::now();
        Todo {
            id: Uuid::new_v4(),
            title,
            time: display_time(&now.with_timezone(&chrono::Local)),
            user_id: owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Formats a timestamp as `3:07 PM, 10/19/2026`.
pub fn display_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-I:%M %p, %m/%d/%Y").to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Completer {
    pub id: Uuid,
    pub email: String,
    pub completed_at: DateTime<Utc>,
}

/// A todo as seen by one requester.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoView {
    pub id: Uuid,
    pub title: String,
    pub status: TodoStatus,
    pub time: String,
    pub user_id: Option<Uuid>,
    pub completion_count: usize,
    pub completed_by: Vec<Completer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoView {
    /// Builds the requester-relative view. `details` may contain rows for other
    /// todos; only the ones matching `todo.id` are counted.
    pub fn build(todo: Todo, details: &[CompletionDetail], requester: Option<Uuid>) -> Self {
        let mut completed_by: Vec<Completer> = details
            .iter()
            .filter(|d| d.todo_id == todo.id)
            .map(|d| Completer {
                id: d.user_id,
                email: d.email.clone(),
                completed_at: d.completed_at,
            })
            .collect();
        completed_by.sort_by_key(|c| c.completed_at);

        let status = match requester {
            Some(user_id) if completed_by.iter().any(|c| c.id == user_id) => TodoStatus::Complete,
            _ => TodoStatus::Incomplete,
        };

        TodoView {
            id: todo.id,
            title: todo.title,
            status,
            time: todo.time,
            user_id: todo.user_id,
            completion_count: completed_by.len(),
            completed_by,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn detail(todo_id: Uuid, user_id: Uuid, email: &str, offset_secs: i64) -> CompletionDetail {
        CompletionDetail {
            todo_id,
            user_id,
            email: email.to_string(),
            completed_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn status_is_relative_to_requester() {
        let todo = Todo::new("Ship it".to_string(), None);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let details = vec![detail(todo.id, alice, "alice@example.com", 0)];

        let for_alice = TodoView::build(todo.clone(), &details, Some(alice));
        let for_bob = TodoView::build(todo.clone(), &details, Some(bob));
        let anonymous = TodoView::build(todo, &details, None);

        assert_eq!(for_alice.status, TodoStatus::Complete);
        assert_eq!(for_bob.status, TodoStatus::Incomplete);
        assert_eq!(anonymous.status, TodoStatus::Incomplete);
        assert_eq!(for_bob.completion_count, 1);
    }

    #[test]
    fn ignores_rows_of_other_todos_and_orders_completers() {
        let todo = Todo::new("Mine".to_string(), None);
        let other = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let details = vec![
            detail(todo.id, second, "second@example.com", 10),
            detail(other, first, "first@example.com", 0),
            detail(todo.id, first, "first@example.com", 0),
        ];

        let view = TodoView::build(todo, &details, None);
        assert_eq!(view.completion_count, 2);
        assert_eq!(view.completed_by[0].id, first);
        assert_eq!(view.completed_by[1].id, second);
    }

    #[test]
    fn parses_status_strictly() {
        assert_eq!(TodoStatus::parse("complete").unwrap(), TodoStatus::Complete);
        assert_eq!(TodoStatus::parse(" incomplete ").unwrap(), TodoStatus::Incomplete);
        assert!(matches!(TodoStatus::parse("done"), Err(TodoError::InvalidStatus(_))));
    }

    #[test]
    fn display_time_matches_short_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 15, 7, 0).unwrap();
        assert_eq!(display_time(&at), "3:07 PM, 10/19/2026");
        let midnight = Utc.with_ymd_and_hms(2026, 1, 2, 0, 5, 0).unwrap();
        assert_eq!(display_time(&midnight), "12:05 AM, 01/02/2026");
    }

    #[test]
    fn view_serializes_in_camel_case() {
        let todo = Todo::new("Json".to_string(), None);
        let json = serde_json::to_value(TodoView::build(todo, &[], None)).unwrap();
        assert_eq!(json["status"], "incomplete");
        assert_eq!(json["completionCount"], 0);
        assert!(json["completedBy"].as_array().unwrap().is_empty());
        assert!(json.get("userId").is_some());
    }
}
