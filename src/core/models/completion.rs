use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One user's completion of one todo. At most one row per `(user_id, todo_id)`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub todo_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

impl TodoCompletion {
    pub fn new(user_id: Uuid, todo_id: Uuid) -> Self {
        TodoCompletion {
            id: Uuid::new_v4(),
            user_id,
            todo_id,
            completed_at: Utc::now(),
        }
    }
}

/// Completion row joined with the completing user's email.
#[derive(Clone, Debug, FromRow)]
pub struct CompletionDetail {
    pub todo_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub completed_at: DateTime<Utc>,
}
