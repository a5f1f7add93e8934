use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    #[serde(skip_serializing, default)]
    pub magic_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub magic_token_created_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, is_admin: bool) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email,
            is_admin,
            magic_token: None,
            magic_token_created_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Age of the outstanding magic token, if one is set.
    pub fn magic_token_age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.magic_token_created_at.map(|issued| now - issued)
    }
}
