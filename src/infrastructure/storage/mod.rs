use crate::core::errors::TodoError;
use crate::core::models::{
    completion::{CompletionDetail, TodoCompletion},
    todo::Todo,
    user::User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn ping(&self) -> Result<(), TodoError>;

    /// Inserts the user, or overwrites the row with the same id.
    async fn save_user(&self, user: User) -> Result<User, TodoError>;
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, TodoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TodoError>;
    /// Finds the user by email, creating them if needed, and stores a fresh
    /// magic token in the same statement.
    async fn issue_magic_token(
        &self,
        email: &str,
        is_admin: bool,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<User, TodoError>;
    /// Clears the token and returns the user as it was before, so at most one
    /// caller ever gets a given token back.
    async fn take_user_by_magic_token(&self, token: &str) -> Result<Option<User>, TodoError>;

    /// Inserts the todo, or overwrites the row with the same id.
    async fn save_todo(&self, todo: Todo) -> Result<Todo, TodoError>;
    async fn get_todo(&self, todo_id: Uuid) -> Result<Option<Todo>, TodoError>;
    /// All todos ordered by creation time.
    async fn list_todos(&self) -> Result<Vec<Todo>, TodoError>;
    /// Deletes the todo and every completion row referencing it.
    async fn delete_todo(&self, todo_id: Uuid) -> Result<bool, TodoError>;

    /// Returns false when the `(user_id, todo_id)` row already existed.
    async fn insert_completion(&self, completion: TodoCompletion) -> Result<bool, TodoError>;
    /// Returns false when there was no row to delete.
    async fn delete_completion(&self, user_id: Uuid, todo_id: Uuid) -> Result<bool, TodoError>;
    /// Inserts the completion and removes every other completion of the same
    /// user in one atomic step. Returns the ids of the todos that lost a row.
    async fn replace_completions(&self, completion: TodoCompletion) -> Result<Vec<Uuid>, TodoError>;
    async fn list_completion_details(&self, todo_ids: &[Uuid]) -> Result<Vec<CompletionDetail>, TodoError>;
    async fn count_user_completions(&self, user_id: Uuid) -> Result<usize, TodoError>;
}

pub mod in_memory;
pub mod postgres;
