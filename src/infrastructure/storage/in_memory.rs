use crate::core::errors::TodoError;
use crate::core::models::{
    completion::{CompletionDetail, TodoCompletion},
    todo::Todo,
    user::User,
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    todos: HashMap<Uuid, Todo>,
    completions: Vec<TodoCompletion>,
}

/// Process-local storage. All three tables sit behind one lock so that
/// cascades and completion swaps are atomic.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completion rows across all todos.
    pub async fn completion_rows(&self) -> usize {
        self.tables.read().await.completions.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn ping(&self) -> Result<(), TodoError> {
        Ok(())
    }

    async fn save_user(&self, user: User) -> Result<User, TodoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(TodoError::EmailAlreadyRegistered(user.email));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, TodoError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TodoError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn issue_magic_token(
        &self,
        email: &str,
        is_admin: bool,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<User, TodoError> {
        let mut tables = self.tables.write().await;
        let id = tables
            .users
            .values()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .unwrap_or_else(Uuid::new_v4);
        let user = tables.users.entry(id).or_insert_with(|| {
            let mut user = User::new(email.to_string(), is_admin);
            user.id = id;
            user.created_at = issued_at;
            user
        });
        user.is_admin = is_admin;
        user.magic_token = Some(token.to_string());
        user.magic_token_created_at = Some(issued_at);
        user.updated_at = issued_at;
        Ok(user.clone())
    }

    async fn take_user_by_magic_token(&self, token: &str) -> Result<Option<User>, TodoError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables
            .users
            .values_mut()
            .find(|u| u.magic_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };
        let before = user.clone();
        user.magic_token = None;
        user.magic_token_created_at = None;
        user.updated_at = Utc::now();
        Ok(Some(before))
    }

    async fn save_todo(&self, todo: Todo) -> Result<Todo, TodoError> {
        self.tables.write().await.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn get_todo(&self, todo_id: Uuid) -> Result<Option<Todo>, TodoError> {
        Ok(self.tables.read().await.todos.get(&todo_id).cloned())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, TodoError> {
        let mut todos: Vec<Todo> = self.tables.read().await.todos.values().cloned().collect();
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    async fn delete_todo(&self, todo_id: Uuid) -> Result<bool, TodoError> {
        let mut tables = self.tables.write().await;
        let removed = tables.todos.remove(&todo_id).is_some();
        tables.completions.retain(|c| c.todo_id != todo_id);
        Ok(removed)
    }

    async fn insert_completion(&self, completion: TodoCompletion) -> Result<bool, TodoError> {
        let mut tables = self.tables.write().await;
        if !tables.todos.contains_key(&completion.todo_id) {
            return Err(TodoError::TodoNotFound(completion.todo_id.to_string()));
        }
        if tables
            .completions
            .iter()
            .any(|c| c.user_id == completion.user_id && c.todo_id == completion.todo_id)
        {
            return Ok(false);
        }
        tables.completions.push(completion);
        Ok(true)
    }

    async fn delete_completion(&self, user_id: Uuid, todo_id: Uuid) -> Result<bool, TodoError> {
        let mut tables = self.tables.write().await;
        let before = tables.completions.len();
        tables
            .completions
            .retain(|c| !(c.user_id == user_id && c.todo_id == todo_id));
        Ok(tables.completions.len() != before)
    }

    async fn replace_completions(&self, completion: TodoCompletion) -> Result<Vec<Uuid>, TodoError> {
        let mut tables = self.tables.write().await;
        if !tables.todos.contains_key(&completion.todo_id) {
            return Err(TodoError::TodoNotFound(completion.todo_id.to_string()));
        }
        let mut cleared = Vec::new();
        let mut already_complete = false;
        tables.completions.retain(|c| {
            if c.user_id != completion.user_id {
                return true;
            }
            if c.todo_id == completion.todo_id {
                already_complete = true;
                return true;
            }
            cleared.push(c.todo_id);
            false
        });
        if !already_complete {
            tables.completions.push(completion);
        }
        Ok(cleared)
    }

    async fn list_completion_details(&self, todo_ids: &[Uuid]) -> Result<Vec<CompletionDetail>, TodoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .completions
            .iter()
            .filter(|c| todo_ids.contains(&c.todo_id))
            .filter_map(|c| {
                tables.users.get(&c.user_id).map(|u| CompletionDetail {
                    todo_id: c.todo_id,
                    user_id: c.user_id,
                    email: u.email.clone(),
                    completed_at: c.completed_at,
                })
            })
            .collect())
    }

    async fn count_user_completions(&self, user_id: Uuid) -> Result<usize, TodoError> {
        Ok(self
            .tables
            .read()
            .await
            .completions
            .iter()
            .filter(|c| c.user_id == user_id)
            .count())
    }
}
