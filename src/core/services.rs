use crate::core::errors::{FieldError, TodoError};
use crate::core::models::{
    completion::TodoCompletion,
    todo::{Todo, TodoStatus, TodoView},
    user::User,
};
use crate::infrastructure::mailer::Mailer;
use crate::infrastructure::notifier::{Notifier, TodoEventKind};
use crate::infrastructure::storage::Storage;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const MAGIC_TOKEN_TTL_MINUTES: i64 = 10;
pub const MAX_TITLE_LENGTH: usize = 255;

#[derive(Clone, Debug, Default)]
pub struct AuthSettings {
    pub admin_email: Option<String>,
    pub magic_link_url: String,
}

impl AuthSettings {
    fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

pub struct TodoService {
    storage: Arc<dyn Storage>,
    mailer: Arc<dyn Mailer>,
    notifier: Notifier,
    auth: AuthSettings,
}

impl TodoService {
    pub fn new(storage: Arc<dyn Storage>, mailer: Arc<dyn Mailer>, notifier: Notifier, auth: AuthSettings) -> Self {
        TodoService {
            storage,
            mailer,
            notifier,
            auth,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn health(&self) -> Result<(), TodoError> {
        self.storage.ping().await
    }

    // IDENTITY

    /// Resolves the `user-id` header for read paths. Anything that does not
    /// name an existing user is treated as anonymous.
    async fn resolve_requester(&self, requester: Option<&str>) -> Result<Option<User>, TodoError> {
        match self.require_user(requester).await {
            Ok(user) => Ok(Some(user)),
            Err(TodoError::Unauthenticated) => Ok(None),
            Err(TodoError::InvalidUser(id)) => {
                warn!("Ignoring unknown requester {} on read", id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn require_user(&self, requester: Option<&str>) -> Result<User, TodoError> {
        let raw = requester
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(TodoError::Unauthenticated)?;
        let user_id = Uuid::parse_str(raw).map_err(|_| TodoError::InvalidUser(raw.to_string()))?;
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| TodoError::InvalidUser(raw.to_string()))
    }

    pub async fn require_admin(&self, requester: Option<&str>) -> Result<User, TodoError> {
        let user = self.require_user(requester).await?;
        if !user.is_admin {
            warn!("User {} attempted an admin operation", user.id);
            return Err(TodoError::Forbidden);
        }
        Ok(user)
    }

    // VALIDATION

    fn parse_todo_id(id: &str) -> Result<Uuid, TodoError> {
        Uuid::parse_str(id.trim()).map_err(|_| TodoError::TodoNotFound(id.to_string()))
    }

    fn parse_status(status: Option<&str>) -> Result<Option<TodoStatus>, TodoError> {
        status.map(TodoStatus::parse).transpose()
    }

    fn validate_title(title: &str) -> Result<String, TodoError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::MissingTitle);
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(TodoError::InvalidInput(
                "title".to_string(),
                FieldError {
                    field: "title".to_string(),
                    title: "Title is too long".to_string(),
                    description: format!("title must be at most {} characters", MAX_TITLE_LENGTH),
                },
            ));
        }
        Ok(title.to_string())
    }

    fn validate_email(email: &str) -> Result<String, TodoError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(TodoError::MissingEmail);
        }
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(TodoError::InvalidEmail(email));
        }
        Ok(email)
    }

    async fn load_todo(&self, todo_id: Uuid) -> Result<Todo, TodoError> {
        self.storage
            .get_todo(todo_id)
            .await?
            .ok_or_else(|| TodoError::TodoNotFound(todo_id.to_string()))
    }

    async fn view(&self, todo: Todo, requester: Option<Uuid>) -> Result<TodoView, TodoError> {
        let details = self.storage.list_completion_details(&[todo.id]).await?;
        Ok(TodoView::build(todo, &details, requester))
    }

    /// Applies one user's completion state to a todo. Returns the ids of other
    /// todos whose completion was dropped by an exclusive completion.
    async fn apply_completion(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        status: TodoStatus,
        exclusive: bool,
    ) -> Result<Vec<Uuid>, TodoError> {
        match status {
            TodoStatus::Complete if exclusive => {
                let cleared = self
                    .storage
                    .replace_completions(TodoCompletion::new(user_id, todo_id))
                    .await?;
                info!("User {} completed todo {} exclusively, cleared {:?}", user_id, todo_id, cleared);
                Ok(cleared)
            }
            TodoStatus::Complete => {
                if !self.storage.insert_completion(TodoCompletion::new(user_id, todo_id)).await? {
                    info!("Todo {} already complete for user {}", todo_id, user_id);
                }
                Ok(Vec::new())
            }
            TodoStatus::Incomplete => {
                if !self.storage.delete_completion(user_id, todo_id).await? {
                    info!("Todo {} was not complete for user {}", todo_id, user_id);
                }
                Ok(Vec::new())
            }
        }
    }

    // TODOS

    #[instrument(skip(self))]
    pub async fn list_todos(&self, requester: Option<&str>) -> Result<Vec<TodoView>, TodoError> {
        let requester = self.resolve_requester(requester).await?.map(|u| u.id);
        let todos = self.storage.list_todos().await?;
        let ids: Vec<Uuid> = todos.iter().map(|t| t.id).collect();
        let details = self.storage.list_completion_details(&ids).await?;
        Ok(todos
            .into_iter()
            .map(|todo| TodoView::build(todo, &details, requester))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_todo(&self, requester: Option<&str>, todo_id: &str) -> Result<TodoView, TodoError> {
        let requester = self.resolve_requester(requester).await?.map(|u| u.id);
        let todo = self.load_todo(Self::parse_todo_id(todo_id)?).await?;
        self.view(todo, requester).await
    }

    #[instrument(skip(self))]
    pub async fn create_todo(
        &self,
        requester: Option<&str>,
        title: Option<&str>,
        status: Option<&str>,
    ) -> Result<TodoView, TodoError> {
        let admin = self.require_admin(requester).await?;
        let title = Self::validate_title(title.unwrap_or_default())?;
        let status = Self::parse_status(status)?;

        let todo = self.storage.save_todo(Todo::new(title, None)).await?;
        info!("Admin {} created todo {}", admin.id, todo.id);
        if let Some(status) = status {
            self.apply_completion(admin.id, todo.id, status, false).await?;
        }

        let view = self.view(todo, Some(admin.id)).await?;
        self.notifier.publish(TodoEventKind::Created, view.clone());
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn update_todo(
        &self,
        requester: Option<&str>,
        todo_id: &str,
        title: Option<&str>,
        status: Option<&str>,
    ) -> Result<TodoView, TodoError> {
        let admin = self.require_admin(requester).await?;
        let todo_id = Self::parse_todo_id(todo_id)?;
        let status = Self::parse_status(status)?;
        let new_title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(Self::validate_title(t)?),
            None => None,
        };

        let mut todo = self.load_todo(todo_id).await?;
        if let Some(title) = new_title {
            todo.title = title;
            todo.updated_at = Utc::now();
            todo = self.storage.save_todo(todo).await?;
        }
        if let Some(status) = status {
            self.apply_completion(admin.id, todo.id, status, false).await?;
        }
        info!("Admin {} updated todo {}", admin.id, todo.id);

        let view = self.view(todo, Some(admin.id)).await?;
        self.notifier.publish(TodoEventKind::Updated, view.clone());
        Ok(view)
    }

    /// Marks a todo complete or incomplete for the requesting user. The
    /// returned `status` reflects that user's own completion row.
    #[instrument(skip(self))]
    pub async fn set_completion(
        &self,
        requester: Option<&str>,
        todo_id: &str,
        status: Option<&str>,
        exclusive: bool,
    ) -> Result<TodoView, TodoError> {
        let user = self.require_user(requester).await?;
        let status = Self::parse_status(status)?.ok_or(TodoError::MissingStatus)?;
        let todo = self.load_todo(Self::parse_todo_id(todo_id)?).await?;

        let cleared = self.apply_completion(user.id, todo.id, status, exclusive).await?;

        let view = self.view(todo, Some(user.id)).await?;
        self.notifier.publish(TodoEventKind::Updated, view.clone());

        for sibling_id in cleared {
            match self.storage.get_todo(sibling_id).await? {
                Some(sibling) => {
                    let sibling_view = self.view(sibling, Some(user.id)).await?;
                    self.notifier.publish(TodoEventKind::Updated, sibling_view);
                }
                None => warn!("Cleared completion for vanished todo {}", sibling_id),
            }
        }

        Ok(view)
    }

    /// Deletes a todo with all of its completion rows and returns the todo as
    /// it was just before deletion.
    #[instrument(skip(self))]
    pub async fn delete_todo(&self, requester: Option<&str>, todo_id: &str) -> Result<TodoView, TodoError> {
        let admin = self.require_admin(requester).await?;
        let todo = self.load_todo(Self::parse_todo_id(todo_id)?).await?;
        let snapshot = self.view(todo, Some(admin.id)).await?;

        if !self.storage.delete_todo(snapshot.id).await? {
            return Err(TodoError::TodoNotFound(snapshot.id.to_string()));
        }
        info!("Admin {} deleted todo {}", admin.id, snapshot.id);

        self.notifier.publish(TodoEventKind::Deleted, snapshot.clone());
        Ok(snapshot)
    }

    // AUTH

    /// Finds or creates the user, rotates their magic token and mails the link.
    #[instrument(skip(self, email))]
    pub async fn request_magic_link(&self, email: Option<&str>) -> Result<(), TodoError> {
        let email = Self::validate_email(email.unwrap_or_default())?;
        let is_admin = self.auth.is_admin_email(&email);
        let token = Uuid::new_v4().to_string();

        let user = self
            .storage
            .issue_magic_token(&email, is_admin, &token, Utc::now())
            .await?;

        let link = format!("{}?token={}", self.auth.magic_link_url, token);
        self.mailer.send_magic_link(&user.email, &link).await?;
        info!("Magic link issued for user {} ({})", user.id, user.email);
        Ok(())
    }

    /// Consumes a magic token. Tokens are single use and valid for ten minutes.
    #[instrument(skip(self, token))]
    pub async fn verify_magic_token(&self, token: Option<&str>) -> Result<User, TodoError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TodoError::MissingToken)?;

        let mut user = self
            .storage
            .take_user_by_magic_token(token)
            .await?
            .ok_or(TodoError::TokenNotFound)?;

        let expired = user
            .magic_token_age(Utc::now())
            .is_none_or(|age| age > Duration::minutes(MAGIC_TOKEN_TTL_MINUTES));
        user.magic_token = None;
        user.magic_token_created_at = None;

        if expired {
            warn!("Expired magic token presented for user {}", user.id);
            return Err(TodoError::TokenExpired);
        }
        info!("User {} signed in", user.id);
        Ok(user)
    }

    /// Returns the requesting user and how many todos they have completed.
    pub async fn current_user(&self, requester: Option<&str>) -> Result<(User, usize), TodoError> {
        let user = self.require_user(requester).await?;
        let completed = self.storage.count_user_completions(user.id).await?;
        Ok((user, completed))
    }
}
