mod todo_tests;

use crate::core::errors::TodoError;
use crate::core::models::{
    completion::{CompletionDetail, TodoCompletion},
    todo::Todo,
    user::User,
};
use crate::core::services::{AuthSettings, TodoService};
use crate::infrastructure::mailer::Mailer;
use crate::infrastructure::notifier::Notifier;
use crate::infrastructure::storage::{Storage, in_memory::InMemoryStorage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::yield_now;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const MAGIC_LINK_URL: &str = "http://localhost:3000/login";

/// Captures every magic link instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn last_link_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, link)| link.clone())
    }

    /// Token from the most recent link sent to `email`.
    pub async fn last_token_for(&self, email: &str) -> Option<String> {
        self.last_link_for(email)
            .await
            .and_then(|link| link.split_once("token=").map(|(_, token)| token.to_string()))
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_magic_link(&self, to: &str, link: &str) -> Result<(), TodoError> {
        if self.fail {
            return Err(TodoError::MailerError("provider unavailable".to_string()));
        }
        self.sent.lock().await.push((to.to_string(), link.to_string()));
        Ok(())
    }
}

/// Yields to the scheduler around every call, the way a database round trip
/// would, so concurrent requests interleave between storage operations.
pub struct YieldingStorage {
    inner: InMemoryStorage,
}

#[async_trait]
impl Storage for YieldingStorage {
    async fn ping(&self) -> Result<(), TodoError> {
        yield_now().await;
        self.inner.ping().await
    }

    async fn save_user(&self, user: User) -> Result<User, TodoError> {
        yield_now().await;
        let saved = self.inner.save_user(user).await;
        yield_now().await;
        saved
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, TodoError> {
        yield_now().await;
        let user = self.inner.get_user(user_id).await;
        yield_now().await;
        user
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TodoError> {
        yield_now().await;
        let user = self.inner.get_user_by_email(email).await;
        yield_now().await;
        user
    }

    async fn issue_magic_token(
        &self,
        email: &str,
        is_admin: bool,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<User, TodoError> {
        yield_now().await;
        let user = self.inner.issue_magic_token(email, is_admin, token, issued_at).await;
        yield_now().await;
        user
    }

    async fn take_user_by_magic_token(&self, token: &str) -> Result<Option<User>, TodoError> {
        yield_now().await;
        let user = self.inner.take_user_by_magic_token(token).await;
        yield_now().await;
        user
    }

    async fn save_todo(&self, todo: Todo) -> Result<Todo, TodoError> {
        yield_now().await;
        self.inner.save_todo(todo).await
    }

    async fn get_todo(&self, todo_id: Uuid) -> Result<Option<Todo>, TodoError> {
        yield_now().await;
        self.inner.get_todo(todo_id).await
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, TodoError> {
        yield_now().await;
        self.inner.list_todos().await
    }

    async fn delete_todo(&self, todo_id: Uuid) -> Result<bool, TodoError> {
        yield_now().await;
        self.inner.delete_todo(todo_id).await
    }

    async fn insert_completion(&self, completion: TodoCompletion) -> Result<bool, TodoError> {
        yield_now().await;
        self.inner.insert_completion(completion).await
    }

    async fn delete_completion(&self, user_id: Uuid, todo_id: Uuid) -> Result<bool, TodoError> {
        yield_now().await;
        self.inner.delete_completion(user_id, todo_id).await
    }

    async fn replace_completions(&self, completion: TodoCompletion) -> Result<Vec<Uuid>, TodoError> {
        yield_now().await;
        self.inner.replace_completions(completion).await
    }

    async fn list_completion_details(&self, todo_ids: &[Uuid]) -> Result<Vec<CompletionDetail>, TodoError> {
        yield_now().await;
        self.inner.list_completion_details(todo_ids).await
    }

    async fn count_user_completions(&self, user_id: Uuid) -> Result<usize, TodoError> {
        yield_now().await;
        self.inner.count_user_completions(user_id).await
    }
}

pub struct TestContext {
    pub service: Arc<TodoService>,
    pub storage: InMemoryStorage,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    /// Requests a magic link for `email` and redeems it.
    pub async fn sign_in(&self, email: &str) -> User {
        self.service.request_magic_link(Some(email)).await.unwrap();
        let token = self.mailer.last_token_for(email).await.unwrap();
        self.service.verify_magic_token(Some(&token)).await.unwrap()
    }

    pub async fn admin(&self) -> User {
        self.sign_in(ADMIN_EMAIL).await
    }
}

fn build_context(storage: InMemoryStorage, backend: Arc<dyn Storage>, mailer: RecordingMailer) -> TestContext {
    let mailer = Arc::new(mailer);
    let auth = AuthSettings {
        admin_email: Some(ADMIN_EMAIL.to_string()),
        magic_link_url: MAGIC_LINK_URL.to_string(),
    };
    let service = Arc::new(TodoService::new(backend, mailer.clone(), Notifier::new(), auth));
    TestContext {
        service,
        storage,
        mailer,
    }
}

pub fn create_test_context_with(mailer: RecordingMailer) -> TestContext {
    let storage = InMemoryStorage::new();
    build_context(storage.clone(), Arc::new(storage), mailer)
}

/// Context whose service sees storage through [`YieldingStorage`].
pub fn create_yielding_test_context() -> TestContext {
    let storage = InMemoryStorage::new();
    let backend = YieldingStorage {
        inner: storage.clone(),
    };
    build_context(storage, Arc::new(backend), RecordingMailer::default())
}

pub fn create_test_context() -> TestContext {
    create_test_context_with(RecordingMailer::default())
}
