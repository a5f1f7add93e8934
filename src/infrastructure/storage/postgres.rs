use crate::core::errors::TodoError;
use crate::core::models::{
    completion::{CompletionDetail, TodoCompletion},
    todo::Todo,
    user::User,
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, TodoError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    #[instrument(name = "Running database migrations", skip(self))]
    pub async fn migrate(&self) -> Result<(), TodoError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn log_query_error(context: &'static str) -> impl Fn(sqlx::Error) -> TodoError {
    move |e| {
        tracing::error!("{}: {:?}", context, e);
        TodoError::from(e)
    }
}

const USER_COLUMNS: &str =
    "id, email, is_admin, magic_token, magic_token_created_at, created_at, updated_at";
const TODO_COLUMNS: &str = "id, title, time, user_id, created_at, updated_at";

#[async_trait]
impl Storage for PostgresStorage {
    async fn ping(&self) -> Result<(), TodoError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(log_query_error("Database ping failed"))?;
        Ok(())
    }

    #[instrument(name = "Saving user to database", skip(self, user), fields(user_id = %user.id))]
    async fn save_user(&self, user: User) -> Result<User, TodoError> {
        let saved = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (id, email, is_admin, magic_token, magic_token_created_at, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (id) DO UPDATE SET
                   email = EXCLUDED.email,
                   is_admin = EXCLUDED.is_admin,
                   magic_token = EXCLUDED.magic_token,
                   magic_token_created_at = EXCLUDED.magic_token_created_at,
                   updated_at = EXCLUDED.updated_at
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(user.is_admin)
        .bind(&user.magic_token)
        .bind(user.magic_token_created_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                TodoError::EmailAlreadyRegistered(user.email.clone())
            }
            other => log_query_error("Failed to save user")(other),
        })?;
        Ok(saved)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, TodoError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_query_error("Failed to fetch user"))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TodoError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_query_error("Failed to fetch user by email"))
    }

    #[instrument(name = "Issuing magic token", skip(self, token))]
    async fn issue_magic_token(
        &self,
        email: &str,
        is_admin: bool,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<User, TodoError> {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (id, email, is_admin, magic_token, magic_token_created_at, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $5, $5)
               ON CONFLICT (email) DO UPDATE SET
                   is_admin = EXCLUDED.is_admin,
                   magic_token = EXCLUDED.magic_token,
                   magic_token_created_at = EXCLUDED.magic_token_created_at,
                   updated_at = EXCLUDED.updated_at
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(is_admin)
        .bind(token)
        .bind(issued_at)
        .fetch_one(&self.pool)
        .await
        .map_err(log_query_error("Failed to issue magic token"))
    }

    #[instrument(name = "Consuming magic token", skip(self, token))]
    async fn take_user_by_magic_token(&self, token: &str) -> Result<Option<User>, TodoError> {
        // The row lock makes a concurrent redeemer re-check `magic_token` and miss.
        sqlx::query_as::<_, User>(
            r#"WITH consumed AS (
                   SELECT id, magic_token, magic_token_created_at
                   FROM users
                   WHERE magic_token = $1
                   FOR UPDATE
               )
               UPDATE users u
               SET magic_token = NULL, magic_token_created_at = NULL, updated_at = NOW()
               FROM consumed
               WHERE u.id = consumed.id
               RETURNING u.id, u.email, u.is_admin, consumed.magic_token,
                         consumed.magic_token_created_at, u.created_at, u.updated_at"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_query_error("Failed to consume magic token"))
    }

    #[instrument(name = "Saving todo to database", skip(self, todo), fields(todo_id = %todo.id))]
    async fn save_todo(&self, todo: Todo) -> Result<Todo, TodoError> {
        sqlx::query_as::<_, Todo>(&format!(
            r#"INSERT INTO todos (id, title, time, user_id, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (id) DO UPDATE SET
                   title = EXCLUDED.title,
                   user_id = EXCLUDED.user_id,
                   updated_at = EXCLUDED.updated_at
               RETURNING {TODO_COLUMNS}"#
        ))
        .bind(todo.id)
        .bind(&todo.title)
        .bind(&todo.time)
        .bind(todo.user_id)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(log_query_error("Failed to save todo"))
    }

    async fn get_todo(&self, todo_id: Uuid) -> Result<Option<Todo>, TodoError> {
        sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"))
            .bind(todo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_query_error("Failed to fetch todo"))
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, TodoError> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(log_query_error("Failed to list todos"))
    }

    #[instrument(name = "Deleting todo from database", skip(self))]
    async fn delete_todo(&self, todo_id: Uuid) -> Result<bool, TodoError> {
        // completion rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(todo_id)
            .execute(&self.pool)
            .await
            .map_err(log_query_error("Failed to delete todo"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_completion(&self, completion: TodoCompletion) -> Result<bool, TodoError> {
        let result = sqlx::query(
            r#"INSERT INTO todo_completions (id, user_id, todo_id, completed_at)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (user_id, todo_id) DO NOTHING"#,
        )
        .bind(completion.id)
        .bind(completion.user_id)
        .bind(completion.todo_id)
        .bind(completion.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                TodoError::TodoNotFound(completion.todo_id.to_string())
            }
            other => log_query_error("Failed to insert completion")(other),
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_completion(&self, user_id: Uuid, todo_id: Uuid) -> Result<bool, TodoError> {
        let result = sqlx::query("DELETE FROM todo_completions WHERE user_id = $1 AND todo_id = $2")
            .bind(user_id)
            .bind(todo_id)
            .execute(&self.pool)
            .await
            .map_err(log_query_error("Failed to delete completion"))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "Replacing user completions", skip(self, completion), fields(user_id = %completion.user_id))]
    async fn replace_completions(&self, completion: TodoCompletion) -> Result<Vec<Uuid>, TodoError> {
        let mut tx = self.pool.begin().await?;

        let cleared: Vec<Uuid> = sqlx::query_scalar(
            "DELETE FROM todo_completions WHERE user_id = $1 AND todo_id <> $2 RETURNING todo_id",
        )
        .bind(completion.user_id)
        .bind(completion.todo_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(log_query_error("Failed to clear sibling completions"))?;

        sqlx::query(
            r#"INSERT INTO todo_completions (id, user_id, todo_id, completed_at)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (user_id, todo_id) DO NOTHING"#,
        )
        .bind(completion.id)
        .bind(completion.user_id)
        .bind(completion.todo_id)
        .bind(completion.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                TodoError::TodoNotFound(completion.todo_id.to_string())
            }
            other => log_query_error("Failed to insert completion")(other),
        })?;

        tx.commit().await?;
        Ok(cleared)
    }

    async fn list_completion_details(&self, todo_ids: &[Uuid]) -> Result<Vec<CompletionDetail>, TodoError> {
        sqlx::query_as::<_, CompletionDetail>(
            r#"SELECT c.todo_id, c.user_id, u.email, c.completed_at
               FROM todo_completions c
               JOIN users u ON u.id = c.user_id
               WHERE c.todo_id = ANY($1)
               ORDER BY c.completed_at"#,
        )
        .bind(todo_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(log_query_error("Failed to list completions"))
    }

    async fn count_user_completions(&self, user_id: Uuid) -> Result<usize, TodoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todo_completions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(log_query_error("Failed to count completions"))?;
        Ok(count.max(0) as usize)
    }
}
