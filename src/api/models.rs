use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::errors::TodoError;
use crate::core::models::user::User;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
    /// `complete` also records the admin's own completion.
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    /// Completing with `exclusive` clears the caller's other completions.
    #[serde(default)]
    pub exclusive: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct MagicLinkRequest {
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        AuthenticatedUser {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub completed_count: usize,
}

// Error response struct
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

// Newtype wrapper for TodoError to implement IntoResponse
pub struct ApiError(pub TodoError);

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(TodoError::MalformedBody(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self.0 {
            TodoError::MissingEmail => (StatusCode::BAD_REQUEST, "Email is required".to_string()),
            TodoError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email format".to_string()),
            TodoError::MissingToken => (StatusCode::BAD_REQUEST, "Token is required".to_string()),
            TodoError::TokenNotFound => (StatusCode::NOT_FOUND, "Invalid or expired token".to_string()),
            TodoError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired".to_string()),
            TodoError::MissingTitle => (StatusCode::BAD_REQUEST, "Title is required".to_string()),
            TodoError::MissingStatus => (StatusCode::BAD_REQUEST, "Status is required".to_string()),
            TodoError::InvalidStatus(_) => (
                StatusCode::BAD_REQUEST,
                "Status must be 'complete' or 'incomplete'".to_string(),
            ),
            TodoError::MalformedBody(detail) => {
                tracing::debug!("Rejected request body: {}", detail);
                (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
            }
            TodoError::InvalidInput(_, field) => (StatusCode::BAD_REQUEST, field.title),
            TodoError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required".to_string()),
            TodoError::InvalidUser(_) => (StatusCode::UNAUTHORIZED, "Invalid user".to_string()),
            TodoError::Forbidden => (StatusCode::FORBIDDEN, "Admin privileges required".to_string()),
            TodoError::TodoNotFound(_) => (StatusCode::NOT_FOUND, "Todo not found".to_string()),
            TodoError::EmailAlreadyRegistered(email) => {
                (StatusCode::CONFLICT, format!("Email {} already registered", email))
            }
            TodoError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            TodoError::MailerError(msg) => {
                tracing::error!("Mailer error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Error sending magic link".to_string())
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// `Json` extractor whose rejections use the same `{ message }` body as
/// every other error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
