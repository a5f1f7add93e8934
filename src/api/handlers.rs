use crate::{
    api::{events::todo_events, identity::RequesterId, models::*},
    core::{models::todo::TodoView, services::TodoService},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use std::sync::Arc;

// Define API routes
pub fn api_routes(service: Arc<TodoService>) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/todos/{id}/status", patch(update_todo_status))
        .route("/auth/magic-link", post(request_magic_link))
        .route("/auth/verify-token", post(verify_token))
        .route("/auth/me", get(current_user))
        .route("/events", get(todo_events))
        .with_state(service)
}

#[utoipa::path(
    get,
    path = "/api/todos",
    params(
        ("user-id" = Option<String>, Header, description = "Caller id; decides the per-caller status")
    ),
    responses(
        (status = 200, description = "All todos, oldest first", body = [TodoView]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_todos(
    State(service): State<Arc<TodoService>>,
    requester: RequesterId,
) -> Result<Json<Vec<TodoView>>, ApiError> {
    let todos = service.list_todos(requester.as_deref()).await?;
    Ok(Json(todos))
}

#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    params(
        ("id" = String, Path, description = "ID of the todo"),
        ("user-id" = Option<String>, Header, description = "Caller id; decides the per-caller status")
    ),
    responses(
        (status = 200, description = "Todo retrieved successfully", body = TodoView),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_todo(
    State(service): State<Arc<TodoService>>,
    requester: RequesterId,
    Path(id): Path<String>,
) -> Result<Json<TodoView>, ApiError> {
    let todo = service.get_todo(requester.as_deref(), &id).await?;
    Ok(Json(todo))
}

#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodoRequest,
    params(
        ("user-id" = String, Header, description = "Admin user id")
    ),
    responses(
        (status = 201, description = "Todo created successfully", body = TodoView),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Missing or unknown user", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_todo(
    State(service): State<Arc<TodoService>>,
    requester: RequesterId,
    JsonBody(req): JsonBody<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoView>), ApiError> {
    let todo = service
        .create_todo(requester.as_deref(), req.title.as_deref(), req.status.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    request_body = UpdateTodoRequest,
    params(
        ("id" = String, Path, description = "ID of the todo to update"),
        ("user-id" = String, Header, description = "Admin user id")
    ),
    responses(
        (status = 200, description = "Todo updated successfully", body = TodoView),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Missing or unknown user", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_todo(
    State(service): State<Arc<TodoService>>,
    requester: RequesterId,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTodoRequest>,
) -> Result<Json<TodoView>, ApiError> {
    let todo = service
        .update_todo(requester.as_deref(), &id, req.title.as_deref(), req.status.as_deref())
        .await?;
    Ok(Json(todo))
}

#[utoipa::path(
    patch,
    path = "/api/todos/{id}/status",
    request_body = UpdateStatusRequest,
    params(
        ("id" = String, Path, description = "ID of the todo"),
        ("user-id" = String, Header, description = "Caller id")
    ),
    responses(
        (status = 200, description = "Completion state updated; status is the caller's own", body = TodoView),
        (status = 400, description = "Missing or invalid status", body = ErrorResponse),
        (status = 401, description = "Missing or unknown user", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_todo_status(
    State(service): State<Arc<TodoService>>,
    requester: RequesterId,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<Json<TodoView>, ApiError> {
    let todo = service
        .set_completion(requester.as_deref(), &id, req.status.as_deref(), req.exclusive)
        .await?;
    Ok(Json(todo))
}

#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    params(
        ("id" = String, Path, description = "ID of the todo to delete"),
        ("user-id" = String, Header, description = "Admin user id")
    ),
    responses(
        (status = 200, description = "Todo deleted successfully", body = MessageResponse),
        (status = 401, description = "Missing or unknown user", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_todo(
    State(service): State<Arc<TodoService>>,
    requester: RequesterId,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    service.delete_todo(requester.as_deref(), &id).await?;
    Ok(Json(MessageResponse::new("Todo deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/auth/magic-link",
    request_body = MagicLinkRequest,
    responses(
        (status = 200, description = "Magic link sent", body = MessageResponse),
        (status = 400, description = "Missing or invalid email", body = ErrorResponse),
        (status = 500, description = "Error sending magic link", body = ErrorResponse)
    )
)]
pub async fn request_magic_link(
    State(service): State<Arc<TodoService>>,
    JsonBody(req): JsonBody<MagicLinkRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    service.request_magic_link(req.email.as_deref()).await?;
    Ok(Json(MessageResponse::new("Magic link sent to your email")))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-token",
    request_body = VerifyTokenRequest,
    responses(
        (status = 200, description = "Token accepted", body = AuthenticatedUser),
        (status = 400, description = "Token is required", body = ErrorResponse),
        (status = 401, description = "Token has expired", body = ErrorResponse),
        (status = 404, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn verify_token(
    State(service): State<Arc<TodoService>>,
    JsonBody(req): JsonBody<VerifyTokenRequest>,
) -> Result<Json<AuthenticatedUser>, ApiError> {
    let user = service.verify_magic_token(req.token.as_deref()).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    params(
        ("user-id" = String, Header, description = "Caller id")
    ),
    responses(
        (status = 200, description = "Caller profile", body = CurrentUserResponse),
        (status = 401, description = "Missing or unknown user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn current_user(
    State(service): State<Arc<TodoService>>,
    requester: RequesterId,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let (user, completed_count) = service.current_user(requester.as_deref()).await?;
    Ok(Json(CurrentUserResponse {
        id: user.id,
        email: user.email,
        is_admin: user.is_admin,
        completed_count,
    }))
}
