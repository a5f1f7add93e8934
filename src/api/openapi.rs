use utoipa::OpenApi;

use crate::{
    api::models::{
        AuthenticatedUser, CreateTodoRequest, CurrentUserResponse, ErrorResponse, MagicLinkRequest, MessageResponse,
        UpdateStatusRequest, UpdateTodoRequest, VerifyTokenRequest,
    },
    core::models::todo::{Completer, TodoStatus, TodoView},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::list_todos,
        super::handlers::get_todo,
        super::handlers::create_todo,
        super::handlers::update_todo,
        super::handlers::update_todo_status,
        super::handlers::delete_todo,
        super::handlers::request_magic_link,
        super::handlers::verify_token,
        super::handlers::current_user
    ),
    components(schemas(
        CreateTodoRequest,
        UpdateTodoRequest,
        UpdateStatusRequest,
        MagicLinkRequest,
        VerifyTokenRequest,
        MessageResponse,
        AuthenticatedUser,
        CurrentUserResponse,
        ErrorResponse,
        TodoView,
        TodoStatus,
        Completer
    )),
    info(
        title = "Shared Todo API",
        description = "Shared task pool with per-user completion tracking and magic-link sign-in",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
