use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// Header carrying the caller's user id. It is an opaque reference into the
/// users table, not a signed credential.
pub const USER_ID_HEADER: &str = "user-id";

/// Raw value of the `user-id` header. Resolution against storage happens in
/// the service, where reads and writes treat unknown ids differently.
#[derive(Clone, Debug, Default)]
pub struct RequesterId(pub Option<String>);

impl RequesterId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for RequesterId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(RequesterId(value))
    }
}
