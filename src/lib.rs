pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use crate::api::build_router;
pub use crate::core::errors::TodoError;
pub use crate::core::services::{AuthSettings, TodoService};
pub use crate::infrastructure::notifier::Notifier;

#[cfg(test)]
mod tests;
