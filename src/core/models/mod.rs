pub mod completion;
pub mod todo;
pub mod user;
