pub mod log;
pub mod resend;

use crate::core::errors::TodoError;
use async_trait::async_trait;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_magic_link(&self, to: &str, link: &str) -> Result<(), TodoError>;
}

pub const MAGIC_LINK_SUBJECT: &str = "Your Login Link for Todo App";

pub fn magic_link_html(link: &str) -> String {
    format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Login to Todo App</h2>
  <p>Click the link below to log in:</p>
  <a href="{link}" style="display: inline-block; background: #4F46E5; color: white; text-decoration: none; padding: 10px 20px; border-radius: 5px; margin: 20px 0;">Log in to Todo App</a>
  <p>This link will expire in 10 minutes and can only be used once.</p>
  <p>If you didn't request this link, you can safely ignore this email.</p>
</div>"#
    )
}
