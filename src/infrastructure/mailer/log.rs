use crate::core::errors::TodoError;
use crate::infrastructure::mailer::Mailer;
use async_trait::async_trait;

/// Writes magic links to the log instead of sending them. Used when no
/// email provider is configured.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_magic_link(&self, to: &str, link: &str) -> Result<(), TodoError> {
        tracing::info!(recipient = %to, %link, "Magic link issued (email delivery disabled)");
        Ok(())
    }
}
