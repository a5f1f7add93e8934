use crate::core::errors::TodoError;
use crate::infrastructure::mailer::{MAGIC_LINK_SUBJECT, Mailer, magic_link_html};
use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Sends magic links through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, from: impl Into<String>) -> Self {
        ResendMailer {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(name = "Sending magic link email", skip(self, link))]
    async fn send_magic_link(&self, to: &str, link: &str) -> Result<(), TodoError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [to],
            subject: MAGIC_LINK_SUBJECT,
            html: magic_link_html(link),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Email request failed: {:?}", e);
                TodoError::MailerError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "Email provider rejected message");
            return Err(TodoError::MailerError(format!("provider returned {}", status)));
        }

        tracing::info!("Magic link email accepted by provider");
        Ok(())
    }
}
