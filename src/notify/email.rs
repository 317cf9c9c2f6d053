// src/notify/email.rs
use std::time::Duration;

use anyhow::{Context, Result};
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{Digest, Notifier};
use crate::config::{EmailConfig, SmtpSettings};
use crate::ingest::types::TrendItem;

/// SMTP (STARTTLS) delivery of the digest as multipart plain + HTML.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Fails on malformed addresses or SMTP host, so bad credentials config
    /// is caught before any source is fetched.
    pub fn new(email: &EmailConfig, smtp: &SmtpSettings) -> Result<Self> {
        let creds = Credentials::new(email.user.clone(), email.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .with_context(|| format!("invalid SMTP host {:?}", smtp.host))?
            .port(smtp.port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(smtp.timeout_secs)))
            .build();

        let from = email
            .user
            .parse()
            .with_context(|| format!("invalid EMAIL_USER address {:?}", email.user))?;
        let to = email
            .recipient
            .parse()
            .with_context(|| format!("invalid RECIPIENT_EMAIL address {:?}", email.recipient))?;

        Ok(Self { mailer, from, to })
    }

    fn build_message(&self, items: &[TrendItem]) -> Result<Message> {
        let digest = Digest::new(items, chrono::Local::now().date_naive());
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(digest.subject())
            .multipart(MultiPart::alternative_plain_html(
                digest.to_plain(),
                digest.to_html(),
            ))
            .context("build email")
    }

    async fn try_send(&self, items: &[TrendItem]) -> Result<()> {
        let msg = self.build_message(items)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, items: &[TrendItem]) -> bool {
        match self.try_send(items).await {
            Ok(()) => {
                tracing::info!(to = %self.to, items = items.len(), "digest email sent");
                true
            }
            Err(e) => {
                tracing::error!(to = %self.to, error = ?e, "digest email failed");
                false
            }
        }
    }
}
