use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::MailConfig;

pub const PLAIN_TEXT_UTF8: &str = "text/plain; charset=utf-8";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        subject: &str,
        mime: &str,
        body: &str,
        recipients: &[String],
    ) -> anyhow::Result<()>;
}

/// STARTTLS relay submission with the configured account.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("sender address {}", cfg.from))?;
        let credentials = Credentials::new(cfg.login().to_owned(), cfg.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("smtp relay {}", cfg.host))?
            .port(cfg.port)
            .credentials(credentials)
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        subject: &str,
        mime: &str,
        body: &str,
        recipients: &[String],
    ) -> anyhow::Result<()> {
        let content_type = ContentType::parse(mime)
            .map_err(|e| anyhow::anyhow!("invalid content type {mime}: {e}"))?;
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(content_type);
        for rcpt in recipients {
            let mailbox = rcpt
                .parse::<Mailbox>()
                .with_context(|| format!("recipient address {rcpt}"))?;
            builder = builder.to(mailbox);
        }
        let message = builder.body(body.to_owned()).context("build message")?;
        self.transport.send(message).await.context("smtp send")?;
        debug!(recipients = recipients.len(), %subject, "mail submitted");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub subject: String,
    pub mime: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// Keeps messages in memory instead of sending them.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<SentMail>>,
}

impl Outbox {
    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(
        &self,
        subject: &str,
        mime: &str,
        body: &str,
        recipients: &[String],
    ) -> anyhow::Result<()> {
        info!(?recipients, %subject, "outbox: mail not sent");
        self.sent.lock().await.push(SentMail {
            subject: subject.to_owned(),
            mime: mime.to_owned(),
            body: body.to_owned(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outbox_records_messages() {
        let outbox = Outbox::default();
        outbox
            .send("Grocery List", PLAIN_TEXT_UTF8, "Produce\nkale\n\n", &["a@b.io".into()])
            .await
            .unwrap();
        let sent = outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["a@b.io".to_string()]);
        assert_eq!(sent[0].subject, "Grocery List");
    }

    #[test]
    fn smtp_mailer_rejects_bad_sender() {
        let cfg = MailConfig {
            from: "not an address".into(),
            ..MailConfig::default()
        };
        assert!(SmtpMailer::new(&cfg).is_err());
    }

    #[test]
    fn plain_text_content_type_parses() {
        assert!(ContentType::parse(PLAIN_TEXT_UTF8).is_ok());
    }
}
