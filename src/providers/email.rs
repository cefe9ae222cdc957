use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

use super::{ProviderError, ensure_success};

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    /// The account verification mail sent right after a reader registers.
    pub fn verification(to: &str, verify_url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify your account".to_string(),
            html: format!(
                "<h1>Welcome!</h1><p>Confirm your email address to start reading.</p>\
                 <p><a href=\"{verify_url}\">Verify my account</a></p>"
            ),
        }
    }

    pub fn subscription_thanks(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Thanks for Subscribing!".to_string(),
            html: "<h1>Thanks for Subscribing!</h1>\
                   <p>Subscriber-only articles are now unlocked for your account.</p>"
                .to_string(),
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), ProviderError>;
}

pub type MailerState = Arc<dyn EmailSender>;

/// SendGridSender
///
/// `EmailSender` over SendGrid's v3 mail API.
#[derive(Clone)]
pub struct SendGridSender {
    http: reqwest::Client,
    api_key: String,
    sender: String,
}

impl SendGridSender {
    pub fn new(api_key: &str, sender: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            sender: sender.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for SendGridSender {
    async fn send(&self, message: EmailMessage) -> Result<(), ProviderError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.sender },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        });
        let response = self
            .http
            .post(SENDGRID_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        ensure_success("sendgrid", response).await?;
        Ok(())
    }
}

/// MockEmailSender
///
/// Keeps every message in memory instead of sending it.
#[derive(Default)]
pub struct MockEmailSender {
    pub should_fail: bool,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), ProviderError> {
        if self.should_fail {
            return Err(ProviderError::Simulated("email"));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
        Ok(())
    }
}
