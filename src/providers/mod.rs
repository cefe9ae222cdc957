//! Outbound collaborators: image storage, payments, email and the feed cache.
//!
//! Each one is a `Send + Sync` trait held as `Arc<dyn ...>` in `AppState`, with a
//! real client for running the service and a mock for tests.

use thiserror::Error;

pub mod cache;
pub mod email;
pub mod payments;
pub mod storage;

pub use cache::{ArticleCache, CacheState, MokaArticleCache};
pub use email::{EmailMessage, EmailSender, MailerState, MockEmailSender, SendGridSender};
pub use payments::{MockPaymentProvider, PayPalClient, PaymentProvider, PaymentState};
pub use storage::{ImageStore, MockImageStore, S3ImageStore, StorageState};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} answered HTTP {status}: {body}")]
    Rejected {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("unexpected {provider} response: {detail}")]
    Malformed {
        provider: &'static str,
        detail: String,
    },
    #[error("object storage error: {0}")]
    Storage(String),
    #[error("simulated {0} failure")]
    Simulated(&'static str),
}

/// Turns a non-2xx response into `ProviderError::Rejected`, keeping the body for the logs.
pub(crate) async fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Rejected {
        provider,
        status: status.as_u16(),
        body,
    })
}
