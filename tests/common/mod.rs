#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use newsroom_api::{
    AppConfig, AppState, Argon2Hasher, MemoryRepository, auth, create_router,
    models::{Article, ArticleContent, ReaderAccount, Section, WriterAccount},
    password::PasswordHasher,
    providers::{MockEmailSender, MockImageStore, MockPaymentProvider, MokaArticleCache},
    repository::Repository,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "Secret#123";

/// The full router over an in-memory store and recording mocks. The handles are
/// kept so tests can seed data and inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<MemoryRepository>,
    pub storage: Arc<MockImageStore>,
    pub payments: Arc<MockPaymentProvider>,
    pub mailer: Arc<MockEmailSender>,
    pub hasher: Arc<Argon2Hasher>,
    pub config: AppConfig,
}

pub fn cheap_hasher() -> Argon2Hasher {
    Argon2Hasher::with_params(8, 1, 1).expect("valid argon2 params")
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_collaborators(MockImageStore::new(), MockPaymentProvider::new(), MockEmailSender::new())
    }

    pub fn with_collaborators(
        storage: MockImageStore,
        payments: MockPaymentProvider,
        mailer: MockEmailSender,
    ) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let storage = Arc::new(storage);
        let payments = Arc::new(payments);
        let mailer = Arc::new(mailer);
        let hasher = Arc::new(cheap_hasher());
        let config = AppConfig::default();

        let state = AppState {
            repo: repo.clone(),
            storage: storage.clone(),
            payments: payments.clone(),
            mailer: mailer.clone(),
            cache: Arc::new(MokaArticleCache::new(100)),
            hasher: hasher.clone(),
            config: config.clone(),
        };

        Self {
            router: create_router(state.clone()),
            state,
            repo,
            storage,
            payments,
            mailer,
            hasher,
            config,
        }
    }

    /// A signed session token for any account id.
    pub fn token_for(&self, account_id: Uuid) -> String {
        auth::issue_session(&self.config, account_id)
            .expect("token signing")
            .token
    }

    pub async fn hash(&self, password: &str) -> String {
        self.hasher.hash(password).await.expect("hash")
    }

    // --- Seeding ---

    pub async fn seed_admin(&self, email: &str) -> Uuid {
        let hash = self.hash(PASSWORD).await;
        self.repo.create_admin(email, &hash).await.expect("admin").id
    }

    pub async fn seed_section(&self, name: &str) -> Section {
        self.repo.create_section(name).await.expect("section")
    }

    pub async fn seed_writer(&self, email: &str, section_id: Uuid) -> WriterAccount {
        let hash = self.hash(PASSWORD).await;
        self.repo
            .create_writer(email, &hash, section_id)
            .await
            .expect("writer")
    }

    /// A verified reader, optionally with an active subscription.
    pub async fn seed_reader(&self, email: &str, subscriber: bool) -> ReaderAccount {
        let hash = self.hash(PASSWORD).await;
        let reader = self.repo.create_reader(email, &hash).await.expect("reader");
        self.repo.verify_reader(reader.id).await.expect("verify");
        if subscriber {
            self.repo
                .set_subscription(reader.id, true, "I-SEEDED")
                .await
                .expect("subscribe");
        }
        self.repo
            .find_reader(reader.id)
            .await
            .expect("reload")
            .expect("reader exists")
    }

    pub async fn seed_article(
        &self,
        writer: &WriterAccount,
        title: &str,
        shown: bool,
        for_subscribers: bool,
    ) -> Article {
        let content = ArticleContent {
            title: title.to_string(),
            subtitle: format!("{title} subtitle"),
            introduction: format!("{title} introduction"),
            body: format!("{title} body"),
        };
        let article = self
            .repo
            .create_article(writer.id, writer.section_id, content)
            .await
            .expect("article");
        self.repo
            .set_article_flags(article.id, Some(shown), Some(for_subscribers))
            .await
            .expect("flags")
            .expect("article exists")
    }

    // --- Requests ---

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, token, None).await
    }
}

/// A multipart body with a single `image` part.
pub fn multipart_image(bytes: &[u8], file_name: &str, content_type: &str) -> (String, Vec<u8>) {
    multipart_field("image", bytes, file_name, content_type)
}

/// A multipart body with one file part named `name`.
pub fn multipart_field(name: &str, bytes: &[u8], file_name: &str, content_type: &str) -> (String, Vec<u8>) {
    let boundary = "newsroom-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
