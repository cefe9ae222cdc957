//! Runs against a real Postgres. Set DATABASE_URL and use `cargo test -- --ignored`.

use chrono::Utc;
use newsroom_api::{
    models::{ArticleChanges, ArticleContent, Role, Section, WriterAccount},
    pagination::Window,
    repository::{ArticleFilter, PostgresRepository, Repository},
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const ALL: Window = Window { offset: 0, limit: 100 };

// --- Test Context and Setup ---

struct DbTestContext {
    repo: PostgresRepository,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");
        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        let repo = PostgresRepository::new(pool);
        repo.migrate().await.expect("Failed to run database migrations.");
        DbTestContext { repo }
    }
}

// --- Test Data Helpers ---

/// Emails and section names are unique per run; the database is shared between runs.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

async fn section(repo: &PostgresRepository) -> Section {
    repo.create_section(&unique("Section")).await.unwrap()
}

async fn writer(repo: &PostgresRepository, section: &Section) -> WriterAccount {
    repo.create_writer(&format!("{}@news.com", unique("writer")), "digest", section.id)
        .await
        .unwrap()
}

fn content(title: &str) -> ArticleContent {
    ArticleContent {
        title: title.to_string(),
        subtitle: "Subtitle".to_string(),
        introduction: "Introduction".to_string(),
        body: "Body".to_string(),
    }
}

// --- Accounts ---

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_reader_lifecycle() {
    let ctx = DbTestContext::setup().await;
    let email = format!("{}@news.com", unique("reader"));

    let reader = ctx.repo.create_reader(&email, "digest").await.unwrap();
    assert!(!reader.is_verified);
    assert!(!reader.is_subscriber);

    let credentials = ctx
        .repo
        .find_credentials(Role::Reader, &email.to_uppercase())
        .await
        .unwrap()
        .expect("case-insensitive lookup");
    assert_eq!(credentials.id, reader.id);
    assert!(ctx.repo.find_credentials(Role::Writer, &email).await.unwrap().is_none());

    let verified = ctx.repo.verify_reader(reader.id).await.unwrap().unwrap();
    assert!(verified.is_verified);

    let subscriber = ctx
        .repo
        .set_subscription(reader.id, true, "I-PG")
        .await
        .unwrap()
        .unwrap();
    assert!(subscriber.is_active);
    assert!(ctx.repo.find_reader(reader.id).await.unwrap().unwrap().is_subscriber);

    ctx.repo.create_notification(reader.id, "hello").await.unwrap();
    assert!(ctx.repo.delete_reader(reader.id).await.unwrap());
    assert!(ctx.repo.find_subscriber(reader.id).await.unwrap().is_none());
    assert_eq!(ctx.repo.list_notifications(reader.id, ALL).await.unwrap().total, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_session_revocation() {
    let ctx = DbTestContext::setup().await;
    let session_id = Uuid::new_v4();

    assert!(!ctx.repo.is_session_revoked(session_id).await.unwrap());
    ctx.repo
        .revoke_session(session_id, Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();
    assert!(ctx.repo.is_session_revoked(session_id).await.unwrap());
}

// --- Articles ---

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_article_updates_and_scopes() {
    let ctx = DbTestContext::setup().await;
    let section = section(&ctx.repo).await;
    let writer = writer(&ctx.repo, &section).await;

    let article = ctx
        .repo
        .create_article(writer.id, Some(section.id), content("Draft"))
        .await
        .unwrap();
    assert!(!article.is_shown);
    assert_eq!(article.section_id, Some(section.id));

    let updated = ctx
        .repo
        .update_article(
            article.id,
            ArticleChanges {
                body: Some("New body".to_string()),
                ..ArticleChanges::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Draft");
    assert_eq!(updated.body, "New body");

    let in_section = ArticleFilter::public_in_section(section.id);
    assert_eq!(ctx.repo.list_articles(&in_section, ALL).await.unwrap().total, 0);

    ctx.repo
        .set_article_flags(article.id, Some(true), None)
        .await
        .unwrap();
    let listed = ctx.repo.list_articles(&in_section, ALL).await.unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.rows[0].writer.as_ref().map(|w| w.id), Some(writer.id));

    ctx.repo.set_writer_banned(writer.id, true).await.unwrap();
    assert_eq!(ctx.repo.list_articles(&in_section, ALL).await.unwrap().total, 0);
    assert_eq!(
        ctx.repo
            .list_articles(&ArticleFilter::owned_by(writer.id), ALL)
            .await
            .unwrap()
            .total,
        1
    );

    assert!(ctx.repo.delete_article(article.id).await.unwrap());
    assert!(ctx.repo.find_article(article.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_counters_survive_concurrent_increments() {
    let ctx = DbTestContext::setup().await;
    let section = section(&ctx.repo).await;
    let writer = writer(&ctx.repo, &section).await;
    let article = ctx
        .repo
        .create_article(writer.id, Some(section.id), content("Hot"))
        .await
        .unwrap();

    let repo = Arc::new(ctx.repo);
    let article_id = article.id;
    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.increment_article_readers(article_id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    repo.increment_article_comments(article_id).await.unwrap();

    let stored = repo.find_article(article_id).await.unwrap().unwrap();
    assert_eq!(stored.article.readers, 20);
    assert_eq!(stored.article.comments, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_section_names_ignore_case() {
    let ctx = DbTestContext::setup().await;
    let section = section(&ctx.repo).await;

    let found = ctx
        .repo
        .find_section_by_name(&section.name.to_lowercase())
        .await
        .unwrap()
        .expect("case-insensitive lookup");
    assert_eq!(found.id, section.id);
}
