use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        AdminAccount, Article, ArticleChanges, ArticleContent, ArticleDetail, Comment, Credentials,
        Notification, ReaderAccount, Role, Section, StoredImage, Subscriber, WriterAccount,
    },
    pagination::{Listing, Window},
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// RepoError
///
/// Store failures. Absence is never an error here: lookups return `Option` and
/// deletes return whether a row was affected.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArticleOrder {
    /// `created_at` descending.
    #[default]
    Newest,
    /// `readers` descending, newest first among ties.
    MostRead,
}

/// ArticleFilter
///
/// Conjunctive article predicates. `None` leaves a field unconstrained.
/// `writer_banned: Some(false)` also excludes articles whose writer no longer exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub shown: Option<bool>,
    pub for_subscribers: Option<bool>,
    pub writer_banned: Option<bool>,
    pub writer_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
    pub order: ArticleOrder,
}

impl ArticleFilter {
    /// Every article, for admins.
    pub fn all() -> Self {
        Self::default()
    }

    /// The public listing rule: shown, with a writer who is not banned.
    pub fn public() -> Self {
        Self {
            shown: Some(true),
            writer_banned: Some(false),
            ..Self::default()
        }
    }

    pub fn most_read() -> Self {
        Self {
            order: ArticleOrder::MostRead,
            ..Self::public()
        }
    }

    pub fn public_in_section(section_id: Uuid) -> Self {
        Self {
            section_id: Some(section_id),
            ..Self::public()
        }
    }

    pub fn public_by_writer(writer_id: Uuid) -> Self {
        Self {
            writer_id: Some(writer_id),
            ..Self::public()
        }
    }

    /// Admin moderation view by `is_shown`, hiding banned writers' articles.
    pub fn by_shown(shown: bool) -> Self {
        Self {
            shown: Some(shown),
            writer_banned: Some(false),
            ..Self::default()
        }
    }

    /// Admin moderation view by `for_subscribers`, hiding banned writers' articles.
    pub fn by_audience(for_subscribers: bool) -> Self {
        Self {
            for_subscribers: Some(for_subscribers),
            writer_banned: Some(false),
            ..Self::default()
        }
    }

    /// A writer's own articles, whatever their moderation state.
    pub fn owned_by(writer_id: Uuid) -> Self {
        Self {
            writer_id: Some(writer_id),
            ..Self::default()
        }
    }

    /// In-process evaluation of the same predicates the SQL implementation pushes.
    pub fn matches(&self, detail: &ArticleDetail) -> bool {
        let article = &detail.article;
        let flag = |want: Option<bool>, have: bool| want.is_none_or(|w| w == have);
        let writer_ok = match self.writer_banned {
            None => true,
            Some(want) => detail.writer.as_ref().is_some_and(|w| w.is_banned == want),
        };
        flag(self.shown, article.is_shown)
            && flag(self.for_subscribers, article.for_subscribers)
            && writer_ok
            && self.writer_id.is_none_or(|id| article.writer_id == Some(id))
            && self.section_id.is_none_or(|id| article.section_id == Some(id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterFilter {
    pub banned: Option<bool>,
}

/// Reader filter. `subscriber` matches the joined `Subscriber.is_active` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderFilter {
    pub banned: Option<bool>,
    pub subscriber: Option<bool>,
    pub verified: Option<bool>,
}

impl ReaderFilter {
    pub fn matches(&self, reader: &ReaderAccount) -> bool {
        self.banned.is_none_or(|b| reader.is_banned == b)
            && self.subscriber.is_none_or(|s| reader.is_subscriber == s)
            && self.verified.is_none_or(|v| reader.is_verified == v)
    }
}

/// Repository Trait
///
/// The abstract contract for all persistence. Handlers depend only on this trait,
/// so the Postgres store and the in-memory store are interchangeable.
///
/// Listings return the window's rows together with the total count for the same
/// filter; the pagination engine decides what an empty window means.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    /// Email lookup is case-insensitive and scoped to the role's own table.
    async fn find_credentials(&self, role: Role, email: &str) -> RepoResult<Option<Credentials>>;
    async fn find_admin(&self, id: Uuid) -> RepoResult<Option<AdminAccount>>;
    async fn find_writer(&self, id: Uuid) -> RepoResult<Option<WriterAccount>>;
    async fn find_reader(&self, id: Uuid) -> RepoResult<Option<ReaderAccount>>;

    async fn create_admin(&self, email: &str, password_hash: &str) -> RepoResult<AdminAccount>;
    async fn create_writer(&self, email: &str, password_hash: &str, section_id: Uuid) -> RepoResult<WriterAccount>;
    /// Creates the reader unverified together with its inactive Subscriber record.
    async fn create_reader(&self, email: &str, password_hash: &str) -> RepoResult<ReaderAccount>;
    /// Removes the reader and everything it owns. Returns false when no row matched.
    async fn delete_reader(&self, id: Uuid) -> RepoResult<bool>;
    async fn verify_reader(&self, id: Uuid) -> RepoResult<Option<ReaderAccount>>;
    async fn set_reader_banned(&self, id: Uuid, banned: bool) -> RepoResult<Option<ReaderAccount>>;
    async fn set_writer_banned(&self, id: Uuid, banned: bool) -> RepoResult<Option<WriterAccount>>;
    async fn set_writer_image(&self, id: Uuid, image: Option<StoredImage>) -> RepoResult<Option<WriterAccount>>;

    async fn list_writers(&self, filter: WriterFilter, window: Window) -> RepoResult<Listing<WriterAccount>>;
    async fn list_readers(&self, filter: ReaderFilter, window: Window) -> RepoResult<Listing<ReaderAccount>>;

    // --- Sessions ---
    async fn revoke_session(&self, session_id: Uuid, expires_at: DateTime<Utc>) -> RepoResult<()>;
    async fn is_session_revoked(&self, session_id: Uuid) -> RepoResult<bool>;

    // --- Sections ---
    async fn find_section(&self, id: Uuid) -> RepoResult<Option<Section>>;
    /// Case-insensitive name match.
    async fn find_section_by_name(&self, name: &str) -> RepoResult<Option<Section>>;
    async fn create_section(&self, name: &str) -> RepoResult<Section>;
    async fn list_sections(&self, window: Window) -> RepoResult<Listing<Section>>;

    // --- Articles ---
    /// New articles start hidden, public, with zeroed counters.
    async fn create_article(&self, writer_id: Uuid, section_id: Option<Uuid>, content: ArticleContent) -> RepoResult<Article>;
    async fn find_article(&self, id: Uuid) -> RepoResult<Option<ArticleDetail>>;
    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> RepoResult<Option<Article>>;
    async fn set_article_flags(&self, id: Uuid, is_shown: Option<bool>, for_subscribers: Option<bool>) -> RepoResult<Option<Article>>;
    async fn set_article_photo(&self, id: Uuid, photo: Option<StoredImage>) -> RepoResult<Option<Article>>;
    async fn delete_article(&self, id: Uuid) -> RepoResult<bool>;
    // Atomic read-modify-write; concurrent readers never lose an increment.
    async fn increment_article_readers(&self, id: Uuid) -> RepoResult<Option<Article>>;
    async fn increment_article_comments(&self, id: Uuid) -> RepoResult<Option<Article>>;
    async fn list_articles(&self, filter: &ArticleFilter, window: Window) -> RepoResult<Listing<ArticleDetail>>;

    // --- Comments ---
    async fn create_comment(&self, article_id: Uuid, reader_id: Uuid, text: &str) -> RepoResult<Comment>;
    async fn list_comments(&self, article_id: Uuid, window: Window) -> RepoResult<Listing<Comment>>;

    // --- Notifications ---
    async fn create_notification(&self, reader_id: Uuid, text: &str) -> RepoResult<Notification>;
    async fn list_notifications(&self, reader_id: Uuid, window: Window) -> RepoResult<Listing<Notification>>;
    /// Ownership-checked: only the recipient can mark a notification as read.
    async fn mark_notification_read(&self, id: Uuid, reader_id: Uuid) -> RepoResult<bool>;

    // --- Subscribers ---
    async fn find_subscriber(&self, reader_id: Uuid) -> RepoResult<Option<Subscriber>>;
    async fn set_subscription(&self, reader_id: Uuid, active: bool, subscription_id: &str) -> RepoResult<Option<Subscriber>>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
