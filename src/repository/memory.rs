use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ArticleFilter, ArticleOrder, ReaderFilter, RepoResult, Repository, WriterFilter,
};
use crate::{
    models::{
        AdminAccount, Article, ArticleChanges, ArticleContent, ArticleDetail, ArticleWriter,
        Comment, Credentials, Notification, ReaderAccount, Role, Section, StoredImage, Subscriber,
        WriterAccount,
    },
    pagination::{Listing, Window},
};

struct StoredAdmin {
    account: AdminAccount,
    password_hash: String,
}

struct StoredWriter {
    account: WriterAccount,
    password_hash: String,
}

struct StoredReader {
    id: Uuid,
    email: String,
    password_hash: String,
    is_banned: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    admins: Vec<StoredAdmin>,
    writers: Vec<StoredWriter>,
    readers: Vec<StoredReader>,
    subscribers: Vec<Subscriber>,
    sections: Vec<Section>,
    articles: Vec<Article>,
    comments: Vec<Comment>,
    notifications: Vec<Notification>,
    revoked: HashMap<Uuid, DateTime<Utc>>,
}

impl Tables {
    fn reader_account(&self, stored: &StoredReader) -> ReaderAccount {
        let is_subscriber = self
            .subscribers
            .iter()
            .find(|s| s.reader_id == stored.id)
            .is_some_and(|s| s.is_active);
        ReaderAccount {
            id: stored.id,
            email: stored.email.clone(),
            is_banned: stored.is_banned,
            is_verified: stored.is_verified,
            is_subscriber,
            created_at: stored.created_at,
        }
    }

    fn reader_by_id(&self, id: Uuid) -> Option<ReaderAccount> {
        self.readers
            .iter()
            .find(|r| r.id == id)
            .map(|r| self.reader_account(r))
    }

    fn article_detail(&self, article: &Article) -> ArticleDetail {
        let writer = article.writer_id.and_then(|writer_id| {
            self.writers
                .iter()
                .find(|w| w.account.id == writer_id)
                .map(|w| ArticleWriter {
                    id: w.account.id,
                    email: w.account.email.clone(),
                    is_banned: w.account.is_banned,
                })
        });
        ArticleDetail {
            article: article.clone(),
            writer,
        }
    }

    fn article_mut(&mut self, id: Uuid) -> Option<&mut Article> {
        self.articles.iter_mut().find(|a| a.id == id)
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Slices an already ordered result set the way `LIMIT/OFFSET` would.
fn window_of<T>(items: Vec<T>, window: Window) -> Listing<T> {
    let total = items.len() as i64;
    let rows = items
        .into_iter()
        .skip(usize::try_from(window.offset).unwrap_or(0))
        .take(usize::try_from(window.limit).unwrap_or(0))
        .collect();
    Listing { total, rows }
}

/// Newest first. Rows are stored in insertion order, so reversing before the
/// stable sort keeps later inserts ahead on timestamp ties.
fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.reverse();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

/// MemoryRepository
///
/// A complete in-process `Repository` used by the test suites and for running the
/// API without a database. Mirrors the Postgres semantics: per-role case-insensitive
/// email lookup and cascading reader deletes.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_credentials(&self, role: Role, email: &str) -> RepoResult<Option<Credentials>> {
        let tables = self.tables.read().await;
        let found = match role {
            Role::Admin => tables
                .admins
                .iter()
                .find(|a| eq_ignore_case(&a.account.email, email))
                .map(|a| (a.account.id, a.account.email.clone(), a.password_hash.clone())),
            Role::Writer => tables
                .writers
                .iter()
                .find(|w| eq_ignore_case(&w.account.email, email))
                .map(|w| (w.account.id, w.account.email.clone(), w.password_hash.clone())),
            Role::Reader => tables
                .readers
                .iter()
                .find(|r| eq_ignore_case(&r.email, email))
                .map(|r| (r.id, r.email.clone(), r.password_hash.clone())),
        };
        Ok(found.map(|(id, email, password_hash)| Credentials {
            id,
            email,
            password_hash,
        }))
    }

    async fn find_admin(&self, id: Uuid) -> RepoResult<Option<AdminAccount>> {
        let tables = self.tables.read().await;
        Ok(tables
            .admins
            .iter()
            .find(|a| a.account.id == id)
            .map(|a| a.account.clone()))
    }

    async fn find_writer(&self, id: Uuid) -> RepoResult<Option<WriterAccount>> {
        let tables = self.tables.read().await;
        Ok(tables
            .writers
            .iter()
            .find(|w| w.account.id == id)
            .map(|w| w.account.clone()))
    }

    async fn find_reader(&self, id: Uuid) -> RepoResult<Option<ReaderAccount>> {
        Ok(self.tables.read().await.reader_by_id(id))
    }

    async fn create_admin(&self, email: &str, password_hash: &str) -> RepoResult<AdminAccount> {
        let account = AdminAccount {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.tables.write().await.admins.push(StoredAdmin {
            account: account.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(account)
    }

    async fn create_writer(&self, email: &str, password_hash: &str, section_id: Uuid) -> RepoResult<WriterAccount> {
        let account = WriterAccount {
            id: Uuid::new_v4(),
            email: email.to_string(),
            image: None,
            image_id: None,
            is_banned: false,
            section_id: Some(section_id),
            created_at: Utc::now(),
        };
        self.tables.write().await.writers.push(StoredWriter {
            account: account.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(account)
    }

    async fn create_reader(&self, email: &str, password_hash: &str) -> RepoResult<ReaderAccount> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let id = Uuid::new_v4();
        tables.readers.push(StoredReader {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_banned: false,
            is_verified: false,
            created_at: now,
        });
        tables.subscribers.push(Subscriber {
            id: Uuid::new_v4(),
            is_active: false,
            subscription_id: String::new(),
            reader_id: id,
            created_at: now,
        });
        Ok(ReaderAccount {
            id,
            email: email.to_string(),
            is_banned: false,
            is_verified: false,
            is_subscriber: false,
            created_at: now,
        })
    }

    async fn delete_reader(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.readers.len();
        tables.readers.retain(|r| r.id != id);
        if tables.readers.len() == before {
            return Ok(false);
        }
        tables.subscribers.retain(|s| s.reader_id != id);
        tables.comments.retain(|c| c.reader_id != id);
        tables.notifications.retain(|n| n.reader_id != id);
        Ok(true)
    }

    async fn verify_reader(&self, id: Uuid) -> RepoResult<Option<ReaderAccount>> {
        let mut tables = self.tables.write().await;
        let Some(reader) = tables.readers.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        reader.is_verified = true;
        Ok(tables.reader_by_id(id))
    }

    async fn set_reader_banned(&self, id: Uuid, banned: bool) -> RepoResult<Option<ReaderAccount>> {
        let mut tables = self.tables.write().await;
        let Some(reader) = tables.readers.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        reader.is_banned = banned;
        Ok(tables.reader_by_id(id))
    }

    async fn set_writer_banned(&self, id: Uuid, banned: bool) -> RepoResult<Option<WriterAccount>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .writers
            .iter_mut()
            .find(|w| w.account.id == id)
            .map(|w| {
                w.account.is_banned = banned;
                w.account.clone()
            }))
    }

    async fn set_writer_image(&self, id: Uuid, image: Option<StoredImage>) -> RepoResult<Option<WriterAccount>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .writers
            .iter_mut()
            .find(|w| w.account.id == id)
            .map(|w| {
                let (url, remote_id) = image.map(|i| (i.url, i.remote_id)).unzip();
                w.account.image = url;
                w.account.image_id = remote_id;
                w.account.clone()
            }))
    }

    async fn list_writers(&self, filter: WriterFilter, window: Window) -> RepoResult<Listing<WriterAccount>> {
        let tables = self.tables.read().await;
        let matching: Vec<WriterAccount> = tables
            .writers
            .iter()
            .filter(|w| filter.banned.is_none_or(|b| w.account.is_banned == b))
            .map(|w| w.account.clone())
            .collect();
        Ok(window_of(newest_first(matching, |w| w.created_at), window))
    }

    async fn list_readers(&self, filter: ReaderFilter, window: Window) -> RepoResult<Listing<ReaderAccount>> {
        let tables = self.tables.read().await;
        let matching: Vec<ReaderAccount> = tables
            .readers
            .iter()
            .map(|r| tables.reader_account(r))
            .filter(|r| filter.matches(r))
            .collect();
        Ok(window_of(newest_first(matching, |r| r.created_at), window))
    }

    async fn revoke_session(&self, session_id: Uuid, expires_at: DateTime<Utc>) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        tables.revoked.retain(|_, exp| *exp >= now);
        tables.revoked.insert(session_id, expires_at);
        Ok(())
    }

    async fn is_session_revoked(&self, session_id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.read().await.revoked.contains_key(&session_id))
    }

    async fn find_section(&self, id: Uuid) -> RepoResult<Option<Section>> {
        let tables = self.tables.read().await;
        Ok(tables.sections.iter().find(|s| s.id == id).cloned())
    }

    async fn find_section_by_name(&self, name: &str) -> RepoResult<Option<Section>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sections
            .iter()
            .find(|s| eq_ignore_case(&s.name, name))
            .cloned())
    }

    async fn create_section(&self, name: &str) -> RepoResult<Section> {
        let section = Section {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.tables.write().await.sections.push(section.clone());
        Ok(section)
    }

    async fn list_sections(&self, window: Window) -> RepoResult<Listing<Section>> {
        let tables = self.tables.read().await;
        let mut sections = tables.sections.clone();
        sections.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(window_of(sections, window))
    }

    async fn create_article(&self, writer_id: Uuid, section_id: Option<Uuid>, content: ArticleContent) -> RepoResult<Article> {
        let now = Utc::now();
        let article = Article {
            id: Uuid::new_v4(),
            title: content.title,
            subtitle: content.subtitle,
            introduction: content.introduction,
            body: content.body,
            photo: None,
            photo_id: None,
            comments: 0,
            readers: 0,
            for_subscribers: false,
            is_shown: false,
            writer_id: Some(writer_id),
            section_id,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.articles.push(article.clone());
        Ok(article)
    }

    async fn find_article(&self, id: Uuid) -> RepoResult<Option<ArticleDetail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .articles
            .iter()
            .find(|a| a.id == id)
            .map(|a| tables.article_detail(a)))
    }

    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> RepoResult<Option<Article>> {
        let mut tables = self.tables.write().await;
        Ok(tables.article_mut(id).map(|article| {
            if let Some(title) = changes.title {
                article.title = title;
            }
            if let Some(subtitle) = changes.subtitle {
                article.subtitle = subtitle;
            }
            if let Some(introduction) = changes.introduction {
                article.introduction = introduction;
            }
            if let Some(body) = changes.body {
                article.body = body;
            }
            article.updated_at = Utc::now();
            article.clone()
        }))
    }

    async fn set_article_flags(&self, id: Uuid, is_shown: Option<bool>, for_subscribers: Option<bool>) -> RepoResult<Option<Article>> {
        let mut tables = self.tables.write().await;
        Ok(tables.article_mut(id).map(|article| {
            if let Some(shown) = is_shown {
                article.is_shown = shown;
            }
            if let Some(subscribers) = for_subscribers {
                article.for_subscribers = subscribers;
            }
            article.updated_at = Utc::now();
            article.clone()
        }))
    }

    async fn set_article_photo(&self, id: Uuid, photo: Option<StoredImage>) -> RepoResult<Option<Article>> {
        let mut tables = self.tables.write().await;
        Ok(tables.article_mut(id).map(|article| {
            let (url, remote_id) = photo.map(|p| (p.url, p.remote_id)).unzip();
            article.photo = url;
            article.photo_id = remote_id;
            article.updated_at = Utc::now();
            article.clone()
        }))
    }

    async fn delete_article(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.articles.len();
        tables.articles.retain(|a| a.id != id);
        if tables.articles.len() == before {
            return Ok(false);
        }
        tables.comments.retain(|c| c.article_id != id);
        Ok(true)
    }

    async fn increment_article_readers(&self, id: Uuid) -> RepoResult<Option<Article>> {
        let mut tables = self.tables.write().await;
        Ok(tables.article_mut(id).map(|article| {
            article.readers += 1;
            article.clone()
        }))
    }

    async fn increment_article_comments(&self, id: Uuid) -> RepoResult<Option<Article>> {
        let mut tables = self.tables.write().await;
        Ok(tables.article_mut(id).map(|article| {
            article.comments += 1;
            article.clone()
        }))
    }

    async fn list_articles(&self, filter: &ArticleFilter, window: Window) -> RepoResult<Listing<ArticleDetail>> {
        let tables = self.tables.read().await;
        let matching: Vec<ArticleDetail> = tables
            .articles
            .iter()
            .map(|a| tables.article_detail(a))
            .filter(|detail| filter.matches(detail))
            .collect();
        let mut ordered = newest_first(matching, |d| d.article.created_at);
        if filter.order == ArticleOrder::MostRead {
            ordered.sort_by_key(|d| std::cmp::Reverse(d.article.readers));
        }
        Ok(window_of(ordered, window))
    }

    async fn create_comment(&self, article_id: Uuid, reader_id: Uuid, text: &str) -> RepoResult<Comment> {
        let mut tables = self.tables.write().await;
        let author_email = tables
            .readers
            .iter()
            .find(|r| r.id == reader_id)
            .map(|r| r.email.clone());
        let comment = Comment {
            id: Uuid::new_v4(),
            text: text.to_string(),
            reader_id,
            article_id,
            created_at: Utc::now(),
            author_email,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, article_id: Uuid, window: Window) -> RepoResult<Listing<Comment>> {
        let tables = self.tables.read().await;
        let matching: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .collect();
        Ok(window_of(newest_first(matching, |c| c.created_at), window))
    }

    async fn create_notification(&self, reader_id: Uuid, text: &str) -> RepoResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            text: text.to_string(),
            read: false,
            reader_id,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, reader_id: Uuid, window: Window) -> RepoResult<Listing<Notification>> {
        let tables = self.tables.read().await;
        let matching: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.reader_id == reader_id)
            .cloned()
            .collect();
        Ok(window_of(newest_first(matching, |n| n.created_at), window))
    }

    async fn mark_notification_read(&self, id: Uuid, reader_id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.reader_id == reader_id)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_subscriber(&self, reader_id: Uuid) -> RepoResult<Option<Subscriber>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscribers
            .iter()
            .find(|s| s.reader_id == reader_id)
            .cloned())
    }

    async fn set_subscription(&self, reader_id: Uuid, active: bool, subscription_id: &str) -> RepoResult<Option<Subscriber>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .subscribers
            .iter_mut()
            .find(|s| s.reader_id == reader_id)
            .map(|s| {
                s.is_active = active;
                s.subscription_id = subscription_id.to_string();
                s.clone()
            }))
    }
}
