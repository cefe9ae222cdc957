use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, query_builder::QueryBuilder};
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

const ADMIN_COLUMNS: &str = "id, email, created_at";
const WRITER_COLUMNS: &str = "id, email, image, image_id, is_banned, section_id, created_at";
const ARTICLE_COLUMNS: &str = "id, title, subtitle, introduction, body, photo, photo_id, comments, readers, \
     for_subscribers, is_shown, writer_id, section_id, created_at, updated_at";
const SUBSCRIBER_COLUMNS: &str = "id, is_active, subscription_id, reader_id, created_at";

// Readers always carry the subscription flag of their Subscriber row.
const READER_SELECT: &str = "SELECT r.id, r.email, r.is_banned, r.is_verified, \
     COALESCE(s.is_active, false) AS is_subscriber, r.created_at \
     FROM reader_accounts r LEFT JOIN subscribers s ON s.reader_id = r.id";

const ARTICLE_SELECT: &str = "SELECT a.id, a.title, a.subtitle, a.introduction, a.body, a.photo, a.photo_id, \
     a.comments, a.readers, a.for_subscribers, a.is_shown, a.writer_id, a.section_id, a.created_at, a.updated_at, \
     w.email AS writer_email, w.is_banned AS writer_banned \
     FROM articles a LEFT JOIN writer_accounts w ON w.id = a.writer_id";

const ARTICLE_COUNT: &str =
    "SELECT COUNT(*) FROM articles a LEFT JOIN writer_accounts w ON w.id = a.writer_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.text, c.reader_id, c.article_id, c.created_at, r.email AS author_email \
     FROM comments c LEFT JOIN reader_accounts r ON r.id = c.reader_id";

/// An article row joined with the owning writer's columns.
#[derive(FromRow)]
struct ArticleRow {
    #[sqlx(flatten)]
    article: Article,
    writer_email: Option<String>,
    writer_banned: Option<bool>,
}

impl From<ArticleRow> for ArticleDetail {
    fn from(row: ArticleRow) -> Self {
        let writer = match (row.article.writer_id, row.writer_email, row.writer_banned) {
            (Some(id), Some(email), Some(is_banned)) => Some(ArticleWriter { id, email, is_banned }),
            _ => None,
        };
        ArticleDetail {
            article: row.article,
            writer,
        }
    }
}

fn account_table(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin_accounts",
        Role::Writer => "writer_accounts",
        Role::Reader => "reader_accounts",
    }
}

fn push_article_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ArticleFilter) {
    builder.push(" WHERE TRUE");
    if let Some(shown) = filter.shown {
        builder.push(" AND a.is_shown = ").push_bind(shown);
    }
    if let Some(for_subscribers) = filter.for_subscribers {
        builder.push(" AND a.for_subscribers = ").push_bind(for_subscribers);
    }
    // A NULL writer never compares equal, so a deleted writer's articles drop out too.
    if let Some(banned) = filter.writer_banned {
        builder.push(" AND w.is_banned = ").push_bind(banned);
    }
    if let Some(writer_id) = filter.writer_id {
        builder.push(" AND a.writer_id = ").push_bind(writer_id);
    }
    if let Some(section_id) = filter.section_id {
        builder.push(" AND a.section_id = ").push_bind(section_id);
    }
}

fn push_reader_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: ReaderFilter) {
    builder.push(" WHERE TRUE");
    if let Some(banned) = filter.banned {
        builder.push(" AND r.is_banned = ").push_bind(banned);
    }
    if let Some(subscriber) = filter.subscriber {
        builder.push(" AND COALESCE(s.is_active, false) = ").push_bind(subscriber);
    }
    if let Some(verified) = filter.verified {
        builder.push(" AND r.is_verified = ").push_bind(verified);
    }
}

fn push_window(builder: &mut QueryBuilder<'_, Postgres>, window: Window) {
    builder
        .push(" LIMIT ")
        .push_bind(window.limit)
        .push(" OFFSET ")
        .push_bind(window.offset);
}

fn image_parts(image: Option<StoredImage>) -> (Option<String>, Option<String>) {
    match image {
        Some(StoredImage { url, remote_id }) => (Some(url), Some(remote_id)),
        None => (None, None),
    }
}

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Dynamic filters go through
/// `QueryBuilder` so every value is bound, never interpolated.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `./migrations`.
    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn find_reader_where_id(&self, id: Uuid) -> RepoResult<Option<ReaderAccount>> {
        let reader = sqlx::query_as::<_, ReaderAccount>(&format!("{READER_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reader)
    }

    async fn update_article_returning(&self, sql: &str, id: Uuid) -> RepoResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!("{sql} WHERE id = $1 RETURNING {ARTICLE_COLUMNS}"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_credentials(&self, role: Role, email: &str) -> RepoResult<Option<Credentials>> {
        let sql = format!(
            "SELECT id, email, password_hash FROM {} WHERE LOWER(email) = LOWER($1)",
            account_table(role)
        );
        let credentials = sqlx::query_as::<_, Credentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(credentials)
    }

    async fn find_admin(&self, id: Uuid) -> RepoResult<Option<AdminAccount>> {
        let admin = sqlx::query_as::<_, AdminAccount>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn find_writer(&self, id: Uuid) -> RepoResult<Option<WriterAccount>> {
        let writer = sqlx::query_as::<_, WriterAccount>(&format!(
            "SELECT {WRITER_COLUMNS} FROM writer_accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(writer)
    }

    async fn find_reader(&self, id: Uuid) -> RepoResult<Option<ReaderAccount>> {
        self.find_reader_where_id(id).await
    }

    async fn create_admin(&self, email: &str, password_hash: &str) -> RepoResult<AdminAccount> {
        let admin = sqlx::query_as::<_, AdminAccount>(&format!(
            "INSERT INTO admin_accounts (id, email, password_hash) VALUES ($1, $2, $3) RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn create_writer(&self, email: &str, password_hash: &str, section_id: Uuid) -> RepoResult<WriterAccount> {
        let writer = sqlx::query_as::<_, WriterAccount>(&format!(
            "INSERT INTO writer_accounts (id, email, password_hash, section_id) VALUES ($1, $2, $3, $4) \
             RETURNING {WRITER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(section_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(writer)
    }

    /// create_reader
    ///
    /// Inserts the reader and its inactive Subscriber row in one transaction.
    async fn create_reader(&self, email: &str, password_hash: &str) -> RepoResult<ReaderAccount> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO reader_accounts (id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(email)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO subscribers (id, reader_id) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let reader = sqlx::query_as::<_, ReaderAccount>(&format!("{READER_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(reader)
    }

    // Subscriber, comments and notifications go with it (ON DELETE CASCADE).
    async fn delete_reader(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM reader_accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn verify_reader(&self, id: Uuid) -> RepoResult<Option<ReaderAccount>> {
        let result = sqlx::query("UPDATE reader_accounts SET is_verified = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_reader_where_id(id).await
    }

    async fn set_reader_banned(&self, id: Uuid, banned: bool) -> RepoResult<Option<ReaderAccount>> {
        let result = sqlx::query("UPDATE reader_accounts SET is_banned = $2 WHERE id = $1")
            .bind(id)
            .bind(banned)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_reader_where_id(id).await
    }

    async fn set_writer_banned(&self, id: Uuid, banned: bool) -> RepoResult<Option<WriterAccount>> {
        let writer = sqlx::query_as::<_, WriterAccount>(&format!(
            "UPDATE writer_accounts SET is_banned = $2 WHERE id = $1 RETURNING {WRITER_COLUMNS}"
        ))
        .bind(id)
        .bind(banned)
        .fetch_optional(&self.pool)
        .await?;
        Ok(writer)
    }

    async fn set_writer_image(&self, id: Uuid, image: Option<StoredImage>) -> RepoResult<Option<WriterAccount>> {
        let (url, remote_id) = image_parts(image);
        let writer = sqlx::query_as::<_, WriterAccount>(&format!(
            "UPDATE writer_accounts SET image = $2, image_id = $3 WHERE id = $1 RETURNING {WRITER_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(writer)
    }

    async fn list_writers(&self, filter: WriterFilter, window: Window) -> RepoResult<Listing<WriterAccount>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM writer_accounts WHERE TRUE");
        let mut rows = QueryBuilder::<Postgres>::new(format!("SELECT {WRITER_COLUMNS} FROM writer_accounts WHERE TRUE"));
        if let Some(banned) = filter.banned {
            count.push(" AND is_banned = ").push_bind(banned);
            rows.push(" AND is_banned = ").push_bind(banned);
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        if total == 0 {
            return Ok(Listing::empty());
        }

        rows.push(" ORDER BY created_at DESC, id DESC");
        push_window(&mut rows, window);
        let rows = rows.build_query_as::<WriterAccount>().fetch_all(&self.pool).await?;
        Ok(Listing { total, rows })
    }

    async fn list_readers(&self, filter: ReaderFilter, window: Window) -> RepoResult<Listing<ReaderAccount>> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM reader_accounts r LEFT JOIN subscribers s ON s.reader_id = r.id",
        );
        push_reader_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        if total == 0 {
            return Ok(Listing::empty());
        }

        let mut rows = QueryBuilder::<Postgres>::new(READER_SELECT);
        push_reader_filter(&mut rows, filter);
        rows.push(" ORDER BY r.created_at DESC, r.id DESC");
        push_window(&mut rows, window);
        let rows = rows.build_query_as::<ReaderAccount>().fetch_all(&self.pool).await?;
        Ok(Listing { total, rows })
    }

    /// revoke_session
    ///
    /// Records a logged-out session id until its token would have expired anyway,
    /// pruning ids that are past that point.
    async fn revoke_session(&self, session_id: Uuid, expires_at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query("DELETE FROM revoked_sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        sqlx::query("INSERT INTO revoked_sessions (id, expires_at) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(session_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_session_revoked(&self, session_id: Uuid) -> RepoResult<bool> {
        let revoked: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_sessions WHERE id = $1)")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(revoked)
    }

    async fn find_section(&self, id: Uuid) -> RepoResult<Option<Section>> {
        let section = sqlx::query_as::<_, Section>("SELECT id, name, created_at FROM sections WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(section)
    }

    async fn find_section_by_name(&self, name: &str) -> RepoResult<Option<Section>> {
        let section = sqlx::query_as::<_, Section>(
            "SELECT id, name, created_at FROM sections WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(section)
    }

    async fn create_section(&self, name: &str) -> RepoResult<Section> {
        let section = sqlx::query_as::<_, Section>(
            "INSERT INTO sections (id, name) VALUES ($1, $2) RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(section)
    }

    async fn list_sections(&self, window: Window) -> RepoResult<Listing<Section>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sections")
            .fetch_one(&self.pool)
            .await?;
        if total == 0 {
            return Ok(Listing::empty());
        }
        let rows = sqlx::query_as::<_, Section>(
            "SELECT id, name, created_at FROM sections ORDER BY name ASC LIMIT $1 OFFSET $2",
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(Listing { total, rows })
    }

    async fn create_article(&self, writer_id: Uuid, section_id: Option<Uuid>, content: ArticleContent) -> RepoResult<Article> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "INSERT INTO articles (id, title, subtitle, introduction, body, writer_id, section_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(content.title)
        .bind(content.subtitle)
        .bind(content.introduction)
        .bind(content.body)
        .bind(writer_id)
        .bind(section_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(article)
    }

    async fn find_article(&self, id: Uuid) -> RepoResult<Option<ArticleDetail>> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!("{ARTICLE_SELECT} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ArticleDetail::from))
    }

    /// update_article
    ///
    /// COALESCE keeps every column the caller did not provide.
    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> RepoResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "UPDATE articles SET title = COALESCE($2, title), subtitle = COALESCE($3, subtitle), \
             introduction = COALESCE($4, introduction), body = COALESCE($5, body), updated_at = NOW() \
             WHERE id = $1 RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.subtitle)
        .bind(changes.introduction)
        .bind(changes.body)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn set_article_flags(&self, id: Uuid, is_shown: Option<bool>, for_subscribers: Option<bool>) -> RepoResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "UPDATE articles SET is_shown = COALESCE($2, is_shown), \
             for_subscribers = COALESCE($3, for_subscribers), updated_at = NOW() \
             WHERE id = $1 RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(is_shown)
        .bind(for_subscribers)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn set_article_photo(&self, id: Uuid, photo: Option<StoredImage>) -> RepoResult<Option<Article>> {
        let (url, remote_id) = image_parts(photo);
        let article = sqlx::query_as::<_, Article>(&format!(
            "UPDATE articles SET photo = $2, photo_id = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn delete_article(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_article_readers(&self, id: Uuid) -> RepoResult<Option<Article>> {
        self.update_article_returning("UPDATE articles SET readers = readers + 1", id).await
    }

    async fn increment_article_comments(&self, id: Uuid) -> RepoResult<Option<Article>> {
        self.update_article_returning("UPDATE articles SET comments = comments + 1", id).await
    }

    async fn list_articles(&self, filter: &ArticleFilter, window: Window) -> RepoResult<Listing<ArticleDetail>> {
        let mut count = QueryBuilder::<Postgres>::new(ARTICLE_COUNT);
        push_article_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        if total == 0 {
            return Ok(Listing::empty());
        }

        let mut rows = QueryBuilder::<Postgres>::new(ARTICLE_SELECT);
        push_article_filter(&mut rows, filter);
        rows.push(match filter.order {
            ArticleOrder::Newest => " ORDER BY a.created_at DESC, a.id DESC",
            ArticleOrder::MostRead => " ORDER BY a.readers DESC, a.created_at DESC, a.id DESC",
        });
        push_window(&mut rows, window);
        let rows = rows.build_query_as::<ArticleRow>().fetch_all(&self.pool).await?;
        Ok(Listing {
            total,
            rows: rows.into_iter().map(ArticleDetail::from).collect(),
        })
    }

    async fn create_comment(&self, article_id: Uuid, reader_id: Uuid, text: &str) -> RepoResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "WITH inserted AS (\
                INSERT INTO comments (id, text, reader_id, article_id) VALUES ($1, $2, $3, $4) \
                RETURNING id, text, reader_id, article_id, created_at) \
             SELECT i.id, i.text, i.reader_id, i.article_id, i.created_at, r.email AS author_email \
             FROM inserted i LEFT JOIN reader_accounts r ON r.id = i.reader_id",
        )
        .bind(Uuid::new_v4())
        .bind(text)
        .bind(reader_id)
        .bind(article_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_comments(&self, article_id: Uuid, window: Window) -> RepoResult<Listing<Comment>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE article_id = $1")
            .bind(article_id)
            .fetch_one(&self.pool)
            .await?;
        if total == 0 {
            return Ok(Listing::empty());
        }
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.article_id = $1 ORDER BY c.created_at DESC, c.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(article_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(Listing { total, rows })
    }

    async fn create_notification(&self, reader_id: Uuid, text: &str) -> RepoResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, text, reader_id) VALUES ($1, $2, $3) \
             RETURNING id, text, read, reader_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(text)
        .bind(reader_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn list_notifications(&self, reader_id: Uuid, window: Window) -> RepoResult<Listing<Notification>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE reader_id = $1")
            .bind(reader_id)
            .fetch_one(&self.pool)
            .await?;
        if total == 0 {
            return Ok(Listing::empty());
        }
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT id, text, read, reader_id, created_at FROM notifications \
             WHERE reader_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(reader_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(Listing { total, rows })
    }

    async fn mark_notification_read(&self, id: Uuid, reader_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE notifications SET read = true WHERE id = $1 AND reader_id = $2")
            .bind(id)
            .bind(reader_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_subscriber(&self, reader_id: Uuid) -> RepoResult<Option<Subscriber>> {
        let subscriber = sqlx::query_as::<_, Subscriber>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE reader_id = $1"
        ))
        .bind(reader_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscriber)
    }

    async fn set_subscription(&self, reader_id: Uuid, active: bool, subscription_id: &str) -> RepoResult<Option<Subscriber>> {
        let subscriber = sqlx::query_as::<_, Subscriber>(&format!(
            "UPDATE subscribers SET is_active = $2, subscription_id = $3 WHERE reader_id = $1 \
             RETURNING {SUBSCRIBER_COLUMNS}"
        ))
        .bind(reader_id)
        .bind(active)
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscriber)
    }
}
