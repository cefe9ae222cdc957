use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles & Accounts ---

/// Role
///
/// The three disjoint account variants. The serialized names are the session
/// type tags clients already rely on (`USER` for readers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "WRITER")]
    Writer,
    #[serde(rename = "USER")]
    Reader,
}

impl Role {
    /// Human label used in guard and "no account logged in" messages.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Writer => "Writer",
            Role::Reader => "User",
        }
    }
}

/// Credentials
///
/// The secret-bearing projection used only by the authenticator. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminAccount {
    pub id: Uuid,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// WriterAccount
///
/// `image_id` is the image store's handle for the profile image and stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WriterAccount {
    pub id: Uuid,
    pub email: String,
    pub image: Option<String>,
    #[serde(skip)]
    pub image_id: Option<String>,
    pub is_banned: bool,
    // Null once the owning section is deleted.
    pub section_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ReaderAccount
///
/// `is_subscriber` mirrors the owned Subscriber record's `is_active` flag and is
/// joined in on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReaderAccount {
    pub id: Uuid,
    pub email: String,
    pub is_banned: bool,
    pub is_verified: bool,
    pub is_subscriber: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Account
///
/// A resolved session identity, tagged with its role as `{type, ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Account {
    #[serde(rename = "USER")]
    Reader(ReaderAccount),
    #[serde(rename = "ADMIN")]
    Admin(AdminAccount),
    #[serde(rename = "WRITER")]
    Writer(WriterAccount),
}

impl Account {
    pub fn id(&self) -> Uuid {
        match self {
            Account::Reader(a) => a.id,
            Account::Admin(a) => a.id,
            Account::Writer(a) => a.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Reader(a) => &a.email,
            Account::Admin(a) => &a.email,
            Account::Writer(a) => &a.email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Reader(_) => Role::Reader,
            Account::Admin(_) => Role::Admin,
            Account::Writer(_) => Role::Writer,
        }
    }
}

// --- Content ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Section {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Article
///
/// `comments` and `readers` are denormalized counters maintained by atomic
/// increments in the store. `is_shown` and `for_subscribers` are moderated by admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub introduction: String,
    pub body: String,
    pub photo: Option<String>,
    #[serde(skip)]
    pub photo_id: Option<String>,
    pub comments: i32,
    pub readers: i32,
    pub for_subscribers: bool,
    pub is_shown: bool,
    pub writer_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// The owning writer as embedded in article listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleWriter {
    pub id: Uuid,
    pub email: String,
    pub is_banned: bool,
}

/// ArticleDetail
///
/// An article joined with its owning writer. `writer` is `None` when the writer
/// row no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub writer: Option<ArticleWriter>,
}

impl ArticleDetail {
    /// A missing writer counts as banned: nobody may publish under a deleted account.
    pub fn writer_banned(&self) -> bool {
        self.writer.as_ref().is_none_or(|w| w.is_banned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub reader_id: Uuid,
    pub article_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Loaded via a JOIN on reader_accounts.
    #[sqlx(default)]
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    pub id: Uuid,
    pub text: String,
    pub read: bool,
    pub reader_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Subscriber
///
/// Billing state owned 1:1 by a reader. `subscription_id` is the payment
/// provider's identifier and is empty while inactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Subscriber {
    pub id: Uuid,
    pub is_active: bool,
    pub subscription_id: String,
    pub reader_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// A file held by the image store: its public URL and the handle used to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub remote_id: String,
}

/// Validated article text, as written by the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    pub title: String,
    pub subtitle: String,
    pub introduction: String,
    pub body: String,
}

/// Partial article text update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub introduction: Option<String>,
    pub body: Option<String>,
}

// --- Request Payloads (Input Schemas) ---
//
// Fields validated by presence and type are kept as raw JSON
// values so that "missing" and "must be a string" stay distinct errors.

/// Account creation payload shared by readers and admins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(value_type = Option<String>)]
    pub email: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub password2: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWriterRequest {
    #[schema(value_type = Option<String>)]
    pub email: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub password2: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub section_id: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(value_type = Option<String>)]
    pub email: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateSectionRequest {
    #[schema(value_type = Option<String>)]
    pub name: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateArticleRequest {
    #[schema(value_type = Option<String>)]
    pub title: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub subtitle: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub introduction: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub body: Option<Value>,
}

/// UpdateArticleRequest
///
/// Partial update payload; only the provided fields are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Admin moderation of an article's visibility flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFlagsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_subscribers: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BanRequest {
    pub is_banned: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[schema(value_type = Option<String>)]
    pub article_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub text: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[schema(value_type = Option<String>)]
    pub product_id: Option<Value>,
}

// --- Responses (Output Schemas) ---

/// SessionToken
///
/// Returned by every login endpoint. Present it as `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionToken {
    pub token: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Plan {
    pub id: String,
    pub status: String,
}

/// The provider-side subscription and the URL the reader must visit to approve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubscriptionLink {
    pub subscription_id: String,
    pub approval_url: String,
}
