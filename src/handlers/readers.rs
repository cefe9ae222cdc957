use axum::extract::{Path, Query, State};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    AppState,
    auth::Identity,
    error::{AppError, AppResult, ApiResponse},
    guard::ReaderSession,
    handlers::{JsonBody, listing, session},
    models::{
        Account, ArticleDetail, Comment, CreateAccountRequest, CreateCommentRequest, LoginRequest,
        Notification, ReaderAccount, Role, SessionToken, Subscriber, SubscriptionLink,
    },
    pagination::{Page, PageQuery},
    providers::EmailMessage,
    validation,
    visibility::{self, article_not_found},
};

const WELCOME_NOTIFICATION: &str = "Your account was created successfully!";
const ALREADY_SUBSCRIBED: &str = "You already have an active subscription!";

/// Query string PayPal appends to the subscription return URL.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentSuccessQuery {
    pub subscription_id: Option<String>,
}

fn account_not_found(id: impl std::fmt::Display) -> AppError {
    AppError::not_found(format!("Account with ID: {id} not found!"))
}

/// create_account
///
/// [Public Route] Registers a reader.
///
/// The reader starts unverified with an inactive subscription. A welcome
/// notification is stored and a verification link is emailed.
#[utoipa::path(
    post,
    path = "/api/users/account",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Reader created", body = ReaderAccount),
        (status = 400, description = "Invalid input or email already registered")
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateAccountRequest>,
) -> AppResult<ApiResponse<ReaderAccount>> {
    let email = validation::email(payload.email.as_ref())?;
    let password = session::new_password(payload.password.as_ref(), payload.password2.as_ref())?;
    session::ensure_email_free(&state, Role::Reader, &email).await?;

    let password_hash = state.hasher.hash(&password).await?;
    let reader = state.repo.create_reader(&email, &password_hash).await?;
    state.repo.create_notification(reader.id, WELCOME_NOTIFICATION).await?;

    let verify_url = format!(
        "{}/api/users/account/{}/verify",
        state.config.public_url.trim_end_matches('/'),
        reader.id
    );
    state
        .mailer
        .send(EmailMessage::verification(&reader.email, &verify_url))
        .await?;

    tracing::info!(reader_id = %reader.id, "reader registered");
    Ok(ApiResponse::created(reader, "Account created successfully!"))
}

/// verify_account
///
/// [Public Route] Target of the emailed verification link. Verifying twice is rejected.
#[utoipa::path(
    get,
    path = "/api/users/account/{id}/verify",
    params(("id" = String, Path, description = "Reader id")),
    responses(
        (status = 200, description = "Verified"),
        (status = 400, description = "Already verified"),
        (status = 404, description = "Unknown reader")
    )
)]
pub async fn verify_account(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let id = validation::id_param(&raw_id)?;
    let reader = state.repo.find_reader(id).await?.ok_or_else(|| account_not_found(id))?;
    if reader.is_verified {
        return Err(AppError::rule("Account already verified!"));
    }
    state.repo.verify_reader(id).await?.ok_or_else(|| account_not_found(id))?;
    Ok(ApiResponse::message("Your account is now verified!"))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = SessionToken),
        (status = 400, description = "Wrong password, unverified, banned, or already logged in"),
        (status = 404, description = "Email not found")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<ApiResponse<SessionToken>> {
    session::login(&state, &identity, Role::Reader, payload).await
}

#[utoipa::path(get, path = "/api/users/logout", responses((status = 200, description = "Logged out")))]
pub async fn logout(State(state): State<AppState>, identity: Identity) -> AppResult<ApiResponse<()>> {
    session::logout(&state, identity).await
}

#[utoipa::path(
    get,
    path = "/api/users/account",
    responses(
        (status = 200, description = "The logged-in reader", body = ReaderAccount),
        (status = 400, description = "No reader logged in")
    )
)]
pub async fn get_account(identity: Identity) -> AppResult<ApiResponse<Account>> {
    Ok(ApiResponse::ok(session::current_account(&identity, Role::Reader)?))
}

/// delete_account
///
/// [Reader Route] Deletes the reader with its subscription, comments and
/// notifications, cancelling an active subscription at the provider first.
#[utoipa::path(
    delete,
    path = "/api/users/account",
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Not a reader session")
    )
)]
pub async fn delete_account(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
    identity: Identity,
) -> AppResult<ApiResponse<()>> {
    if let Some(subscriber) = state.repo.find_subscriber(reader.id).await? {
        if subscriber.is_active && !subscriber.subscription_id.is_empty() {
            state
                .payments
                .cancel_subscription(&subscriber.subscription_id, "Account deleted")
                .await?;
        }
    }

    if !state.repo.delete_reader(reader.id).await? {
        return Err(account_not_found(reader.id));
    }
    if let Some(current) = identity.0 {
        if let (Some(session_id), Some(expires_at)) = (current.session_id, current.expires_at) {
            state.repo.revoke_session(session_id, expires_at).await?;
        }
    }

    tracing::info!(reader_id = %reader.id, "reader deleted");
    Ok(ApiResponse::message("Account deleted successfully!"))
}

/// get_article
///
/// [Reader Route] Full article detail. Hidden articles and articles of banned
/// writers read as missing; subscriber-only articles need an active subscription.
/// Every successful read increments the reader counter.
#[utoipa::path(
    get,
    path = "/api/users/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article", body = ArticleDetail),
        (status = 400, description = "Subscribers only"),
        (status = 404, description = "Unknown or hidden article")
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
    Path(raw_id): Path<String>,
) -> AppResult<ApiResponse<ArticleDetail>> {
    let id = validation::id_param(&raw_id)?;
    let detail = state.repo.find_article(id).await?.ok_or_else(|| article_not_found(id))?;
    visibility::check_reader_access(&detail, reader.is_subscriber)?;

    let article = state
        .repo
        .increment_article_readers(id)
        .await?
        .ok_or_else(|| article_not_found(id))?;
    Ok(ApiResponse::ok(ArticleDetail {
        article,
        writer: detail.writer,
    }))
}

/// create_comment
///
/// [Reader Route] Comments on an article the reader may view; bumps its comment counter.
#[utoipa::path(
    post,
    path = "/api/users/comment",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Invalid input or subscribers only"),
        (status = 404, description = "Unknown or hidden article")
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
    JsonBody(payload): JsonBody<CreateCommentRequest>,
) -> AppResult<ApiResponse<Comment>> {
    let article_id = validation::id_field("articleId", payload.article_id.as_ref())?;
    let text = validation::text_field("Text", payload.text.as_ref())?;

    let detail = state
        .repo
        .find_article(article_id)
        .await?
        .ok_or_else(|| article_not_found(article_id))?;
    visibility::check_reader_access(&detail, reader.is_subscriber)?;

    let comment = state.repo.create_comment(article_id, reader.id, &text).await?;
    state
        .repo
        .increment_article_comments(article_id)
        .await?
        .ok_or_else(|| article_not_found(article_id))?;
    Ok(ApiResponse::created(comment, "Comment created successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/users/notifications",
    params(PageQuery),
    responses((status = 200, description = "Notifications", body = Page<Notification>))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<Notification>>> {
    let page = listing(&query, "No notifications saved in DB!", |w| {
        state.repo.list_notifications(reader.id, w)
    })
    .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    put,
    path = "/api/users/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Not one of the reader's notifications")
    )
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
    Path(raw_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let id = validation::id_param(&raw_id)?;
    if !state.repo.mark_notification_read(id, reader.id).await? {
        return Err(AppError::not_found(format!("Notification with ID: {id} not found!")));
    }
    Ok(ApiResponse::message("Notification marked as read!"))
}

/// create_subscription
///
/// [Reader Route] Opens a subscription at the payment provider and returns the
/// approval link. The subscription only becomes active on the success callback.
#[utoipa::path(
    post,
    path = "/api/users/create-subscription",
    responses(
        (status = 200, description = "Approval link", body = SubscriptionLink),
        (status = 400, description = "Already subscribed")
    )
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
) -> AppResult<ApiResponse<SubscriptionLink>> {
    if reader.is_subscriber {
        return Err(AppError::rule(ALREADY_SUBSCRIBED));
    }
    let base = state.config.public_url.trim_end_matches('/');
    let link = state
        .payments
        .create_subscription(&format!("{base}/api/users/payment/success"), base)
        .await?;
    Ok(ApiResponse::ok(link))
}

/// payment_success
///
/// [Reader Route] Activates the reader's subscription with the provider's id,
/// then notifies and emails the reader.
#[utoipa::path(
    get,
    path = "/api/users/payment/success",
    params(PaymentSuccessQuery),
    responses(
        (status = 200, description = "Subscription active", body = Subscriber),
        (status = 400, description = "Missing id or already subscribed")
    )
)]
pub async fn payment_success(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
    Query(query): Query<PaymentSuccessQuery>,
) -> AppResult<ApiResponse<Subscriber>> {
    let subscription_id = query
        .subscription_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::validation("subscription_id is missing"))?;
    if reader.is_subscriber {
        return Err(AppError::rule(ALREADY_SUBSCRIBED));
    }

    let subscriber = state
        .repo
        .set_subscription(reader.id, true, &subscription_id)
        .await?
        .ok_or_else(|| account_not_found(reader.id))?;
    state
        .repo
        .create_notification(reader.id, "Your subscription is now active!")
        .await?;
    state
        .mailer
        .send(EmailMessage::subscription_thanks(&reader.email))
        .await?;

    tracing::info!(reader_id = %reader.id, "subscription activated");
    Ok(ApiResponse::ok_with(subscriber, "Subscription activated successfully!"))
}

/// cancel_subscription
///
/// [Reader Route] Cancels at the provider, then deactivates locally and notifies.
#[utoipa::path(
    post,
    path = "/api/users/cancel-subscription",
    responses(
        (status = 200, description = "Subscription cancelled", body = Subscriber),
        (status = 400, description = "No active subscription")
    )
)]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    ReaderSession(reader): ReaderSession,
) -> AppResult<ApiResponse<Subscriber>> {
    let active = state
        .repo
        .find_subscriber(reader.id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::rule("You do not have an active subscription!"))?;

    state
        .payments
        .cancel_subscription(&active.subscription_id, "Cancelled by the subscriber")
        .await?;
    let subscriber = state
        .repo
        .set_subscription(reader.id, false, "")
        .await?
        .ok_or_else(|| account_not_found(reader.id))?;
    state
        .repo
        .create_notification(reader.id, "Your subscription was cancelled!")
        .await?;

    tracing::info!(reader_id = %reader.id, "subscription cancelled");
    Ok(ApiResponse::ok_with(subscriber, "Subscription cancelled successfully!"))
}
