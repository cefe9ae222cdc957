use axum::extract::{Multipart, Path, Query, State, multipart::MultipartRejection};
use uuid::Uuid;

use crate::{
    AppState,
    auth::Identity,
    error::{AppError, AppResult, ApiResponse},
    guard::WriterSession,
    handlers::{JsonBody, listing, read_image, session},
    models::{
        Account, Article, ArticleChanges, ArticleContent, ArticleDetail, CreateArticleRequest,
        LoginRequest, Role, SessionToken, StoredImage, UpdateArticleRequest, WriterAccount,
    },
    pagination::{Page, PageQuery},
    repository::ArticleFilter,
    validation,
    visibility::article_not_found,
};

const WRITER_IMAGES: &str = "writers";
const ARTICLE_IMAGES: &str = "articles";

/// The article when `writer_id` owns it. Someone else's article is a 400, not a 404.
async fn owned_article(state: &AppState, writer_id: Uuid, id: Uuid) -> AppResult<ArticleDetail> {
    let detail = state.repo.find_article(id).await?.ok_or_else(|| article_not_found(id))?;
    if detail.article.writer_id != Some(writer_id) {
        return Err(AppError::forbidden("You can not access to an article that is not yours!"));
    }
    Ok(detail)
}

/// Validates and uploads the multipart `image` into `folder`.
async fn upload_image(state: &AppState, multipart: Multipart, folder: &str) -> AppResult<StoredImage> {
    let bytes = read_image(multipart).await?;
    let content_type = validation::image(&bytes)?;
    Ok(state.storage.upload(folder, bytes, content_type).await?)
}

/// Best-effort removal of a replaced image; the new one is already saved.
async fn discard_image(state: &AppState, remote_id: Option<String>) {
    if let Some(remote_id) = remote_id {
        if let Err(e) = state.storage.delete(&remote_id).await {
            tracing::warn!(%remote_id, error = %e, "failed to delete replaced image");
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/writers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = SessionToken),
        (status = 400, description = "Wrong password, banned, or already logged in"),
        (status = 404, description = "Email not found")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<ApiResponse<SessionToken>> {
    session::login(&state, &identity, Role::Writer, payload).await
}

#[utoipa::path(get, path = "/api/writers/logout", responses((status = 200, description = "Logged out")))]
pub async fn logout(State(state): State<AppState>, identity: Identity) -> AppResult<ApiResponse<()>> {
    session::logout(&state, identity).await
}

#[utoipa::path(
    get,
    path = "/api/writers/account",
    responses(
        (status = 200, description = "The logged-in writer", body = WriterAccount),
        (status = 400, description = "No writer logged in")
    )
)]
pub async fn get_account(identity: Identity) -> AppResult<ApiResponse<Account>> {
    Ok(ApiResponse::ok(session::current_account(&identity, Role::Writer)?))
}

/// update_image
///
/// [Writer Route] Replaces the profile image. Multipart field `image`, PNG or JPEG up to 2 MB.
#[utoipa::path(
    put,
    path = "/api/writers/account/image",
    request_body(content_type = "multipart/form-data", description = "Form field `image`"),
    responses(
        (status = 200, description = "Image saved", body = WriterAccount),
        (status = 400, description = "Missing, oversized or unsupported image")
    )
)]
pub async fn update_image(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<WriterAccount>> {
    let image = upload_image(&state, multipart?, WRITER_IMAGES).await?;
    let updated = state
        .repo
        .set_writer_image(writer.id, Some(image))
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account with ID: {} not found!", writer.id)))?;
    discard_image(&state, writer.image_id).await;

    Ok(ApiResponse::ok_with(updated, "Image updated successfully!"))
}

#[utoipa::path(
    delete,
    path = "/api/writers/account/image",
    responses(
        (status = 200, description = "Image removed", body = WriterAccount),
        (status = 400, description = "No profile image")
    )
)]
pub async fn delete_image(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
) -> AppResult<ApiResponse<WriterAccount>> {
    let Some(remote_id) = writer.image_id.clone() else {
        return Err(AppError::rule("You do not have a profile image!"));
    };
    state.storage.delete(&remote_id).await?;
    let updated = state
        .repo
        .set_writer_image(writer.id, None)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account with ID: {} not found!", writer.id)))?;

    Ok(ApiResponse::ok_with(updated, "Image deleted successfully!"))
}

/// create_article
///
/// [Writer Route] Publishes into the writer's own section. New articles start
/// hidden until an admin shows them.
#[utoipa::path(
    post,
    path = "/api/writers/article",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 400, description = "Missing or non-string fields")
    )
)]
pub async fn create_article(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
    JsonBody(payload): JsonBody<CreateArticleRequest>,
) -> AppResult<ApiResponse<Article>> {
    let content = ArticleContent {
        title: validation::text_field("Title", payload.title.as_ref())?,
        subtitle: validation::text_field("Subtitle", payload.subtitle.as_ref())?,
        introduction: validation::text_field("Introduction", payload.introduction.as_ref())?,
        body: validation::text_field("Body", payload.body.as_ref())?,
    };

    let article = state.repo.create_article(writer.id, writer.section_id, content).await?;
    state.cache.clear().await;

    tracing::info!(article_id = %article.id, writer_id = %writer.id, "article created");
    Ok(ApiResponse::created(article, "Article created successfully!"))
}

/// get_articles
///
/// [Writer Route] The writer's own articles, hidden ones included.
#[utoipa::path(
    get,
    path = "/api/writers/articles",
    params(PageQuery),
    responses((status = 200, description = "Own articles", body = Page<ArticleDetail>))
)]
pub async fn get_articles(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let filter = ArticleFilter::owned_by(writer.id);
    let page = listing(&query, "No articles saved in DB!", |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/writers/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article", body = ArticleDetail),
        (status = 400, description = "Not the writer's article"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
    Path(raw_id): Path<String>,
) -> AppResult<ApiResponse<ArticleDetail>> {
    let id = validation::id_param(&raw_id)?;
    Ok(ApiResponse::ok(owned_article(&state, writer.id, id).await?))
}

/// update_article
///
/// [Writer Route] Replaces any of title, subtitle, introduction and body.
#[utoipa::path(
    put,
    path = "/api/writers/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = Article),
        (status = 400, description = "Empty update or not the writer's article"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn update_article(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateArticleRequest>,
) -> AppResult<ApiResponse<Article>> {
    let id = validation::id_param(&raw_id)?;
    let changes = ArticleChanges {
        title: validation::optional_text("Title", payload.title)?,
        subtitle: validation::optional_text("Subtitle", payload.subtitle)?,
        introduction: validation::optional_text("Introduction", payload.introduction)?,
        body: validation::optional_text("Body", payload.body)?,
    };
    if changes == ArticleChanges::default() {
        return Err(AppError::validation("Nothing to update"));
    }

    owned_article(&state, writer.id, id).await?;
    let article = state
        .repo
        .update_article(id, changes)
        .await?
        .ok_or_else(|| article_not_found(id))?;
    state.cache.clear().await;

    Ok(ApiResponse::ok_with(article, "Article updated successfully!"))
}

#[utoipa::path(
    delete,
    path = "/api/writers/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted"),
        (status = 400, description = "Not the writer's article"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn delete_article(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
    Path(raw_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let id = validation::id_param(&raw_id)?;
    let detail = owned_article(&state, writer.id, id).await?;

    if !state.repo.delete_article(id).await? {
        return Err(article_not_found(id));
    }
    discard_image(&state, detail.article.photo_id).await;
    state.cache.clear().await;

    tracing::info!(article_id = %id, writer_id = %writer.id, "article deleted");
    Ok(ApiResponse::message("Article deleted successfully!"))
}

/// update_article_image
///
/// [Writer Route] Replaces the article photo. Same upload rules as the profile image.
#[utoipa::path(
    put,
    path = "/api/writers/article/{id}/image",
    params(("id" = String, Path, description = "Article id")),
    request_body(content_type = "multipart/form-data", description = "Form field `image`"),
    responses(
        (status = 200, description = "Photo saved", body = Article),
        (status = 400, description = "Bad image or not the writer's article"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn update_article_image(
    State(state): State<AppState>,
    WriterSession(writer): WriterSession,
    Path(raw_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<Article>> {
    let id = validation::id_param(&raw_id)?;
    let detail = owned_article(&state, writer.id, id).await?;

    let image = upload_image(&state, multipart?, ARTICLE_IMAGES).await?;
    let article = state
        .repo
        .set_article_photo(id, Some(image))
        .await?
        .ok_or_else(|| article_not_found(id))?;
    discard_image(&state, detail.article.photo_id).await;
    state.cache.clear().await;

    Ok(ApiResponse::ok_with(article, "Image updated successfully!"))
}
