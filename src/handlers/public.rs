use axum::extract::{Path, Query, State};
use serde_json::Value;
use std::time::Duration;

use crate::{
    AppState,
    error::{AppError, AppResult, ApiResponse},
    handlers::listing,
    models::{ArticleDetail, Comment, Section},
    pagination::{Page, PageQuery, paginate},
    providers::cache::home_feed_key,
    repository::ArticleFilter,
    validation,
    visibility::{self, article_not_found},
};

const NO_SHOWN_ARTICLES: &str = "No shown articles saved in DB!";

/// get_articles
///
/// [Public Route] The home feed: shown articles of non-banned writers, newest first.
///
/// Pages are served from the look-aside cache when present. A miss runs the
/// listing and stores the rendered page for `cache_ttl_secs`; empty and
/// out-of-range results are never cached.
#[utoipa::path(
    get,
    path = "/api/articles",
    params(PageQuery),
    responses(
        (status = 200, description = "Home feed page", body = Page<ArticleDetail>),
        (status = 404, description = "Nothing shown, or page out of range")
    )
)]
pub async fn get_articles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Value>> {
    let request = query.request()?;
    let key = home_feed_key(request.page, request.limit);

    if let Some(cached) = state.cache.get(&key).await {
        tracing::debug!(%key, "home feed served from cache");
        return Ok(ApiResponse::ok(cached));
    }

    let filter = ArticleFilter::public();
    let page = paginate(request, |window| state.repo.list_articles(&filter, window))
        .await?
        .or_not_found(NO_SHOWN_ARTICLES)?;
    let rendered = serde_json::to_value(&page).map_err(|e| AppError::upstream("home feed serialization failed", e))?;

    state
        .cache
        .set(&key, rendered.clone(), Duration::from_secs(state.config.cache_ttl_secs))
        .await;
    Ok(ApiResponse::ok(rendered))
}

/// get_last_articles
///
/// [Public Route] Shown articles, newest first, never cached.
#[utoipa::path(
    get,
    path = "/api/articles/last",
    params(PageQuery),
    responses((status = 200, description = "Latest articles", body = Page<ArticleDetail>))
)]
pub async fn get_last_articles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let filter = ArticleFilter::public();
    let page = listing(&query, NO_SHOWN_ARTICLES, |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

/// get_most_read_articles
///
/// [Public Route] Shown articles ordered by reader count, highest first.
#[utoipa::path(
    get,
    path = "/api/articles/readers",
    params(PageQuery),
    responses((status = 200, description = "Most read articles", body = Page<ArticleDetail>))
)]
pub async fn get_most_read_articles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let filter = ArticleFilter::most_read();
    let page = listing(&query, NO_SHOWN_ARTICLES, |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

/// get_section_articles
///
/// [Public Route] Shown articles of one section.
#[utoipa::path(
    get,
    path = "/api/articles/section/{id}",
    params(("id" = String, Path, description = "Section id"), PageQuery),
    responses(
        (status = 200, description = "Section feed", body = Page<ArticleDetail>),
        (status = 404, description = "Unknown section")
    )
)]
pub async fn get_section_articles(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let id = validation::id_param(&raw_id)?;
    if state.repo.find_section(id).await?.is_none() {
        return Err(AppError::not_found(format!("Section with ID: {id} not found!")));
    }
    let filter = ArticleFilter::public_in_section(id);
    let page = listing(&query, NO_SHOWN_ARTICLES, |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

/// get_writer_articles
///
/// [Public Route] Shown articles of one writer. A banned writer is rejected
/// before any article is queried.
#[utoipa::path(
    get,
    path = "/api/articles/writer/{id}",
    params(("id" = String, Path, description = "Writer id"), PageQuery),
    responses(
        (status = 200, description = "Writer feed", body = Page<ArticleDetail>),
        (status = 400, description = "Writer is banned"),
        (status = 404, description = "Unknown writer")
    )
)]
pub async fn get_writer_articles(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let id = validation::id_param(&raw_id)?;
    let writer = state
        .repo
        .find_writer(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account with ID: {id} not found!")))?;
    if writer.is_banned {
        return Err(AppError::rule("This writer is banned!"));
    }
    let filter = ArticleFilter::public_by_writer(id);
    let page = listing(&query, NO_SHOWN_ARTICLES, |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

/// get_article_comments
///
/// [Public Route] Comments of a listable article, newest first.
#[utoipa::path(
    get,
    path = "/api/articles/{id}/comments",
    params(("id" = String, Path, description = "Article id"), PageQuery),
    responses(
        (status = 200, description = "Comments", body = Page<Comment>),
        (status = 404, description = "Unknown or hidden article")
    )
)]
pub async fn get_article_comments(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<Comment>>> {
    let id = validation::id_param(&raw_id)?;
    let detail = state.repo.find_article(id).await?.ok_or_else(|| article_not_found(id))?;
    if !visibility::can_list(&detail.article, detail.writer_banned()) {
        return Err(article_not_found(id));
    }
    let page = listing(&query, "No comments saved in DB!", |w| state.repo.list_comments(id, w)).await?;
    Ok(ApiResponse::ok(page))
}

/// get_sections
///
/// [Public Route] All sections, alphabetical.
#[utoipa::path(
    get,
    path = "/api/sections",
    params(PageQuery),
    responses((status = 200, description = "Sections", body = Page<Section>))
)]
pub async fn get_sections(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<Section>>> {
    let page = listing(&query, "No sections saved in DB!", |w| state.repo.list_sections(w)).await?;
    Ok(ApiResponse::ok(page))
}
