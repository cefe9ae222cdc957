use crate::{AppState, handlers::public};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints open to anonymous clients. Every article listing here
/// applies the public visibility rule: shown, with a writer who is not banned.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /articles: home feed, served through the article cache.
        .route("/articles", get(public::get_articles))
        .route("/articles/last", get(public::get_last_articles))
        .route("/articles/readers", get(public::get_most_read_articles))
        .route("/articles/section/{id}", get(public::get_section_articles))
        // A banned writer is rejected before any article is read.
        .route("/articles/writer/{id}", get(public::get_writer_articles))
        .route("/articles/{id}/comments", get(public::get_article_comments))
        .route("/sections", get(public::get_sections))
}
