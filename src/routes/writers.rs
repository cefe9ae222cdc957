use crate::{AppState, guard, handlers::writers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};

// Above the 2 MB image rule, so oversized files get the validation message
// instead of a bare 413.
const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Writers Router Module
///
/// Mounted under `/writers`. Everything but the session endpoints requires a
/// writer session; article routes additionally check ownership in the handler.
pub fn writer_routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/login", post(writers::login))
        .route("/logout", get(writers::logout))
        .route("/account", get(writers::get_account));

    let guarded = Router::new()
        .route(
            "/account/image",
            put(writers::update_image).delete(writers::delete_image),
        )
        .route("/article", post(writers::create_article))
        .route("/articles", get(writers::get_articles))
        .route(
            "/article/{id}",
            get(writers::get_article)
                .put(writers::update_article)
                .delete(writers::delete_article),
        )
        .route("/article/{id}/image", put(writers::update_article_image))
        .route_layer(middleware::from_fn_with_state(state, guard::require_writer))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    open.merge(guarded)
}
