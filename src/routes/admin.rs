use crate::{AppState, guard, handlers::admin};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Mounted under `/admin`. The guarded group is wrapped in `require_admin`, and
/// each handler also takes the `AdminSession` extractor.
///
/// `POST /account` stays open so the first admin can be created on a fresh install.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/account", post(admin::create_account).get(admin::get_account))
        .route("/login", post(admin::login))
        .route("/logout", get(admin::logout));

    let guarded = Router::new()
        .route("/writer/account", post(admin::create_writer))
        .route("/section", post(admin::create_section))
        .route("/sections", get(admin::get_sections))
        // Writers
        .route("/writers", get(admin::get_writers))
        .route("/writers/banned/{banned}", get(admin::get_writers_by_ban))
        .route("/writer/{id}/ban", put(admin::ban_writer))
        // Readers
        .route("/users", get(admin::get_users))
        .route("/users/filter", get(admin::filter_users))
        .route("/user/{id}/ban", put(admin::ban_user))
        // Articles: moderation views and the isShown / forSubscribers switch.
        .route("/articles", get(admin::get_articles))
        .route("/articles/shown/{shown}", get(admin::get_articles_by_shown))
        .route(
            "/articles/subscribers/{subscribers}",
            get(admin::get_articles_by_subscribers),
        )
        .route("/article/{id}", put(admin::update_article_flags))
        // Billing setup at the payment provider.
        .route("/create-product", post(admin::create_product))
        .route("/create-plan", post(admin::create_plan))
        .route_layer(middleware::from_fn_with_state(state, guard::require_admin));

    open.merge(guarded)
}
