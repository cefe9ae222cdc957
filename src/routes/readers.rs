use crate::{AppState, guard, handlers::readers};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};

/// Readers Router Module
///
/// Mounted under `/users`. Registration, verification and the session endpoints
/// are open; `DELETE /account` shares its path with them and is protected by the
/// `ReaderSession` extractor instead of the route layer.
pub fn reader_routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route(
            "/account",
            post(readers::create_account)
                .get(readers::get_account)
                .delete(readers::delete_account),
        )
        .route("/account/{id}/verify", get(readers::verify_account))
        .route("/login", post(readers::login))
        .route("/logout", get(readers::logout));

    let guarded = Router::new()
        // GET /article/{id}: visibility rules apply and the reader counter is bumped.
        .route("/article/{id}", get(readers::get_article))
        .route("/comment", post(readers::create_comment))
        .route("/notifications", get(readers::get_notifications))
        .route("/notifications/{id}/read", put(readers::mark_notification_read))
        // Billing: create -> provider approval -> success callback; cancel.
        .route("/create-subscription", post(readers::create_subscription))
        .route("/payment/success", get(readers::payment_success))
        .route("/cancel-subscription", post(readers::cancel_subscription))
        .route_layer(middleware::from_fn_with_state(state, guard::require_reader));

    open.merge(guarded)
}
