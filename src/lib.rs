use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Sessions and role gating.
pub mod auth;
pub mod guard;
pub mod password;

// Request handling and the response envelope.
pub mod error;
pub mod handlers;
pub mod validation;

// Domain rules shared by the handlers.
pub mod models;
pub mod pagination;
pub mod visibility;

// Persistence and third-party collaborators.
pub mod config;
pub mod providers;
pub mod repository;

// Routers, split by audience.
pub mod routes;
use routes::{admin, public, readers, writers};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use password::{Argon2Hasher, HasherState};
pub use providers::{CacheState, MailerState, PaymentState, StorageState};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document aggregated from every `#[utoipa::path]` handler, served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::public::get_articles, handlers::public::get_last_articles,
        handlers::public::get_most_read_articles, handlers::public::get_section_articles,
        handlers::public::get_writer_articles, handlers::public::get_article_comments,
        handlers::public::get_sections,
        handlers::readers::create_account, handlers::readers::verify_account,
        handlers::readers::login, handlers::readers::logout, handlers::readers::get_account,
        handlers::readers::delete_account, handlers::readers::get_article,
        handlers::readers::create_comment, handlers::readers::get_notifications,
        handlers::readers::mark_notification_read, handlers::readers::create_subscription,
        handlers::readers::payment_success, handlers::readers::cancel_subscription,
        handlers::writers::login, handlers::writers::logout, handlers::writers::get_account,
        handlers::writers::update_image, handlers::writers::delete_image,
        handlers::writers::create_article, handlers::writers::get_articles,
        handlers::writers::get_article, handlers::writers::update_article,
        handlers::writers::delete_article, handlers::writers::update_article_image,
        handlers::admin::create_account, handlers::admin::login, handlers::admin::logout,
        handlers::admin::get_account, handlers::admin::create_writer,
        handlers::admin::create_section, handlers::admin::get_sections,
        handlers::admin::get_writers, handlers::admin::get_writers_by_ban,
        handlers::admin::ban_writer, handlers::admin::get_users, handlers::admin::filter_users,
        handlers::admin::ban_user, handlers::admin::get_articles,
        handlers::admin::get_articles_by_shown, handlers::admin::get_articles_by_subscribers,
        handlers::admin::update_article_flags, handlers::admin::create_product,
        handlers::admin::create_plan
    ),
    components(
        schemas(
            models::Role, models::AdminAccount, models::WriterAccount, models::ReaderAccount,
            models::Section, models::Article, models::ArticleWriter, models::ArticleDetail,
            models::Comment, models::Notification, models::Subscriber,
            models::CreateAccountRequest, models::CreateWriterRequest, models::LoginRequest,
            models::CreateSectionRequest, models::CreateArticleRequest,
            models::UpdateArticleRequest, models::ArticleFlagsRequest, models::BanRequest,
            models::CreateCommentRequest, models::CreatePlanRequest, models::SessionToken,
            models::Product, models::Plan, models::SubscriptionLink,
        )
    ),
    tags(
        (name = "newsroom", description = "Newsroom publishing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for every service a handler may need. Cheap to
/// clone: each collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    /// Writer profile images and article photos.
    pub storage: StorageState,
    pub payments: PaymentState,
    pub mailer: MailerState,
    /// Look-aside cache of the home feed pages.
    pub cache: CacheState,
    pub hasher: HasherState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// The session extractors only need the repository and the config.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree under `/api`, applies the per-audience guards and
/// the observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .nest("/users", readers::reader_routes(state.clone()))
        .nest("/writers", writers::writer_routes(state.clone()))
        .nest("/admin", admin::admin_routes(state.clone()));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Echo the request id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer` carrying the `x-request-id`, so every log line of one
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
