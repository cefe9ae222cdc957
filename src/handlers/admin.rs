use axum::extract::{Path, Query, State};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    AppState,
    auth::Identity,
    error::{AppError, AppResult, ApiResponse},
    guard::AdminSession,
    handlers::{JsonBody, listing, session},
    models::{
        Account, AdminAccount, Article, ArticleDetail, ArticleFlagsRequest, BanRequest,
        CreateAccountRequest, CreatePlanRequest, CreateSectionRequest, CreateWriterRequest,
        LoginRequest, Plan, Product, ReaderAccount, Role, Section, SessionToken, WriterAccount,
    },
    pagination::{Page, PageQuery},
    repository::{ArticleFilter, ReaderFilter, WriterFilter},
    validation,
    visibility::article_not_found,
};

const PRODUCT_NAME: &str = "Newsroom Subscription";
const PRODUCT_DESCRIPTION: &str = "Unlimited access to subscriber-only articles";

/// Query string of the filtered reader listing. All values arrive as raw strings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterQuery {
    pub banned: Option<String>,
    pub subscriber: Option<String>,
    pub verified: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn account_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Account with ID: {id} not found!"))
}

fn ban_message(kind: &str, banned: bool) -> String {
    if banned {
        format!("{kind} banned successfully!")
    } else {
        format!("{kind} unbanned successfully!")
    }
}

/// create_account
///
/// [Public Route] Creates an admin. Left open so the first admin can be bootstrapped.
#[utoipa::path(
    post,
    path = "/api/admin/account",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Admin created", body = AdminAccount),
        (status = 400, description = "Invalid input or email already registered")
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateAccountRequest>,
) -> AppResult<ApiResponse<AdminAccount>> {
    let email = validation::email(payload.email.as_ref())?;
    let password = session::new_password(payload.password.as_ref(), payload.password2.as_ref())?;
    session::ensure_email_free(&state, Role::Admin, &email).await?;

    let password_hash = state.hasher.hash(&password).await?;
    let admin = state.repo.create_admin(&email, &password_hash).await?;

    tracing::info!(admin_id = %admin.id, "admin created");
    Ok(ApiResponse::created(admin, "Account created successfully!"))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = SessionToken),
        (status = 400, description = "Wrong password or already logged in"),
        (status = 404, description = "Email not found")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<ApiResponse<SessionToken>> {
    session::login(&state, &identity, Role::Admin, payload).await
}

#[utoipa::path(get, path = "/api/admin/logout", responses((status = 200, description = "Logged out")))]
pub async fn logout(State(state): State<AppState>, identity: Identity) -> AppResult<ApiResponse<()>> {
    session::logout(&state, identity).await
}

#[utoipa::path(
    get,
    path = "/api/admin/account",
    responses(
        (status = 200, description = "The logged-in admin", body = AdminAccount),
        (status = 400, description = "No admin logged in")
    )
)]
pub async fn get_account(identity: Identity) -> AppResult<ApiResponse<Account>> {
    Ok(ApiResponse::ok(session::current_account(&identity, Role::Admin)?))
}

/// create_writer
///
/// [Admin Route] Creates a writer attached to an existing section.
#[utoipa::path(
    post,
    path = "/api/admin/writer/account",
    request_body = CreateWriterRequest,
    responses(
        (status = 201, description = "Writer created", body = WriterAccount),
        (status = 400, description = "Invalid input or email already registered"),
        (status = 404, description = "Unknown section")
    )
)]
pub async fn create_writer(
    State(state): State<AppState>,
    _admin: AdminSession,
    JsonBody(payload): JsonBody<CreateWriterRequest>,
) -> AppResult<ApiResponse<WriterAccount>> {
    let email = validation::email(payload.email.as_ref())?;
    let password = session::new_password(payload.password.as_ref(), payload.password2.as_ref())?;
    let section_id = validation::id_field("sectionId", payload.section_id.as_ref())?;

    if state.repo.find_section(section_id).await?.is_none() {
        return Err(AppError::not_found(format!("Section with ID: {section_id} not found!")));
    }
    session::ensure_email_free(&state, Role::Writer, &email).await?;

    let password_hash = state.hasher.hash(&password).await?;
    let writer = state.repo.create_writer(&email, &password_hash, section_id).await?;

    tracing::info!(writer_id = %writer.id, %section_id, "writer created");
    Ok(ApiResponse::created(writer, "Account created successfully!"))
}

/// create_section
///
/// [Admin Route] Names are unique ignoring case and stored capitalized.
#[utoipa::path(
    post,
    path = "/api/admin/section",
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section created", body = Section),
        (status = 400, description = "Invalid or duplicate name")
    )
)]
pub async fn create_section(
    State(state): State<AppState>,
    _admin: AdminSession,
    JsonBody(payload): JsonBody<CreateSectionRequest>,
) -> AppResult<ApiResponse<Section>> {
    let name = validation::capitalize(&validation::section_name(payload.name.as_ref())?);
    if state.repo.find_section_by_name(&name).await?.is_some() {
        return Err(AppError::rule(format!(
            "Section {name} exists! Try with another name..."
        )));
    }
    let section = state.repo.create_section(&name).await?;
    Ok(ApiResponse::created(section, "Section created successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/admin/sections",
    params(PageQuery),
    responses((status = 200, description = "Sections", body = Page<Section>))
)]
pub async fn get_sections(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<Section>>> {
    let page = listing(&query, "No sections saved in DB!", |w| state.repo.list_sections(w)).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/admin/writers",
    params(PageQuery),
    responses((status = 200, description = "Writers", body = Page<WriterAccount>))
)]
pub async fn get_writers(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<WriterAccount>>> {
    let page = listing(&query, "No writers saved in DB!", |w| {
        state.repo.list_writers(WriterFilter::default(), w)
    })
    .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/admin/writers/banned/{banned}",
    params(("banned" = String, Path, description = "true or false"), PageQuery),
    responses((status = 200, description = "Writers by ban state", body = Page<WriterAccount>))
)]
pub async fn get_writers_by_ban(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(raw): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<WriterAccount>>> {
    let banned = validation::bool_literal("Banned", &raw)?;
    let empty_msg = if banned {
        "No banned writers saved in DB!"
    } else {
        "No unbanned writers saved in DB!"
    };
    let filter = WriterFilter { banned: Some(banned) };
    let page = listing(&query, empty_msg, |w| state.repo.list_writers(filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

/// ban_writer
///
/// [Admin Route] Banning hides every article of the writer from public listings,
/// so the feed cache is dropped.
#[utoipa::path(
    put,
    path = "/api/admin/writer/{id}/ban",
    params(("id" = String, Path, description = "Writer id")),
    request_body = BanRequest,
    responses(
        (status = 200, description = "Ban state saved", body = WriterAccount),
        (status = 404, description = "Unknown writer")
    )
)]
pub async fn ban_writer(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody<BanRequest>,
) -> AppResult<ApiResponse<WriterAccount>> {
    let id = validation::id_param(&raw_id)?;
    let writer = state
        .repo
        .set_writer_banned(id, payload.is_banned)
        .await?
        .ok_or_else(|| account_not_found(id))?;
    state.cache.clear().await;

    tracing::info!(writer_id = %id, banned = payload.is_banned, "writer ban updated");
    Ok(ApiResponse::ok_with(writer, ban_message("Writer", payload.is_banned)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(PageQuery),
    responses((status = 200, description = "Readers", body = Page<ReaderAccount>))
)]
pub async fn get_users(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ReaderAccount>>> {
    let page = listing(&query, "No users saved in DB!", |w| {
        state.repo.list_readers(ReaderFilter::default(), w)
    })
    .await?;
    Ok(ApiResponse::ok(page))
}

/// filter_users
///
/// [Admin Route] Readers matching every provided tri-state flag. Omitted flags
/// leave that attribute unconstrained.
#[utoipa::path(
    get,
    path = "/api/admin/users/filter",
    params(UserFilterQuery),
    responses(
        (status = 200, description = "Matching readers", body = Page<ReaderAccount>),
        (status = 400, description = "A flag is not true or false")
    )
)]
pub async fn filter_users(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<UserFilterQuery>,
) -> AppResult<ApiResponse<Page<ReaderAccount>>> {
    let filter = ReaderFilter {
        banned: validation::optional_bool("Banned", query.banned.as_deref())?,
        subscriber: validation::optional_bool("Subscriber", query.subscriber.as_deref())?,
        verified: validation::optional_bool("Verified", query.verified.as_deref())?,
    };
    let paging = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let page = listing(&paging, "No users saved in DB!", |w| state.repo.list_readers(filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    put,
    path = "/api/admin/user/{id}/ban",
    params(("id" = String, Path, description = "Reader id")),
    request_body = BanRequest,
    responses(
        (status = 200, description = "Ban state saved", body = ReaderAccount),
        (status = 404, description = "Unknown reader")
    )
)]
pub async fn ban_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody<BanRequest>,
) -> AppResult<ApiResponse<ReaderAccount>> {
    let id = validation::id_param(&raw_id)?;
    let reader = state
        .repo
        .set_reader_banned(id, payload.is_banned)
        .await?
        .ok_or_else(|| account_not_found(id))?;

    tracing::info!(reader_id = %id, banned = payload.is_banned, "reader ban updated");
    Ok(ApiResponse::ok_with(reader, ban_message("User", payload.is_banned)))
}

#[utoipa::path(
    get,
    path = "/api/admin/articles",
    params(PageQuery),
    responses((status = 200, description = "Every article", body = Page<ArticleDetail>))
)]
pub async fn get_articles(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let filter = ArticleFilter::all();
    let page = listing(&query, "No articles saved in DB!", |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/admin/articles/shown/{shown}",
    params(("shown" = String, Path, description = "true or false"), PageQuery),
    responses((status = 200, description = "Articles by visibility", body = Page<ArticleDetail>))
)]
pub async fn get_articles_by_shown(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(raw): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let shown = validation::bool_literal("Shown", &raw)?;
    let empty_msg = if shown {
        "No shown articles saved in DB!"
    } else {
        "No hidden articles saved in DB!"
    };
    let filter = ArticleFilter::by_shown(shown);
    let page = listing(&query, empty_msg, |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/admin/articles/subscribers/{subscribers}",
    params(("subscribers" = String, Path, description = "true or false"), PageQuery),
    responses((status = 200, description = "Articles by audience", body = Page<ArticleDetail>))
)]
pub async fn get_articles_by_subscribers(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(raw): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ArticleDetail>>> {
    let for_subscribers = validation::bool_literal("Subscribers", &raw)?;
    let empty_msg = if for_subscribers {
        "No articles for subscribers saved in DB!"
    } else {
        "No articles for everyone saved in DB!"
    };
    let filter = ArticleFilter::by_audience(for_subscribers);
    let page = listing(&query, empty_msg, |w| state.repo.list_articles(&filter, w)).await?;
    Ok(ApiResponse::ok(page))
}

/// update_article_flags
///
/// [Admin Route] Moderates `isShown` and `forSubscribers`. The feed cache is
/// dropped so the change is visible on the next request.
#[utoipa::path(
    put,
    path = "/api/admin/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    request_body = ArticleFlagsRequest,
    responses(
        (status = 200, description = "Flags saved", body = Article),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn update_article_flags(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody<ArticleFlagsRequest>,
) -> AppResult<ApiResponse<Article>> {
    let id = validation::id_param(&raw_id)?;
    if payload.is_shown.is_none() && payload.for_subscribers.is_none() {
        return Err(AppError::validation("Nothing to update"));
    }
    let article = state
        .repo
        .set_article_flags(id, payload.is_shown, payload.for_subscribers)
        .await?
        .ok_or_else(|| article_not_found(id))?;
    state.cache.clear().await;

    tracing::info!(article_id = %id, shown = article.is_shown, for_subscribers = article.for_subscribers, "article moderated");
    Ok(ApiResponse::ok_with(article, "Article updated successfully!"))
}

/// create_product
///
/// [Admin Route] One-off billing setup: registers the subscription product at the payment provider.
#[utoipa::path(
    post,
    path = "/api/admin/create-product",
    responses((status = 201, description = "Product created", body = Product))
)]
pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> AppResult<ApiResponse<Product>> {
    let product = state.payments.create_product(PRODUCT_NAME, PRODUCT_DESCRIPTION).await?;
    Ok(ApiResponse::created(product, "Product created successfully!"))
}

/// create_plan
///
/// [Admin Route] Creates the monthly plan for a product. The returned id is what
/// `PAYPAL_PLAN_ID` must be set to.
#[utoipa::path(
    post,
    path = "/api/admin/create-plan",
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created", body = Plan),
        (status = 400, description = "Missing product id")
    )
)]
pub async fn create_plan(
    State(state): State<AppState>,
    _admin: AdminSession,
    JsonBody(payload): JsonBody<CreatePlanRequest>,
) -> AppResult<ApiResponse<Plan>> {
    let product_id = validation::text_field("productId", payload.product_id.as_ref())?;
    let plan = state.payments.create_plan(&product_id).await?;
    Ok(ApiResponse::created(plan, "Plan created successfully!"))
}
