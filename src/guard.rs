//! Access guard: gates a route on the role of the session's account.
//!
//! Guarded route groups are wrapped in one of the `require_*` middlewares, and the
//! handlers behind them take the matching typed session extractor. The extractor
//! re-checks the role, so a handler can never run for the wrong account variant.

use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::{
    auth::Identity,
    config::AppConfig,
    error::AppError,
    models::{Account, AdminAccount, ReaderAccount, Role, WriterAccount},
    repository::{RepoError, RepositoryState},
};

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("You are not authorized! Please login...")]
    NoSession,
    #[error("You are not authorized! Please login with an {} account...", .0.label())]
    WrongRole(Role),
    #[error(transparent)]
    Store(#[from] RepoError),
}

/// require_role
///
/// No session fails with `NoSession`; a session of another variant fails with
/// `WrongRole(expected)`.
pub fn require_role(expected: Role, identity: &Identity) -> Result<&Account, GuardError> {
    let account = identity.account().ok_or(GuardError::NoSession)?;
    if account.role() != expected {
        return Err(GuardError::WrongRole(expected));
    }
    Ok(account)
}

async fn enforce(role: Role, identity: Identity, request: Request, next: Next) -> Result<Response, AppError> {
    require_role(role, &identity)?;
    Ok(next.run(request).await)
}

/// Middleware for routes only admins may use.
pub async fn require_admin(identity: Identity, request: Request, next: Next) -> Result<Response, AppError> {
    enforce(Role::Admin, identity, request, next).await
}

/// Middleware for routes only writers may use.
pub async fn require_writer(identity: Identity, request: Request, next: Next) -> Result<Response, AppError> {
    enforce(Role::Writer, identity, request, next).await
}

/// Middleware for routes only readers may use.
pub async fn require_reader(identity: Identity, request: Request, next: Next) -> Result<Response, AppError> {
    enforce(Role::Reader, identity, request, next).await
}

/// The logged-in admin.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminAccount);

/// The logged-in writer.
#[derive(Debug, Clone)]
pub struct WriterSession(pub WriterAccount);

/// The logged-in reader.
#[derive(Debug, Clone)]
pub struct ReaderSession(pub ReaderAccount);

async fn guarded_account<S>(parts: &mut Parts, state: &S, role: Role) -> Result<Account, AppError>
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let identity = Identity::from_request_parts(parts, state).await?;
    Ok(require_role(role, &identity)?.clone())
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match guarded_account(parts, state, Role::Admin).await? {
            Account::Admin(admin) => Ok(AdminSession(admin)),
            _ => Err(GuardError::WrongRole(Role::Admin).into()),
        }
    }
}

impl<S> FromRequestParts<S> for WriterSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match guarded_account(parts, state, Role::Writer).await? {
            Account::Writer(writer) => Ok(WriterSession(writer)),
            _ => Err(GuardError::WrongRole(Role::Writer).into()),
        }
    }
}

impl<S> FromRequestParts<S> for ReaderSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match guarded_account(parts, state, Role::Reader).await? {
            Account::Reader(reader) => Ok(ReaderSession(reader)),
            _ => Err(GuardError::WrongRole(Role::Reader).into()),
        }
    }
}
