use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    models::{Account, Role, SessionToken},
    password::{HashError, PasswordHasher},
    repository::{RepoError, Repository, RepositoryState},
};

/// Header accepted in `Env::Local` in place of a session token.
pub const LOCAL_BYPASS_HEADER: &str = "x-account-id";

// Probe order when resolving a session id to an account variant.
const RESOLUTION_ORDER: [Role; 3] = [Role::Reader, Role::Admin, Role::Writer];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email address not found!")]
    EmailNotFound,
    #[error("Incorrect password!")]
    IncorrectPassword,
    #[error("Please verify your account!")]
    NotVerified,
    #[error("This account is banned! Please contact the admin of the page...")]
    Banned,
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Claims
///
/// Session token payload. `sub` is the account id and `jti` identifies this session
/// so that logout can revoke it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// SessionIdentity
///
/// The account bound to the current request. `session_id` and `expires_at` are
/// absent for the local bypass, which has no token to revoke.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub account: Account,
    pub session_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// load_account
///
/// Fetches the account of one role by id.
pub async fn load_account(repo: &dyn Repository, role: Role, id: Uuid) -> Result<Option<Account>, RepoError> {
    let account = match role {
        Role::Reader => repo.find_reader(id).await?.map(Account::Reader),
        Role::Admin => repo.find_admin(id).await?.map(Account::Admin),
        Role::Writer => repo.find_writer(id).await?.map(Account::Writer),
    };
    Ok(account)
}

/// resolve_session
///
/// Maps a stored session id back to a full account by probing reader, admin and
/// writer in that order. `None` when the id matches no account, e.g. after the
/// account was deleted.
pub async fn resolve_session(repo: &dyn Repository, account_id: Uuid) -> Result<Option<Account>, RepoError> {
    for role in RESOLUTION_ORDER {
        if let Some(account) = load_account(repo, role, account_id).await? {
            return Ok(Some(account));
        }
    }
    Ok(None)
}

/// Role-specific eligibility applied after the password matched.
pub fn check_login_gate(account: &Account) -> Result<(), AuthError> {
    match account {
        Account::Reader(reader) => {
            if reader.is_banned {
                return Err(AuthError::Banned);
            }
            if !reader.is_verified {
                return Err(AuthError::NotVerified);
            }
            Ok(())
        }
        Account::Writer(writer) if writer.is_banned => Err(AuthError::Banned),
        Account::Writer(_) | Account::Admin(_) => Ok(()),
    }
}

/// authenticate
///
/// The single login path shared by all three roles:
/// 1. Case-insensitive email lookup in the role's own store.
/// 2. Password comparison against the stored digest.
/// 3. The role gate (banned and unverified readers, banned writers).
pub async fn authenticate(
    repo: &dyn Repository,
    hasher: &dyn PasswordHasher,
    role: Role,
    email: &str,
    password: &str,
) -> Result<Account, AuthError> {
    let credentials = repo
        .find_credentials(role, email)
        .await?
        .ok_or(AuthError::EmailNotFound)?;

    if !hasher.verify(password, &credentials.password_hash).await? {
        return Err(AuthError::IncorrectPassword);
    }

    let account = load_account(repo, role, credentials.id)
        .await?
        .ok_or(AuthError::EmailNotFound)?;
    check_login_gate(&account)?;
    Ok(account)
}

/// issue_session
///
/// Signs an HS256 session token for `account_id`, valid for `session_ttl_secs`.
pub fn issue_session(config: &AppConfig, account_id: Uuid) -> AppResult<SessionToken> {
    let now = Utc::now();
    let ttl = i64::try_from(config.session_ttl_secs).unwrap_or(i64::MAX / 2);
    let expires_at = now + chrono::Duration::seconds(ttl);
    let claims = Claims {
        sub: account_id,
        jti: Uuid::new_v4(),
        iat: now.timestamp().max(0) as usize,
        exp: expires_at.timestamp().max(0) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| AppError::upstream("session signing failed", e))?;
    Ok(SessionToken { token, expires_at })
}

/// Decodes and validates a session token. Expired or tampered tokens yield `None`.
pub fn decode_session(config: &AppConfig, token: &str) -> Option<Claims> {
    let key = DecodingKey::from_secret(config.session_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!(error = %e, "rejected session token");
            None
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

async fn local_bypass(headers: &HeaderMap, repo: &dyn Repository) -> Result<Option<SessionIdentity>, RepoError> {
    let Some(id) = headers
        .get(LOCAL_BYPASS_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
    else {
        return Ok(None);
    };
    Ok(resolve_session(repo, id).await?.map(|account| SessionIdentity {
        account,
        session_id: None,
        expires_at: None,
    }))
}

/// resolve_request
///
/// Finds the identity behind a request's headers. The local bypass is checked
/// first (`Env::Local` only); otherwise a valid, unrevoked bearer token is required.
pub async fn resolve_request(
    headers: &HeaderMap,
    repo: &dyn Repository,
    config: &AppConfig,
) -> Result<Option<SessionIdentity>, RepoError> {
    if config.env == Env::Local {
        if let Some(identity) = local_bypass(headers, repo).await? {
            return Ok(Some(identity));
        }
    }

    let Some(claims) = bearer_token(headers).and_then(|token| decode_session(config, token)) else {
        return Ok(None);
    };
    if repo.is_session_revoked(claims.jti).await? {
        return Ok(None);
    }

    let expires_at = i64::try_from(claims.exp)
        .ok()
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single());
    Ok(resolve_session(repo, claims.sub).await?.map(|account| SessionIdentity {
        account,
        session_id: Some(claims.jti),
        expires_at,
    }))
}

/// Identity
///
/// Extractor for the optional session identity. Never rejects on a missing or bad
/// session; that decision belongs to the access guard. The resolved value is cached
/// in the request extensions so guard middleware and handlers share one lookup.
#[derive(Debug, Clone)]
pub struct Identity(pub Option<SessionIdentity>);

impl Identity {
    pub fn account(&self) -> Option<&Account> {
        self.0.as_ref().map(|identity| &identity.account)
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        let identity = Identity(resolve_request(&parts.headers, repo.as_ref(), &config).await?);

        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}
