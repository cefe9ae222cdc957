//! Login, logout and "current account" shared by all three roles. The per-role
//! handlers only pick the `Role`.

use crate::{
    AppState,
    auth::{self, Identity},
    error::{AppError, AppResult, ApiResponse},
    models::{Account, LoginRequest, Role, SessionToken},
    validation,
};

pub(crate) async fn login(
    state: &AppState,
    identity: &Identity,
    role: Role,
    payload: LoginRequest,
) -> AppResult<ApiResponse<SessionToken>> {
    if identity.0.is_some() {
        return Err(AppError::rule("An user is already logged in!"));
    }
    let email = validation::email(payload.email.as_ref())?;
    let password = validation::login_password(payload.password.as_ref())?;

    let account = auth::authenticate(
        state.repo.as_ref(),
        state.hasher.as_ref(),
        role,
        &email,
        &password,
    )
    .await?;
    let token = auth::issue_session(&state.config, account.id())?;

    tracing::info!(account_id = %account.id(), ?role, "session opened");
    Ok(ApiResponse::ok_with(token, "You logged in successfully"))
}

/// Revokes the presented session. The local bypass has no token, so there is nothing to record.
pub(crate) async fn logout(state: &AppState, identity: Identity) -> AppResult<ApiResponse<()>> {
    let Some(session) = identity.0 else {
        return Err(AppError::rule("No user logged in"));
    };
    if let (Some(session_id), Some(expires_at)) = (session.session_id, session.expires_at) {
        state.repo.revoke_session(session_id, expires_at).await?;
    }
    tracing::info!(account_id = %session.account.id(), "session closed");
    Ok(ApiResponse::message("You successfully logged out!"))
}

/// The session's account when it has `role`; a 400 naming the role otherwise.
pub(crate) fn current_account(identity: &Identity, role: Role) -> AppResult<Account> {
    match identity.account() {
        Some(account) if account.role() == role => Ok(account.clone()),
        _ => Err(AppError::rule(format!("No {} Account logged in", role.label()))),
    }
}

/// The password policy followed by the confirmation check.
pub(crate) fn new_password(
    password: Option<&serde_json::Value>,
    confirmation: Option<&serde_json::Value>,
) -> AppResult<String> {
    let password = validation::new_password(password)?;
    validation::password_confirmation(&password, confirmation)?;
    Ok(password)
}

/// Rejects an email already registered for `role`. Uniqueness is per role.
pub(crate) async fn ensure_email_free(state: &AppState, role: Role, email: &str) -> AppResult<()> {
    if state.repo.find_credentials(role, email).await?.is_some() {
        return Err(AppError::rule(format!(
            "Email \"{email}\" exists! Try with another one!"
        )));
    }
    Ok(())
}
