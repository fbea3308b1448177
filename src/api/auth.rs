//! Identity and the admin gate.
//!
//! Identity is password + bearer-token sessions. Authorization is the
//! configured email allow-list, checked case-insensitively on every admin
//! request. The two failure modes stay distinct on the wire: no valid
//! session is a 401, a valid session without allow-list membership is a 403
//! with an explicit body, so the client shows "not authorized" instead of
//! silently bouncing to sign-in.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::auth::{is_allowed, AccessState};
use crate::db::{DbPool, LoginRequest, LoginResponse, Session, User, UserResponse};
use crate::AppState;

use super::error::ApiError;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// The signed-in identity attached to admin requests by the middleware.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub email: String,
}

/// Create the bootstrap admin account if it does not exist yet.
pub async fn ensure_admin_user(db: &DbPool, email: &str, password: &str) -> anyhow::Result<()> {
    if password.is_empty() {
        tracing::warn!("No bootstrap password configured, skipping admin account creation");
        return Ok(());
    }

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("password hash failed: {e}"))?;
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(email)
    .bind(&password_hash)
    .bind("Administrator")
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(db)
    .await?;

    tracing::info!(email = %email, "Bootstrap admin account created");
    Ok(())
}

/// One-time session check at startup. Runs in parallel with the auth-change
/// events from login/logout; whichever resolves later wins inside the gate.
pub async fn startup_session_sweep(state: Arc<AppState>) {
    let live: Option<(String,)> = sqlx::query_as(
        "SELECT u.email FROM sessions s JOIN users u ON u.id = s.user_id \
         WHERE s.expires_at > datetime('now') ORDER BY s.created_at DESC LIMIT 1",
    )
    .fetch_optional(&state.db)
    .await
    .unwrap_or(None);

    let resolved = AccessState::resolve(
        &state.config.auth.allowed_admin_emails,
        live.as_ref().map(|(email,)| email.as_str()),
    );
    state.gate.observe(resolved);
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = generate_token();
    let token_hash = hash_token(&token);

    let expires_at = chrono::Utc::now()
        + chrono::Duration::days(state.config.auth.session_days.max(1));

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(&user.id)
        .bind(&token_hash)
        .bind(expires_at.to_rfc3339())
        .execute(&state.db)
        .await?;

    // Auth-state-change event for the gate
    state.gate.observe(AccessState::resolve(
        &state.config.auth.allowed_admin_emails,
        Some(&user.email),
    ));

    tracing::info!(email = %user.email, "Admin signed in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Logout endpoint: drops the presented session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = bearer_token(&request) {
        let token_hash = hash_token(&token);
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(&state.db)
            .await?;
    }

    state.gate.observe(AccessState::Anonymous);

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Session check endpoint. Reports anonymous / unauthorized / authorized so
/// a client's startup check resolves against the same source of truth as the
/// sign-in/sign-out events. The resolution is applied to the gate like any
/// other observation.
pub async fn session(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<Json<AccessState>, ApiError> {
    let email = match bearer_token(&request) {
        Some(token) => session_email(&state.db, &token).await?,
        None => None,
    };

    let resolved = AccessState::resolve(
        &state.config.auth.allowed_admin_emails,
        email.as_deref(),
    );
    state.gate.observe(resolved.clone());

    Ok(Json(resolved))
}

/// Last-resolved access state, without touching the database. Serves the
/// public shell's "show the admin entry?" decision before any check of its
/// own has finished.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<AccessState> {
    Json(state.gate.state())
}

/// Token from the `Authorization: Bearer` header, with `X-API-Key` as a
/// fallback when no Authorization header is present. Other Authorization
/// schemes are rejected, not passed through as tokens.
fn bearer_token(request: &Request<Body>) -> Option<String> {
    if let Some(header) = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        return header.strip_prefix("Bearer ").map(|t| t.to_string());
    }
    request
        .headers()
        .get("X-API-Key")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Map a presented token to the signed-in user's email, if the session is
/// still live.
async fn session_email(db: &DbPool, token: &str) -> Result<Option<String>, ApiError> {
    let token_hash = hash_token(token);
    let session: Option<Session> =
        sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ? AND expires_at > datetime('now')")
            .bind(&token_hash)
            .fetch_optional(db)
            .await?;

    let Some(session) = session else {
        return Ok(None);
    };

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_optional(db)
        .await?;

    Ok(user.map(|u| u.email))
}

/// Middleware guarding the admin API: valid identity required, then the
/// allow-list gate.
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    // Bootstrap token from config, constant-time compared. An empty
    // configured token means the bootstrap path is disabled, not that an
    // empty credential matches.
    let bootstrap = state.config.auth.bootstrap_token.as_bytes();
    let provided = token.as_bytes();
    if !bootstrap.is_empty() && bootstrap.len() == provided.len() && bootstrap.ct_eq(provided).into()
    {
        request.extensions_mut().insert(AdminIdentity {
            email: state.config.auth.bootstrap_email.clone(),
        });
        return Ok(next.run(request).await);
    }

    let email = session_email(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !is_allowed(&state.config.auth.allowed_admin_emails, &email) {
        tracing::warn!(email = %email, "Signed-in user is not on the admin allow-list");
        return Err(ApiError::forbidden(
            "Your account is not authorized to manage the catalog",
        ));
    }

    request.extensions_mut().insert(AdminIdentity { email });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("bergère-1760").unwrap();
        assert!(verify_password("bergère-1760", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn token_hash_is_stable_and_opaque() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }

    fn request_with_auth(value: &str) -> Request<Body> {
        Request::builder()
            .header("Authorization", value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn bearer_token_accepts_only_the_bearer_scheme() {
        assert_eq!(
            bearer_token(&request_with_auth("Bearer abc")),
            Some("abc".to_string())
        );
        // Unrecognized schemes fail like an absent header
        assert_eq!(bearer_token(&request_with_auth("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&request_with_auth("abc")), None);
    }

    #[test]
    fn api_key_header_is_a_fallback() {
        let request = Request::builder()
            .header("X-API-Key", "abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request), Some("abc".to_string()));
    }
}
