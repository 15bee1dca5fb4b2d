//! Session authentication
//!
//! Login issues a random token in the `vidflow_session` cookie; only its
//! SHA-256 is stored. Protected routes resolve the cookie to a [`User`] in
//! [`auth_middleware`] and read it back through the [`CurrentUser`]
//! extractor.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use tracing::{debug, info, warn};
use vidflow_common::db::{sessions, users};
use vidflow_common::models::User;

use super::{ok, ApiError, Envelope};
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "vidflow_session";

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid stored password hash: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!("Password verification failed: {}", e))),
    }
}

/// The authenticated user, inserted by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Se requieren permisos de administrador"))
        }
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("No autenticado".into()))
    }
}

/// Resolve the session cookie or reject with 401
///
/// Applied to protected routes only; `/health` and `/api/login` bypass it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookies
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::Unauthorized("No autenticado".into()))?;

    let user = sessions::session_user(&state.db, &token, Utc::now())
        .await?
        .ok_or_else(|| {
            debug!("Rejected unknown or expired session");
            ApiError::Unauthorized("Sesión inválida o expirada".into())
        })?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Envelope<User>>, ApiError> {
    let invalid = || ApiError::Unauthorized("Usuario o contraseña incorrectos".into());

    let (user, hash) = users::get_user_credentials(&state.db, &body.username)
        .await?
        .ok_or_else(|| {
            warn!("Login attempt for unknown user '{}'", body.username.trim());
            invalid()
        })?;

    if !verify_password(&body.password, &hash)? {
        warn!("Failed login for '{}'", user.username);
        return Err(invalid());
    }

    let token = sessions::create_session(&state.db, user.id, state.session_ttl).await?;
    users::touch_last_login(&state.db, user.id, Utc::now()).await?;
    cookies.add(session_cookie(token));

    info!("User '{}' logged in", user.username);
    Ok(ok(user))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    user: CurrentUser,
) -> Result<Json<Envelope<()>>, ApiError> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        sessions::delete_session(&state.db, cookie.value()).await?;
    }
    cookies.remove(Cookie::build(SESSION_COOKIE).path("/").build());

    info!("User '{}' logged out", user.username);
    Ok(ok(()))
}

/// GET /api/user
pub async fn current_user(user: CurrentUser) -> Json<Envelope<User>> {
    ok(user.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("s3creta").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3creta", &hash).unwrap());
        assert!(!verify_password("otra", &hash).unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
