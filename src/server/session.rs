use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::server::{ApiError, ServerState};
use crate::user::{AuthTokenValue, UserId};

pub(crate) const SESSION_COOKIE_NAME: &str = "session_token";

/// The authenticated caller, resolved from the session cookie or the
/// Authorization header. Extraction fails with 403 when neither carries a
/// known token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub token: String,
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        return Some(cookie.value().to_string());
    }
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(ApiError::NotAuthenticated)?;
        let value = AuthTokenValue(token);
        let auth_token = state
            .user_store
            .get_auth_token(&value)
            .ok_or(ApiError::NotAuthenticated)?;
        if let Err(err) = state.user_store.touch_auth_token(&value) {
            warn!("Failed to touch auth token: {:#}", err);
        }
        Ok(Session {
            user_id: auth_token.user_id,
            token: value.0,
        })
    }
}
