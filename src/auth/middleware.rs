use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use time::OffsetDateTime;

use super::{claims::Identity, jwt::JwtKeys};
use crate::error::{AppError, AuthFailure};

/// Extracts `<token>` from `Bearer <token>`. Anything else is `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Resolves the caller from the `Authorization` header. Malformed headers are
/// rejected before any signature work is done.
pub fn identify(
    headers: &HeaderMap,
    keys: &JwtKeys,
    now: OffsetDateTime,
) -> Result<Identity, AuthFailure> {
    let raw = headers.get(AUTHORIZATION).ok_or(AuthFailure::MissingHeader)?;
    let raw = raw.to_str().map_err(|_| AuthFailure::MalformedHeader)?;
    let token = bearer_token(raw).ok_or(AuthFailure::MalformedHeader)?;
    Ok(keys.validate(token, now)?)
}

/// Applied to the whole protected route group. On success the caller's
/// [`Identity`] is stored in the request extensions for extractors to read.
pub async fn authenticate(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = identify(req.headers(), &keys, OffsetDateTime::now_utc())?;
    tracing::Span::current().record("user", identity.username.as_str());
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
