use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::claims::{Identity, Role};
use crate::error::AppError;

/// Checks that the published identity holds `required`. A missing identity
/// means authentication never ran, which is treated as forbidden too.
pub fn require_role(identity: Option<&Identity>, required: Role) -> Result<&Identity, AppError> {
    let identity = identity
        .ok_or_else(|| AppError::Forbidden("no identity in request context".into()))?;
    if !identity.role.satisfies(required) {
        return Err(AppError::Forbidden(format!(
            "{} has role {}, {} required",
            identity.username, identity.role, required
        )));
    }
    Ok(identity)
}

/// Any authenticated caller.
pub struct AuthUser(pub Identity);

/// An authenticated caller holding the admin role.
pub struct AdminUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts.extensions.get::<Identity>(), Role::User)
            .map(|identity| AuthUser(identity.clone()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts.extensions.get::<Identity>(), Role::Admin)
            .map(|identity| AdminUser(identity.clone()))
    }
}
