//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway in front of this service
//! forwards the verified identity as two headers. This extractor only
//! checks that both are present and that the role is one we know.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::UserRole;
use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller.
///
/// ```ignore
/// async fn handler(principal: Principal) -> impl IntoResponse {
///     tracing::info!(role = %principal.role, "handling request");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Caller's user id.
    pub user_id: String,
    /// Caller's role.
    pub role: UserRole,
}

impl Principal {
    /// Rejects the caller unless their role is at or above `required`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] when the role is too low.
    pub fn require(&self, required: UserRole) -> Result<(), ApiError> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "{required} role required, caller is {}",
                self.role
            )))
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER).ok_or(ApiError::Unauthorized)?;
        let role = header(parts, USER_ROLE_HEADER)
            .ok_or(ApiError::Unauthorized)?
            .parse::<UserRole>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(Self {
            user_id: user_id.to_string(),
            role,
        })
    }
}
