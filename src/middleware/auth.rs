use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::RollcallError;
use crate::router::RollcallState;

/// Authenticated curator, extracted from the `Authorization` header.
/// Expects `Bearer <token>`: an absent token rejects with 401, a token
/// that fails verification with 403.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
}

impl FromRequestParts<RollcallState> for CurrentUser {
    type Rejection = RollcallError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &RollcallState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|auth| auth.split_whitespace().nth(1));
        let Some(token) = token else {
            return Err(RollcallError::AuthMissing);
        };
        let Some(claims) = state.tokens.verify(token) else {
            return Err(RollcallError::AuthInvalid);
        };
        Ok(CurrentUser { id: claims.id })
    }
}
