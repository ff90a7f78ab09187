use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::models::User;
use crate::error::RollcallError;
use crate::middleware::AppJson;
use crate::router::RollcallState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub role: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// POST /api/auth/register -> creates the curator account.
/// Registration closes permanently after the first user.
pub async fn register(
    State(state): State<RollcallState>,
    AppJson(body): AppJson<CredentialsRequest>,
) -> Result<impl IntoResponse, RollcallError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(RollcallError::validation("email and password are required"));
    }

    let hash = bcrypt::hash(&body.password, bcrypt::DEFAULT_COST)?;
    let Some(user) = state.storage.create_curator(email, &hash).await? else {
        return Err(RollcallError::validation(
            "curator already exists, registration is closed",
        ));
    };

    info!(user_id = user.id, "curator account created");
    let token = state.tokens.issue(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login -> verifies credentials and issues a token.
pub async fn login(
    State(state): State<RollcallState>,
    AppJson(body): AppJson<CredentialsRequest>,
) -> Result<impl IntoResponse, RollcallError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(RollcallError::validation("email and password are required"));
    }

    let Some(user) = state.storage.find_user_by_email(email).await? else {
        return Err(RollcallError::NotFound("user"));
    };
    if !bcrypt::verify(&body.password, &user.password)? {
        return Err(RollcallError::WrongPassword);
    }

    let token = state.tokens.issue(user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
