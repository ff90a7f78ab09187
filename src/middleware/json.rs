use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};

use crate::error::RollcallError;

/// `axum::Json` with its rejection folded into the common error shape,
/// so malformed bodies answer 400 with `{"error": ...}` like every
/// other validation failure.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = RollcallError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(RollcallError::Validation(rejection.body_text())),
        }
    }
}
