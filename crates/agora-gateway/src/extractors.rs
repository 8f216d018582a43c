//! Request extractors

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::{async_trait, Json};
use serde::de::DeserializeOwned;
use validator::Validate;

use agora_common::AppError;

use crate::error::ApiError;

/// JSON body extractor that also runs `validator` rules
///
/// Both malformed bodies and rule violations come back as [`ApiError`], so
/// every 400 wears the standard error envelope.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state).await.map_err(bad_body)?;
        body.validate()?;
        Ok(Self(body))
    }
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    AppError::InvalidInput(rejection.body_text()).into()
}
