use std::sync::LazyLock;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use shared_models::error::AppError;

static TC_NO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]{10}$").unwrap());

/// TC numbers are eleven digits and never start with zero.
pub fn validate_tc_no(value: &str) -> Result<(), ValidationError> {
    if TC_NO.is_match(value) {
        Ok(())
    } else {
        let mut error = ValidationError::new("tc_no");
        error.message = Some("TC No must be 11 digits and must not start with 0".into());
        Err(error)
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        Err(error)
    } else {
        Ok(())
    }
}

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate().map_err(AppError::InvalidFields)?;
        Ok(ValidatedJson(value))
    }
}
