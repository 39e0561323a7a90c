//! Axum extractor for validated forms
//!
//! `Validated<T>` deserializes the JSON body and runs `validator::Validate`
//! before the handler sees the payload, so a rejected form never reaches a
//! service or the backend.

use crate::core::error::{DashError, ValidationError};
use crate::core::validation::validate_form;
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Axum extractor that deserializes and validates a form
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_coupon(
///     State(state): State<BillingState>,
///     Validated(form): Validated<CouponForm>,
/// ) -> DashResult<(StatusCode, Json<Coupon>)> {
///     // form is already validated
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = DashError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(form) = Json::<T>::from_request(req, state).await.map_err(|e| {
            DashError::Validation(ValidationError::InvalidJson {
                message: e.body_text(),
            })
        })?;

        validate_form(&form)?;
        Ok(Validated(form))
    }
}
