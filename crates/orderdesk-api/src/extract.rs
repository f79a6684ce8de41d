//! Request body parsing with garde validation

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use garde::Validate;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Deserialize a JSON body and validate it
pub fn parse_json<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate<Context = ()>,
{
    let value: T = serde_json::from_slice(body).map_err(|e| {
        let mut fields = BTreeMap::new();
        fields.insert("body".to_string(), vec![e.to_string()]);
        ApiError::validation(fields)
    })?;
    value.validate()?;
    Ok(value)
}

/// Like [`parse_json`], but an empty body yields `T::default()`
pub fn parse_optional_json<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate<Context = ()> + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_json(body)
}

/// JSON extractor that runs garde validation before the handler sees the value
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate<Context = ()>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            ApiError::bad_request(format!("Failed to read body: {}", e), "INVALID_BODY")
        })?;
        parse_json(&body).map(ValidatedJson)
    }
}
