//! Request body extraction for the function endpoints.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, ErrorCode};

/// JSON body with the function endpoints' error codes: an empty body is
/// `EMPTY_BODY`, unparsable JSON is `INVALID_JSON`, and JSON that does not
/// fit `T` is `INVALID_INPUT`. The `Content-Type` header is not required.
#[derive(Debug)]
pub struct FunctionBody<T>(pub T);

impl<S, T> FromRequest<S> for FunctionBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::invalid_input(e.body_text()))?;
        parse_body(&bytes).map(FunctionBody)
    }
}

pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::coded(ErrorCode::EmptyBody, "Request body is empty"));
    }
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|_| AppError::coded(ErrorCode::InvalidJson, "Invalid JSON in request body"))?;
    serde_json::from_value(value).map_err(|e| AppError::invalid_input(e.to_string()))
}
