//! Shared response envelope for API handlers.
//!
//! Every successful response is `{ "success": true, "data": ... }`. Errors
//! use the same outer shape with `success: false` (see [`crate::error`]).

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Shorthand for `DataResponse::new(data).into_response()`.
pub fn ok<T: Serialize>(data: T) -> Response {
    DataResponse::new(data).into_response()
}
