/// Success envelope
///
/// Every successful response has the shape
///
/// ```json
/// { "success": true, "count": 2, "data": [ ... ] }
/// ```
///
/// where `count` is present only for lists.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }

    /// Same envelope sent with `201 Created`
    pub fn created(data: T) -> Created<T> {
        Created(Self::data(data))
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(items.len()),
            data: items,
        }
    }
}

/// Empty `data` object, returned by deletes
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    pub fn empty() -> Self {
        Self::data(Empty {})
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Envelope with status 201
#[derive(Debug)]
pub struct Created<T>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}
