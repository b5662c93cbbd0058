/// Extractors whose rejections use the error envelope
///
/// Axum's own `Json` and `Path` reject with plain-text bodies; these wrappers
/// convert the rejection into [`ApiError`] so a malformed body or id gets the
/// same `{ success: false, message }` shape as every other error.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
