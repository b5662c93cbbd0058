/// Internal error detail exposure
///
/// 500 responses carry a generic message. Outside production this layer
/// replaces it with the underlying error text so that failures can be
/// diagnosed from the client.

use axum::{extract::Request, middleware::Next, response::{IntoResponse, Response}, Json};

use crate::error::{ErrorResponse, InternalErrorDetail};

pub async fn expose_internal_errors(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    match response.extensions_mut().remove::<InternalErrorDetail>() {
        Some(InternalErrorDetail(detail)) => {
            (response.status(), Json(ErrorResponse::new(detail))).into_response()
        }
        None => response,
    }
}
