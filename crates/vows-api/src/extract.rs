use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejection renders as an `ErrorBody` like every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
