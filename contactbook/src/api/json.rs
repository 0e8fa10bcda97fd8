//! JSON request bodies whose rejections use the application's error format.

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::errors::Error;

/// Drop-in for [`axum::Json`] as an extractor.
///
/// A body that is not JSON, lacks a required field, or has a field of the wrong type is a
/// `400 Bad Request` like every other validation failure, instead of axum's `422`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest {
            message: rejection.body_text(),
        }
    }
}
