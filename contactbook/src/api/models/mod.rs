//! API request and response data models.
//!
//! These define the public JSON contract and are kept separate from the database records in
//! [`crate::db::models`]. All of them are annotated with `utoipa` for the OpenAPI document.

pub mod auth;
pub mod contacts;
pub mod pagination;
pub mod users;
