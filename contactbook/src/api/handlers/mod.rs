//! Axum route handlers, one module per resource.
//!
//! - [`users`]: registration, login, logout and the current user
//! - [`contacts`]: the logged-in user's contacts

pub mod contacts;
pub mod users;
