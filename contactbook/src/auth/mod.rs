//! Authentication and authorization.
//!
//! - [`password`]: salted PBKDF2 credential hashing and verification
//! - [`session`]: the [`session::Session`] interface and the signed-cookie codec behind it
//! - [`guard`]: subject and ownership checks, plus the login/logout transitions
//! - [`current_user`]: axum extractors for the session and the logged-in user

pub mod current_user;
pub mod guard;
pub mod password;
pub mod session;
