//! Database record models matching table schemas.
//!
//! These are distinct from the API models in [`crate::api::models`]: repositories accept
//! `*DBRequest` values and return `*DBResponse` values, and handlers convert at the boundary.
//!
//! - [`users`]: user accounts and their stored credentials
//! - [`contacts`]: address book entries, each owned by one user

pub mod contacts;
pub mod users;
