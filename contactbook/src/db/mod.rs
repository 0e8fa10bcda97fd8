//! Database layer for data persistence and access.
//!
//! SQLx over SQLite, following the repository pattern:
//!
//! ```text
//! api handlers -> db::handlers (repositories) -> db::models (records) -> SQLite
//! ```
//!
//! - [`handlers`]: repository implementations
//! - [`models`]: record structures matching table schemas
//! - [`errors`]: classification of SQLx errors
//!
//! Migrations live in `migrations/` and are embedded with [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
