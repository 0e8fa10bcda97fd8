//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed SQLx connection (or transaction), binds parameters, and
//! returns models from [`crate::db::models`]:
//!
//! - [`Users`]: account creation and lookup
//! - [`Contacts`]: owner-scoped contact CRUD, via the [`Repository`] trait
//!
//! ```ignore
//! use contactbook::db::handlers::{Contacts, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let contact = Contacts::new(&mut tx).get_by_id(id).await?;
//! tx.commit().await?;
//! ```

pub mod contacts;
pub mod repository;
pub mod users;

pub use contacts::Contacts;
pub use repository::Repository;
pub use users::Users;
