//! Identifier aliases shared across layers.
//!
//! Both map onto SQLite `INTEGER PRIMARY KEY` columns.

/// User account identifier, also the session subject.
pub type UserId = i64;

/// Contact identifier.
pub type ContactId = i64;
