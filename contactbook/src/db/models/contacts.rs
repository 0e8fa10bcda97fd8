//! Database models for contacts.

use crate::auth::guard::OwnedResource;
use crate::types::{ContactId, UserId};

/// Database request for creating a contact on behalf of `user_id`
#[derive(Debug, Clone)]
pub struct ContactCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// Database request for replacing a contact's details. Ownership never changes.
#[derive(Debug, Clone)]
pub struct ContactUpdateDBRequest {
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// Database response for a contact
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ContactDBResponse {
    pub id: ContactId,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub user_id: UserId,
}

impl OwnedResource for ContactDBResponse {
    fn owner_id(&self, field: &str) -> Option<UserId> {
        match field {
            "user_id" => Some(self.user_id),
            _ => None,
        }
    }
}
