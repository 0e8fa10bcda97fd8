//! API request/response models for users.

use crate::config::PasswordConfig;
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use crate::types::UserId;
use crate::validation::normalize_email;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Registration payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    /// Must repeat `password`
    pub password2: String,
}

impl UserCreate {
    /// Check the payload against the password rules and return the normalized email.
    pub fn validate(&self, rules: &PasswordConfig) -> Result<String, Error> {
        let email = normalize_email(&self.email).map_err(|message| Error::BadRequest { message })?;

        if self.password != self.password2 {
            return Err(Error::BadRequest {
                message: "Passwords did not match".to_string(),
            });
        }

        let length = self.password.chars().count();
        if length < rules.min_length {
            return Err(Error::BadRequest {
                message: format!("Password must be at least {} characters", rules.min_length),
            });
        }
        if length > rules.max_length {
            return Err(Error::BadRequest {
                message: format!("Password must be no more than {} characters", rules.max_length),
            });
        }

        Ok(email)
    }
}

/// Login payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

/// Public view of an account. Never carries the credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self { id: db.id, email: db.email }
    }
}

/// The user a request is authenticated as.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
}

impl From<CurrentUser> for UserResponse {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}
