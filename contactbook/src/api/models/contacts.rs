//! API request/response models for contacts.

use super::pagination::Pagination;
use crate::db::models::contacts::{ContactCreateDBRequest, ContactDBResponse, ContactUpdateDBRequest};
use crate::errors::Error;
use crate::types::{ContactId, UserId};
use crate::validation::is_valid_email;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Details of a contact, used both to create one and to replace an existing one's details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactCreate {
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Replacement details for an existing contact. Omitted optional fields are cleared.
pub type ContactUpdate = ContactCreate;

/// Validated, trimmed contact fields.
struct ContactFields {
    name: String,
    phone_number: Option<String>,
    email: Option<String>,
}

impl ContactCreate {
    fn validate(self) -> Result<ContactFields, Error> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::BadRequest {
                message: "Contact name is required".to_string(),
            });
        }

        let email = non_blank(self.email);
        if email.as_deref().is_some_and(|email| !is_valid_email(email)) {
            return Err(Error::BadRequest {
                message: "Invalid email format".to_string(),
            });
        }

        Ok(ContactFields {
            name,
            phone_number: non_blank(self.phone_number),
            email,
        })
    }

    /// Validate and attach the owner.
    pub fn into_db_request(self, user_id: UserId) -> Result<ContactCreateDBRequest, Error> {
        let fields = self.validate()?;
        Ok(ContactCreateDBRequest {
            user_id,
            name: fields.name,
            phone_number: fields.phone_number,
            email: fields.email,
        })
    }

    pub fn into_update_request(self) -> Result<ContactUpdateDBRequest, Error> {
        let fields = self.validate()?;
        Ok(ContactUpdateDBRequest {
            name: fields.name,
            phone_number: fields.phone_number,
            email: fields.email,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// A contact as returned to its owner. The owner id is implied and not repeated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ContactResponse {
    pub id: ContactId,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl From<ContactDBResponse> for ContactResponse {
    fn from(db: ContactDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            phone_number: db.phone_number,
            email: db.email,
        }
    }
}

/// Query parameters for listing contacts
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListContactsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, phone_number: Option<&str>, email: Option<&str>) -> ContactCreate {
        ContactCreate {
            name: name.to_string(),
            phone_number: phone_number.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_into_db_request_trims_and_attaches_owner() {
        let request = input("  Ada  ", Some(" 555-0100 "), Some("ada@example.com"))
            .into_db_request(7)
            .unwrap();

        assert_eq!(request.user_id, 7);
        assert_eq!(request.name, "Ada");
        assert_eq!(request.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(request.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let request = input("Ada", Some("  "), Some("")).into_update_request().unwrap();
        assert_eq!(request.phone_number, None);
        assert_eq!(request.email, None);
    }

    #[test]
    fn test_rejects_blank_name_and_bad_email() {
        assert!(matches!(
            input("   ", None, None).into_db_request(1),
            Err(Error::BadRequest { .. })
        ));
        assert!(matches!(
            input("Ada", None, Some("not-an-email")).into_update_request(),
            Err(Error::BadRequest { .. })
        ));
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let contact: ContactCreate = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(contact.phone_number, None);
        assert_eq!(contact.email, None);
    }

    #[test]
    fn test_response_omits_owner() {
        let response = ContactResponse::from(ContactDBResponse {
            id: 3,
            name: "Ada".to_string(),
            phone_number: None,
            email: None,
            user_id: 7,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["id"], 3);
    }
}
