//! Database repository for contacts.

use crate::types::{ContactId, UserId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::contacts::{ContactCreateDBRequest, ContactDBResponse, ContactUpdateDBRequest},
};
use sqlx::SqliteConnection;
use tracing::instrument;

/// Filter for listing one owner's contacts
#[derive(Debug, Clone)]
pub struct ContactFilter {
    pub user_id: UserId,
    pub skip: i64,
    pub limit: i64,
}

impl ContactFilter {
    pub fn new(user_id: UserId, skip: i64, limit: i64) -> Self {
        Self { user_id, skip, limit }
    }
}

pub struct Contacts<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Contacts<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Number of contacts owned by `user_id`, ignoring pagination.
    #[instrument(skip(self), err)]
    pub async fn count(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Contacts<'c> {
    type CreateRequest = ContactCreateDBRequest;
    type UpdateRequest = ContactUpdateDBRequest;
    type Response = ContactDBResponse;
    type Id = ContactId;
    type Filter = ContactFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let contact = sqlx::query_as::<_, ContactDBResponse>(
            r#"
            INSERT INTO contacts (name, phone_number, email, user_id)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, phone_number, email, user_id
            "#,
        )
        .bind(&request.name)
        .bind(&request.phone_number)
        .bind(&request.email)
        .bind(request.user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(contact)
    }

    /// Fetch by id regardless of owner; ownership is checked by the caller.
    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let contact = sqlx::query_as::<_, ContactDBResponse>(
            "SELECT id, name, phone_number, email, user_id FROM contacts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(contact)
    }

    #[instrument(skip(self, filter), fields(user_id = filter.user_id, limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let contacts = sqlx::query_as::<_, ContactDBResponse>(
            r#"
            SELECT id, name, phone_number, email, user_id FROM contacts
            WHERE user_id = ?
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(contacts)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let contact = sqlx::query_as::<_, ContactDBResponse>(
            r#"
            UPDATE contacts SET name = ?, phone_number = ?, email = ?
            WHERE id = ?
            RETURNING id, name, phone_number, email, user_id
            "#,
        )
        .bind(&request.name)
        .bind(&request.phone_number)
        .bind(&request.email)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::test_utils::create_test_pool;
    use sqlx::SqlitePool;

    async fn create_user(pool: &SqlitePool, email: &str) -> UserId {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                password_hash: "sha256:1000:Zm9v:YmFy".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn contact(user_id: UserId, name: &str) -> ContactCreateDBRequest {
        ContactCreateDBRequest {
            user_id,
            name: name.to_string(),
            phone_number: Some("555-0100".to_string()),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_contact() {
        let pool = create_test_pool().await;
        let owner = create_user(&pool, "owner@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Contacts::new(&mut conn);

        let created = repo.create(&contact(owner, "Ada")).await.unwrap();
        assert_eq!(created.name, "Ada");
        assert_eq!(created.user_id, owner);
        assert_eq!(created.phone_number.as_deref(), Some("555-0100"));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(repo.get_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner_and_paginated() {
        let pool = create_test_pool().await;
        let alice = create_user(&pool, "alice@example.com").await;
        let bob = create_user(&pool, "bob@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Contacts::new(&mut conn);

        for name in ["A1", "A2", "A3"] {
            repo.create(&contact(alice, name)).await.unwrap();
        }
        repo.create(&contact(bob, "B1")).await.unwrap();

        let all = repo.list(&ContactFilter::new(alice, 0, 100)).await.unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A1", "A2", "A3"]);

        let page = repo.list(&ContactFilter::new(alice, 1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "A2");

        let bobs = repo.list(&ContactFilter::new(bob, 0, 100)).await.unwrap();
        assert_eq!(bobs.len(), 1);

        assert_eq!(repo.count(alice).await.unwrap(), 3);
        assert_eq!(repo.count(bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_contact() {
        let pool = create_test_pool().await;
        let owner = create_user(&pool, "owner@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Contacts::new(&mut conn);

        let created = repo.create(&contact(owner, "Ada")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &ContactUpdateDBRequest {
                    name: "Ada Lovelace".to_string(),
                    phone_number: None,
                    email: Some("ada@example.com".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.phone_number, None);
        assert_eq!(updated.email.as_deref(), Some("ada@example.com"));
        assert_eq!(updated.user_id, owner);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_contact_is_not_found() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Contacts::new(&mut conn);

        let err = repo
            .update(
                42,
                &ContactUpdateDBRequest {
                    name: "Nobody".to_string(),
                    phone_number: None,
                    email: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_contact_requires_existing_owner() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Contacts::new(&mut conn);

        let err = repo.create(&contact(999, "Orphan")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "got {err:?}");
    }
}
