//! Contact CRUD, scoped to the logged-in owner.
//!
//! Listing and creation act on the current user's own contacts. Single-contact routes look the
//! contact up by id first (404 if absent) and then require the session subject to own it (403
//! otherwise).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::SqliteConnection;

use crate::{
    AppState,
    api::{
        json::JsonBody,
        models::{
            contacts::{ContactCreate, ContactResponse, ContactUpdate, ListContactsQuery},
            pagination::PaginatedResponse,
            users::CurrentUser,
        },
    },
    auth::{guard::SessionGuard, session::CookieSession},
    db::{
        handlers::{Contacts, Repository, contacts::ContactFilter},
        models::contacts::ContactDBResponse,
    },
    errors::{Error, Result},
    types::ContactId,
};

/// Fetch a contact and check the session subject owns it.
async fn get_owned_contact(
    conn: &mut SqliteConnection,
    guard: &SessionGuard<'_, CookieSession>,
    id: ContactId,
) -> Result<ContactDBResponse> {
    let contact = Contacts::new(conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Contact".to_string(),
        id: id.to_string(),
    })?;
    guard.check_owner(&contact)?;
    Ok(contact)
}

#[utoipa::path(
    get,
    path = "/contacts",
    tag = "contacts",
    summary = "List your contacts",
    params(ListContactsQuery),
    responses(
        (status = 200, description = "A page of the current user's contacts", body = PaginatedResponse<ContactResponse>),
        (status = 401, description = "Not logged in"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn list_contacts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<PaginatedResponse<ContactResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Contacts::new(&mut conn);

    let contacts = repo.list(&ContactFilter::new(current_user.id, skip, limit)).await?;
    let total_count = repo.count(current_user.id).await?;

    Ok(Json(PaginatedResponse::new(
        contacts.into_iter().map(ContactResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/contacts",
    tag = "contacts",
    summary = "Create a contact",
    request_body = ContactCreate,
    responses(
        (status = 201, description = "Contact created", body = ContactResponse),
        (status = 400, description = "Invalid contact details"),
        (status = 401, description = "Not logged in"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn create_contact(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(request): JsonBody<ContactCreate>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    let request = request.into_db_request(current_user.id)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let contact = Contacts::new(&mut conn).create(&request).await?;

    Ok((StatusCode::CREATED, Json(contact.into())))
}

#[utoipa::path(
    get,
    path = "/contacts/{id}",
    tag = "contacts",
    summary = "Get a contact",
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "The contact", body = ContactResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Contact belongs to another user"),
        (status = 404, description = "Contact not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(contact_id = id))]
pub async fn get_contact(
    State(state): State<AppState>,
    mut session: CookieSession,
    Path(id): Path<ContactId>,
) -> Result<Json<ContactResponse>> {
    let guard = SessionGuard::new(&mut session);
    guard.require_subject_id()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let contact = get_owned_contact(&mut conn, &guard, id).await?;

    Ok(Json(contact.into()))
}

#[utoipa::path(
    put,
    path = "/contacts/{id}",
    tag = "contacts",
    summary = "Replace a contact's details",
    params(("id" = i64, Path, description = "Contact ID")),
    request_body = ContactCreate,
    responses(
        (status = 200, description = "The updated contact", body = ContactResponse),
        (status = 400, description = "Invalid contact details"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Contact belongs to another user"),
        (status = 404, description = "Contact not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(contact_id = id))]
pub async fn update_contact(
    State(state): State<AppState>,
    mut session: CookieSession,
    Path(id): Path<ContactId>,
    JsonBody(request): JsonBody<ContactUpdate>,
) -> Result<Json<ContactResponse>> {
    let guard = SessionGuard::new(&mut session);
    guard.require_subject_id()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    get_owned_contact(&mut tx, &guard, id).await?;

    let request = request.into_update_request()?;
    let contact = Contacts::new(&mut tx).update(id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(contact.into()))
}

#[utoipa::path(
    delete,
    path = "/contacts/{id}",
    tag = "contacts",
    summary = "Delete a contact",
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Contact belongs to another user"),
        (status = 404, description = "Contact not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(contact_id = id))]
pub async fn delete_contact(
    State(state): State<AppState>,
    mut session: CookieSession,
    Path(id): Path<ContactId>,
) -> Result<StatusCode> {
    let guard = SessionGuard::new(&mut session);
    guard.require_subject_id()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    get_owned_contact(&mut tx, &guard, id).await?;

    Contacts::new(&mut tx).delete(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
