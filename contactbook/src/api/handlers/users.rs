//! Registration, login, logout and the current user.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::{
        json::JsonBody,
        models::{
            auth::{LoginResponse, LogoutResponse},
            users::{CurrentUser, UserCreate, UserLogin, UserResponse},
        },
    },
    auth::{guard::SessionGuard, password, session::CookieSession},
    db::{errors::DbError, handlers::Users, models::users::UserCreateDBRequest},
    errors::{Error, Result},
    validation::normalize_email,
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid credentials".to_string()),
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/users",
    request_body = UserCreate,
    tag = "users",
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 403, description = "Already logged in"),
        (status = 409, description = "Email already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    mut session: CookieSession,
    JsonBody(request): JsonBody<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if SessionGuard::new(&mut session).require_subject_id().is_ok() {
        return Err(Error::Forbidden {
            message: "Must be logged out before registering a new user".to_string(),
        });
    }

    let email = request.validate(&state.config.auth.password)?;

    // Hash the password on a blocking thread to avoid blocking async runtime
    let iterations = state.config.auth.password.hash_iterations;
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password_with_iterations(&password, iterations))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest { email, password_hash })
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => Error::Conflict {
                message: "An account with this email address already exists".to_string(),
            },
            other => Error::Database(other),
        })?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = UserLogin,
    tag = "users",
    responses(
        (status = 200, description = "Logged in; the session cookie is set", body = UserResponse),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    mut session: CookieSession,
    JsonBody(request): JsonBody<UserLogin>,
) -> Result<LoginResponse> {
    let email = normalize_email(&request.email).map_err(|message| Error::BadRequest { message })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_user_by_email(&email).await?;

    // Unknown emails are checked against a placeholder at the configured cost, so both failure
    // paths spend the same time hashing
    let hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => password::placeholder_hash(state.config.auth.password.hash_iterations),
    };

    // Verify on a blocking thread, using the iteration count stored with the credential
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    let user = match user {
        Some(user) if is_valid => user,
        _ => return Err(invalid_credentials()),
    };

    SessionGuard::new(&mut session).login(user.id);
    let cookie = state.sessions.set_cookie_header(&session)?;

    Ok(LoginResponse {
        user: user.into(),
        cookie,
    })
}

/// Log out, clearing the session cookie
#[utoipa::path(
    post,
    path = "/users/logout",
    tag = "users",
    responses(
        (status = 204, description = "Logged out; the session cookie is expired"),
        (status = 401, description = "Not logged in"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, mut session: CookieSession) -> Result<LogoutResponse> {
    let mut guard = SessionGuard::new(&mut session);
    guard.require_subject_id()?;
    guard.logout();

    let cookie = state.sessions.set_cookie_header(&session)?;
    Ok(LogoutResponse { cookie })
}

/// Get the logged-in user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The current user", body = UserResponse),
        (status = 401, description = "Not logged in"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(current_user: CurrentUser) -> Json<UserResponse> {
    Json(current_user.into())
}
