//! Request extractors for the session and the logged-in user.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::{guard::SessionGuard, session::CookieSession},
    db::{errors::DbError, handlers::Users},
    errors::{Error, Result},
};

/// The request's session. Never rejects: a missing or invalid cookie is an anonymous session.
impl FromRequestParts<AppState> for CookieSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        Ok(state.sessions.from_headers(&parts.headers))
    }
}

/// The logged-in user, resolved from the session subject.
///
/// Rejects with `Unauthenticated` when the session is anonymous or names a user that no longer
/// exists.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let mut session = state.sessions.from_headers(&parts.headers);
        let user_id = SessionGuard::new(&mut session).require_subject_id()?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(DbError::from(e)))?;
        let user = Users::new(&mut conn).get_by_id(user_id).await?.ok_or_else(|| {
            debug!(user_id, "Session names a user that no longer exists");
            Error::Unauthenticated { message: None }
        })?;

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::Session;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::test_utils::{create_test_pool, create_test_state};
    use axum::http::{Request, header};

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("http://localhost/users/me");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    fn cookie_for(state: &AppState, user_id: i64) -> String {
        let token = state.sessions.encode(&CookieSession::authenticated(user_id)).unwrap();
        format!("{}={}", state.sessions.cookie_name(), token)
    }

    #[tokio::test]
    async fn test_session_extractor_never_rejects() {
        let state = create_test_state(create_test_pool().await);

        let mut parts = parts_with_cookie(None);
        let session = CookieSession::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.subject_id(), None);

        let cookie = format!("{}=garbage", state.sessions.cookie_name());
        let mut parts = parts_with_cookie(Some(&cookie));
        let session = CookieSession::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.subject_id(), None);

        let mut parts = parts_with_cookie(Some(&cookie_for(&state, 12)));
        let session = CookieSession::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.subject_id(), Some(12));
    }

    #[tokio::test]
    async fn test_current_user_resolves_existing_user() {
        let pool = create_test_pool().await;
        let state = create_test_state(pool.clone());

        let user = {
            let mut conn = pool.acquire().await.unwrap();
            Users::new(&mut conn)
                .create(&UserCreateDBRequest {
                    email: "me@example.com".to_string(),
                    password_hash: "sha256:1000:Zm9v:YmFy".to_string(),
                })
                .await
                .unwrap()
        };

        let mut parts = parts_with_cookie(Some(&cookie_for(&state, user.id)));
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.email, "me@example.com");
    }

    #[tokio::test]
    async fn test_current_user_rejects_anonymous_and_unknown_subject() {
        let state = create_test_state(create_test_pool().await);

        let mut parts = parts_with_cookie(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let mut parts = parts_with_cookie(Some(&cookie_for(&state, 404)));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }
}
