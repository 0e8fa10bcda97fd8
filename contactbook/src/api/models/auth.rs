//! Responses that change the session and therefore carry a `Set-Cookie` header.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::users::UserResponse;

/// Successful login: the user as JSON plus the new session cookie.
#[derive(Debug)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)], Json(self.user)).into_response()
    }
}

/// Successful logout: no body, and a cookie that expires immediately.
#[derive(Debug)]
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (StatusCode::NO_CONTENT, [(header::SET_COOKIE, self.cookie)]).into_response()
    }
}
