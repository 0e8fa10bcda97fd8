//! Client-side sessions carried in a signed cookie.
//!
//! The session payload is a single optional `user_id`, signed as an HS256 JWT with the configured
//! secret key. The server keeps no session store: a cookie that is missing, expired, tampered
//! with, or otherwise undecodable is simply an anonymous session.

use std::time::Duration;

use axum::http::{HeaderMap, header};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{config::Config, errors::Error, types::UserId};

/// The narrow view of a session the rest of the application is allowed to use.
pub trait Session {
    /// The authenticated subject, if any
    fn subject_id(&self) -> Option<UserId>;

    fn set_subject_id(&mut self, id: UserId);

    fn clear_subject_id(&mut self);
}

/// Decoded contents of the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSession {
    user_id: Option<UserId>,
}

impl CookieSession {
    /// A session with no subject
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self { user_id: Some(user_id) }
    }
}

impl Session for CookieSession {
    fn subject_id(&self) -> Option<UserId> {
        self.user_id
    }

    fn set_subject_id(&mut self, id: UserId) {
        self.user_id = Some(id);
    }

    fn clear_subject_id(&mut self) {
        self.user_id = None;
    }
}

/// Signed payload stored in the cookie
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    iat: i64,
    exp: i64,
}

/// Encodes sessions into cookies and back, using keys derived from [`Config`].
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
    cookie_secure: bool,
    cookie_same_site: String,
    max_age: Duration,
}

impl SessionCodec {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
            operation: "build session codec: secret_key is required".to_string(),
        })?;
        let session = &config.auth.session;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            validation: Validation::default(),
            cookie_name: session.cookie_name.clone(),
            cookie_secure: session.cookie_secure,
            cookie_same_site: session.cookie_same_site.clone(),
            max_age: session.timeout,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Sign a session into a cookie value
    pub fn encode(&self, session: &CookieSession) -> Result<String, Error> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            user_id: session.user_id,
            iat: now,
            exp: now + self.max_age.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| Error::Internal {
            operation: format!("sign session cookie: {e}"),
        })
    }

    /// Verify and decode a cookie value
    pub fn decode(&self, token: &str) -> Result<CookieSession, Error> {
        use jsonwebtoken::errors::ErrorKind;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::ExpiredSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::ImmatureSignature
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },
            _ => Error::Internal {
                operation: format!("verify session cookie: {e}"),
            },
        })?;

        Ok(CookieSession {
            user_id: data.claims.user_id,
        })
    }

    /// Read the session from a request's `Cookie` header.
    ///
    /// Never fails: anything that does not decode cleanly yields an anonymous session.
    pub fn from_headers(&self, headers: &HeaderMap) -> CookieSession {
        for value in headers.get_all(header::COOKIE) {
            let Ok(cookie_str) = value.to_str() else {
                debug!("Ignoring non-ASCII cookie header");
                continue;
            };

            for cookie in cookie_str.split(';') {
                let Some((name, token)) = cookie.trim().split_once('=') else {
                    continue;
                };
                if name != self.cookie_name {
                    continue;
                }
                match self.decode(token) {
                    Ok(session) => return session,
                    Err(e) => debug!("Discarding invalid session cookie: {e}"),
                }
            }
        }

        CookieSession::anonymous()
    }

    /// `Set-Cookie` value persisting `session` on the client.
    ///
    /// An anonymous session produces an immediately expiring cookie.
    pub fn set_cookie_header(&self, session: &CookieSession) -> Result<String, Error> {
        let (value, max_age) = if session.subject_id().is_some() {
            (self.encode(session)?, self.max_age.as_secs())
        } else {
            (String::new(), 0)
        };

        let secure = if self.cookie_secure { "; Secure" } else { "" };
        Ok(format!(
            "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
            self.cookie_name, value, secure, self.cookie_same_site, max_age
        ))
    }
}
