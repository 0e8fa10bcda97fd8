//! Session-scoped authentication and ownership checks.
//!
//! A [`SessionGuard`] wraps the per-request session and answers two questions: is anyone logged
//! in, and does the logged-in subject own a given resource. It is also the only place that moves
//! a session between the anonymous and authenticated states.

use tracing::{debug, info};

use crate::{
    auth::session::Session,
    errors::{Error, Result},
    types::UserId,
};

/// Owner field checked when the caller does not name one.
pub const DEFAULT_OWNER_FIELD: &str = "user_id";

/// A resource that records which subject owns it.
pub trait OwnedResource {
    /// Value of the named owner field, or `None` if the resource has no such field.
    fn owner_id(&self, field: &str) -> Option<UserId>;
}

pub struct SessionGuard<'s, S: Session + ?Sized> {
    session: &'s mut S,
}

impl<'s, S: Session + ?Sized> SessionGuard<'s, S> {
    pub fn new(session: &'s mut S) -> Self {
        Self { session }
    }

    /// The authenticated subject, or `Unauthenticated`.
    pub fn require_subject_id(&self) -> Result<UserId> {
        self.session.subject_id().ok_or(Error::Unauthenticated { message: None })
    }

    /// Compare `resource`'s `owner_field` against the session subject.
    ///
    /// Fails with `Unauthenticated` when nobody is logged in, whatever `raise_on_mismatch` says.
    /// On a mismatch, fails with `Forbidden` if `raise_on_mismatch` is set and returns
    /// `Ok(false)` otherwise.
    pub fn is_owner<R: OwnedResource + ?Sized>(&self, resource: &R, owner_field: &str, raise_on_mismatch: bool) -> Result<bool> {
        let subject_id = self.require_subject_id()?;
        let owner_id = resource.owner_id(owner_field).ok_or_else(|| Error::Internal {
            operation: format!("read owner field '{owner_field}' of resource"),
        })?;

        let owns = owner_id == subject_id;
        if !owns && raise_on_mismatch {
            debug!(subject_id, owner_id, "Ownership check failed");
            return Err(Error::Forbidden {
                message: "You do not have access to this resource".to_string(),
            });
        }
        Ok(owns)
    }

    /// [`is_owner`](Self::is_owner) on [`DEFAULT_OWNER_FIELD`], failing on a mismatch.
    pub fn check_owner<R: OwnedResource + ?Sized>(&self, resource: &R) -> Result<()> {
        self.is_owner(resource, DEFAULT_OWNER_FIELD, true).map(|_| ())
    }

    /// Anonymous -> Authenticated, after the caller has verified credentials.
    pub fn login(&mut self, subject_id: UserId) {
        info!(subject_id, "Session authenticated");
        self.session.set_subject_id(subject_id);
    }

    /// Authenticated -> Anonymous.
    pub fn logout(&mut self) {
        if let Some(subject_id) = self.session.subject_id() {
            info!(subject_id, "Session cleared");
        }
        self.session.clear_subject_id();
    }
}
