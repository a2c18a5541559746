//! Request Principal
//!
//! The authenticated identity of one request: the session the auth gate
//! resolved from a verified bearer token. Only the gate constructs it.

use crate::domain::entity::session::Session;
use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    session: Session,
}

impl Principal {
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn user_id(&self) -> &UserId {
        &self.session.user_id
    }

    pub fn name(&self) -> &str {
        &self.session.name
    }

    pub fn email(&self) -> &str {
        &self.session.email
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.session.avatar_url.as_deref()
    }

    /// The bearer token this request presented
    pub fn token(&self) -> &str {
        &self.session.token
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
