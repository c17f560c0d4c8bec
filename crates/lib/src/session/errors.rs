//! Error types for the session store.

use thiserror::Error;

/// Errors that can occur during session lookups.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session was ever issued under this token, or it was revoked or evicted.
    #[error("Session not found: {token}")]
    NotFound {
        /// The token that was looked up
        token: String,
    },

    /// The session exists but its lifetime has run out.
    #[error("Session expired: {token}")]
    Expired {
        /// The token that was looked up
        token: String,
    },
}

impl SessionError {
    /// Check if this error indicates an unknown token
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }

    /// Check if this error indicates an expired session
    pub fn is_expired(&self) -> bool {
        matches!(self, SessionError::Expired { .. })
    }

    /// The token the failed lookup was for
    pub fn token(&self) -> &str {
        match self {
            SessionError::NotFound { token } | SessionError::Expired { token } => token,
        }
    }
}

// Conversion from SessionError to the main Error type
impl From<SessionError> for crate::Error {
    fn from(err: SessionError) -> Self {
        crate::Error::Session(err)
    }
}
