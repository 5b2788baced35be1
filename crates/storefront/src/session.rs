//! Session mode, identity, and generation tracking.
//!
//! Identity is supplied by the external auth collaborator; this module
//! only models it as an input. The [`Generation`] counter implements the
//! stale-response rule: every sign-in/sign-out bumps the generation, and
//! remote responses issued under a superseded generation are discarded
//! by the sync engine instead of being applied.

use secrecy::SecretString;

use four_fun_core::UserId;

/// Authenticated identity handed to the engine at sign-in.
#[derive(Clone)]
pub struct Identity {
    /// Backend user id; cart/wishlist endpoints are scoped to it.
    pub user_id: UserId,
    /// Bearer token for the backend API.
    token: SecretString,
}

impl Identity {
    /// Create an identity from a user id and bearer token.
    #[must_use]
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: SecretString::from(token.into()),
        }
    }

    /// The bearer token. Only the backend client should call this, at
    /// the point the `Authorization` header is built.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Which persistence backend is authoritative for the current session.
#[derive(Debug, Clone, Default)]
pub enum SessionMode {
    /// No authenticated identity; the local adapter is authoritative.
    #[default]
    Anonymous,
    /// Signed in; the remote store is authoritative.
    Authenticated(Identity),
}

impl SessionMode {
    /// The identity, when authenticated.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(identity) => Some(identity),
        }
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Monotonically increasing session epoch.
///
/// In-flight remote requests are tagged with the generation they were
/// issued under; a response whose generation no longer matches the
/// current one must be ignored, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    /// Advance to the next epoch.
    pub fn bump(&mut self) {
        self.0 += 1;
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Policy applied to the anonymous cart when a session signs in.
///
/// The storefront historically discarded the anonymous cart and pulled
/// the remote one fresh; that stays the default, but it is a policy the
/// embedding application chooses explicitly rather than a baked-in
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Pull the remote cart fresh; the local snapshot is left untouched
    /// on disk and stops being authoritative.
    #[default]
    ReplaceWithRemote,
    /// Push each local line into the remote cart, clear local
    /// persistence, then pull the merged result.
    MergeLocalIntoRemote,
}
