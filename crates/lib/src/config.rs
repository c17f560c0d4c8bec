//! Configuration for graphs and session stores.
//!
//! Both types deserialize with `serde`, missing fields falling back to their
//! defaults, so they can be embedded in replay scripts or host configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::USERS;

/// How the synthetic public key of an authenticated identity is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScheme {
    /// The alias doubles as the public key, so user namespaces are predictable in tests
    #[default]
    Alias,
    /// A random 32-byte hex key per authentication
    Random,
}

/// Options for a [`Graph`](crate::Graph).
///
/// ```
/// use ripple::{GraphOptions, IdentityScheme};
///
/// let options = GraphOptions::default()
///     .pre_authenticated("alice")
///     .identity_scheme(IdentityScheme::Random);
/// assert_eq!(options.pre_authenticated.as_deref(), Some("alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// Every `User::auth` call acknowledges with an error
    pub fail_auth: bool,
    /// Every `User::create` call acknowledges with an error
    pub fail_create: bool,
    /// Alias the graph is authenticated as from the start
    pub pre_authenticated: Option<String>,
    pub identity_scheme: IdentityScheme,
    /// Top-level node holding every identity's namespace
    pub users_node: String,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            fail_auth: false,
            fail_create: false,
            pre_authenticated: None,
            identity_scheme: IdentityScheme::default(),
            users_node: USERS.to_string(),
        }
    }
}

impl GraphOptions {
    pub fn fail_auth(mut self, fail: bool) -> Self {
        self.fail_auth = fail;
        self
    }

    pub fn fail_create(mut self, fail: bool) -> Self {
        self.fail_create = fail;
        self
    }

    pub fn pre_authenticated(mut self, alias: impl Into<String>) -> Self {
        self.pre_authenticated = Some(alias.into());
        self
    }

    pub fn identity_scheme(mut self, scheme: IdentityScheme) -> Self {
        self.identity_scheme = scheme;
        self
    }

    pub fn users_node(mut self, key: impl Into<String>) -> Self {
        self.users_node = key.into();
        self
    }
}

/// Options for a [`SessionStore`](crate::SessionStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of a session after issue or last touch, in seconds
    pub ttl_secs: u64,
    /// Period of the background eviction task, in seconds
    pub eviction_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            eviction_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic
        Duration::from_secs(self.eviction_interval_secs.max(1))
    }
}
