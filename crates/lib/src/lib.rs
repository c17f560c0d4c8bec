//!
//! Ripple: an in-memory reactive graph store.
//! This library emulates the data and subscription model of a decentralized graph database
//! closely enough to drive deterministic tests of code written against it.
//!
//! ## Core Concepts
//!
//! Ripple is built around several key concepts:
//!
//! * **Nodes (`node::Node`)**: The addressable unit of the graph. A node is materialized lazily the
//!   first time it is addressed and commits to one kind (leaf, edge or set) on first real use.
//! * **Listeners (`node::listeners`)**: Ordered subscriptions on a node. Subscribing replays the
//!   current data synchronously; writes fan out to listeners before the writer is acknowledged.
//! * **Edges**: A node can alias another node. The alias relays the target's data live and goes
//!   quiet as soon as it is retargeted or nulled out.
//! * **Sets (`node::SetView`)**: Collections of generated-key children, iterated with `map()`.
//! * **Graph (`graph::Graph`)**: The namespace root. It owns the scheduler used for deferred
//!   acknowledgments and hands out the user namespace (`graph::User`).
//! * **Sessions (`session::SessionStore`)**: Token to identity mapping with expiry, for hosts that
//!   put the graph behind a transport.

pub mod clock;
pub mod config;
pub mod constants;
pub mod graph;
pub mod node;
pub mod scheduler;
pub mod session;
pub mod value;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use config::{GraphOptions, IdentityScheme, SessionConfig};
pub use graph::{ForeignUser, Graph, Identity, User};
pub use node::{Ack, Node, NodeKind, SetView, StoreError};
pub use scheduler::Scheduler;
pub use session::{Session, SessionError, SessionStore};
pub use value::{Field, GraphValue, ListenerData, NodeRecord, Primitive, Soul, SoulValue};

/// Result type used throughout the Ripple library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Ripple library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured store errors from the node module
    #[error(transparent)]
    Store(node::StoreError),

    /// Structured session errors from the session module
    #[error(transparent)]
    Session(session::SessionError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Store(_) => "node",
            Error::Session(_) => "session",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error is a malformed-argument error (caller bug).
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error is an operation incompatible with a node's committed kind.
    pub fn is_logic_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_logic_error(),
            _ => false,
        }
    }

    /// Check if this error signals a broken internal invariant.
    pub fn is_assertion(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_assertion(),
            _ => false,
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Session(session_err) => session_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates an expired session.
    pub fn is_expired(&self) -> bool {
        match self {
            Error::Session(session_err) => session_err.is_expired(),
            _ => false,
        }
    }

    /// Check if this error is store-related.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    /// Check if this error is session-related.
    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::Session(_))
    }
}
