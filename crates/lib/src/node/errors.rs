//! Error types for graph store operations.
//!
//! Every failure surfaced by a node operation falls into one of three kinds:
//! type errors (malformed arguments), logic errors (an operation incompatible
//! with a node's committed kind or with the root restrictions) and assertion
//! errors (an internal invariant is broken, which is a store bug).

use thiserror::Error;

use super::NodeKind;

/// Classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed call arguments. Always synchronous, never retried.
    Type,
    /// Operation incompatible with a node's committed kind or a root restriction.
    Logic,
    /// Internal invariant violation. Not recoverable.
    Assertion,
}

/// Errors that can occur during node operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `kind()` and `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation attempted on the keyless namespace root.
    #[error("`{operation}` is not permitted on the root node")]
    RootOperation {
        /// The operation that was rejected
        operation: &'static str,
    },

    /// `get` called with an empty key.
    #[error("Expected a non-empty string key")]
    InvalidKey,

    /// Tried to descend into a node holding a primitive or null.
    #[error("Tried to get subkey `{key}` of a primitive graph node")]
    PrimitiveDescent {
        /// The key that was requested
        key: String,
    },

    /// Operation implies a different kind than the one the node committed to.
    #[error("`{operation}` is incompatible with a node already used as {kind}")]
    KindConflict {
        /// The operation that was rejected
        operation: &'static str,
        /// The kind the node is committed to
        kind: NodeKind,
    },

    /// Data shape incompatible with the data the node currently holds.
    #[error("Tried to write {found} to a node holding {held}")]
    ShapeConflict {
        /// What the node currently holds
        held: &'static str,
        /// What the caller tried to write
        found: &'static str,
    },

    /// Non-null data written to an edge node.
    #[error("Tried to put a primitive or object to edge node `{key}`")]
    EdgeOverwrite {
        /// Key of the edge node
        key: String,
    },

    /// Edge written to a child of the unauthenticated namespace root.
    #[error("Invalid graph: cannot put an edge onto `{key}`, a child of the root")]
    InvalidGraph {
        /// Key of the top-level node
        key: String,
    },

    /// The node already aliases the given target.
    #[error("Trying to put the same edge on node `{key}`")]
    DuplicateEdge {
        /// Key of the aliasing node
        key: String,
    },

    /// Edge onto a node owned by a different graph.
    #[error("Cannot reference `{key}`: it belongs to another graph")]
    ForeignNode {
        /// Key of the referenced node
        key: String,
    },

    /// Primitive or null written directly under the namespace root.
    #[error(
        "Data saved to the root level of the graph must be a node (an object), not {found} at `{key}`"
    )]
    RootLevelPrimitive {
        /// Key of the top-level node
        key: String,
        /// Description of the rejected value
        found: String,
    },

    /// Value kind the graph cannot store.
    #[error("Unsupported value: {reason}")]
    UnsupportedValue {
        /// Why the value was rejected
        reason: String,
    },

    /// A map with no entries was written.
    #[error("Cannot write an empty node")]
    EmptyNode,

    /// Aliasing would make a node relay its own changes back to itself.
    #[error("Aliasing `{key}` would create a cycle")]
    AliasCycle {
        /// Key of the node that would close the cycle
        key: String,
    },

    /// User namespace used before authenticating.
    #[error("Tried to call {operation}() without authenticating first")]
    NotAuthenticated {
        /// The operation that was rejected
        operation: &'static str,
    },

    /// Internal consistency violation.
    #[error("Assertion error: {reason}")]
    Assertion {
        /// Description of the broken invariant
        reason: String,
    },
}

impl StoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidKey
            | StoreError::UnsupportedValue { .. }
            | StoreError::EmptyNode
            | StoreError::AliasCycle { .. } => ErrorKind::Type,
            StoreError::Assertion { .. } => ErrorKind::Assertion,
            StoreError::RootOperation { .. }
            | StoreError::PrimitiveDescent { .. }
            | StoreError::KindConflict { .. }
            | StoreError::ShapeConflict { .. }
            | StoreError::EdgeOverwrite { .. }
            | StoreError::InvalidGraph { .. }
            | StoreError::DuplicateEdge { .. }
            | StoreError::ForeignNode { .. }
            | StoreError::RootLevelPrimitive { .. }
            | StoreError::NotAuthenticated { .. } => ErrorKind::Logic,
        }
    }

    /// Check if this error is a type error
    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    /// Check if this error is a logic error
    pub fn is_logic_error(&self) -> bool {
        self.kind() == ErrorKind::Logic
    }

    /// Check if this error is an assertion error
    pub fn is_assertion(&self) -> bool {
        self.kind() == ErrorKind::Assertion
    }

    /// Check if this error was caused by the root restrictions
    pub fn is_root_error(&self) -> bool {
        matches!(
            self,
            StoreError::RootOperation { .. }
                | StoreError::RootLevelPrimitive { .. }
                | StoreError::InvalidGraph { .. }
        )
    }

    /// Get the operation name if this is an operation-specific error
    pub fn operation(&self) -> Option<&str> {
        match self {
            StoreError::RootOperation { operation }
            | StoreError::KindConflict { operation, .. }
            | StoreError::NotAuthenticated { operation } => Some(operation),
            _ => None,
        }
    }

    pub(crate) fn assertion(reason: impl Into<String>) -> Self {
        StoreError::Assertion {
            reason: reason.into(),
        }
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
