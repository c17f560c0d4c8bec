//! Constants used throughout the Ripple library.
//!
//! This module provides central definitions for reserved field names and
//! reserved top-level nodes.

/// Reserved field carrying a node's own soul in flattened listener payloads.
pub const SOUL_FIELD: &str = "_";

/// Key of a soul reference object: `{"#": key}`.
pub const SOUL_KEY: &str = "#";

/// Top-level node under which every identity's namespace lives.
pub const USERS: &str = "_users";
