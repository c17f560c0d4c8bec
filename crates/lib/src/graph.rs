//! Namespace root and user namespaces.
//!
//! A [`Graph`] owns a detached root node and the scheduler shared by every
//! node reachable from it. The root only supports navigation: data written
//! directly under it must be node-shaped.
//!
//! [`User`] is the authenticated-session namespace. Authentication is
//! emulated: the identity is synthetic and nothing is encrypted, which is
//! enough for code that only needs per-identity namespaces. Each identity's
//! data lives under `<users node>/<public key>`.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Result,
    config::{GraphOptions, IdentityScheme},
    node::{Ack, Node, StoreError},
    scheduler::Scheduler,
    value::Soul,
};

/// Identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub alias: String,
    /// Public key; names the identity's namespace
    pub public_key: String,
}

impl Identity {
    /// Derive the identity for `alias` under the given scheme.
    pub fn new(alias: impl Into<String>, scheme: IdentityScheme) -> Self {
        let alias = alias.into();
        let public_key = match scheme {
            IdentityScheme::Alias => alias.clone(),
            IdentityScheme::Random => hex::encode(rand::random::<[u8; 32]>()),
        };
        Self { alias, public_key }
    }
}

/// An in-memory graph.
///
/// ```
/// use ripple::Graph;
///
/// let graph = Graph::new();
/// let profile = graph.get("profile").unwrap();
/// profile.put([("name", "alice")].into_iter().collect::<ripple::GraphValue>()).unwrap();
///
/// profile.get("name").unwrap().once(|data, key| {
///     assert_eq!(key, "name");
///     assert_eq!(data.to_json(), serde_json::json!("alice"));
/// }).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Graph {
    root: Node,
    scheduler: Rc<Scheduler>,
    options: Rc<GraphOptions>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_options(GraphOptions::default())
    }

    pub fn with_options(options: GraphOptions) -> Self {
        let scheduler = Rc::new(Scheduler::new());
        let root = Node::root(scheduler.clone());
        if let Some(alias) = &options.pre_authenticated {
            let identity = Identity::new(alias.as_str(), options.identity_scheme);
            info!(alias = %alias, public_key = %identity.public_key, "Graph pre-authenticated");
            root.set_auth(Some(identity));
        }
        Self {
            root,
            scheduler,
            options: Rc::new(options),
        }
    }

    /// Navigate from the root.
    pub fn get(&self, key: &str) -> Result<Node> {
        self.root.get(key)
    }

    /// The keyless namespace root.
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// The session namespace. All handles share the root's authentication state.
    pub fn user(&self) -> User {
        User {
            graph: self.clone(),
        }
    }

    /// Read-only view of another identity's namespace.
    pub fn user_of(&self, public_key: impl Into<String>) -> ForeignUser {
        ForeignUser {
            graph: self.clone(),
            public_key: public_key.into(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run one scheduler turn. See [`Scheduler::tick`].
    pub fn tick(&self) -> usize {
        self.scheduler.tick()
    }

    /// Run deferred work until none is left. See [`Scheduler::run_until_idle`].
    pub fn run_until_idle(&self) -> usize {
        self.scheduler.run_until_idle()
    }

    /// Number of deferred tasks waiting for a turn.
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn soul(&self) -> Soul {
        self.root.soul()
    }

    fn namespace(&self, public_key: &str) -> Result<Node> {
        self.root.get(&self.options.users_node)?.get(public_key)
    }
}

/// The authenticated-session namespace of a [`Graph`].
#[derive(Debug, Clone)]
pub struct User {
    graph: Graph,
}

impl User {
    /// Authenticate as `alias`.
    ///
    /// Outcome is reported through `ack`. On success the identity is stored on
    /// the namespace root and [`User::get`] becomes usable.
    pub fn auth(&self, alias: &str, password: &str, ack: impl FnOnce(Ack)) {
        let options = self.graph.options();
        if options.fail_auth {
            warn!(alias, "Authentication rejected");
            return ack(Ack::error("Wrong user or password."));
        }
        if alias.is_empty() || password.is_empty() {
            return ack(Ack::error("Alias and password are required."));
        }

        let identity = Identity::new(alias, options.identity_scheme);
        info!(alias, public_key = %identity.public_key, "User authenticated");
        self.graph.root.set_auth(Some(identity));
        ack(Ack::ok());
    }

    /// Register `alias`. Does not authenticate.
    pub fn create(&self, alias: &str, password: &str, ack: impl FnOnce(Ack)) {
        if self.graph.options().fail_create {
            warn!(alias, "User creation rejected");
            return ack(Ack::error("User already created!"));
        }
        if alias.is_empty() || password.is_empty() {
            return ack(Ack::error("Alias and password are required."));
        }
        info!(alias, "User created");
        ack(Ack::ok());
    }

    /// Drop the authenticated identity.
    pub fn leave(&self) {
        if let Some(identity) = self.graph.root.auth() {
            info!(alias = %identity.alias, "User left");
        }
        self.graph.root.set_auth(None);
    }

    /// The authenticated identity, if any.
    pub fn is(&self) -> Option<Identity> {
        self.graph.root.auth()
    }

    /// Navigate within the authenticated identity's namespace.
    pub fn get(&self, key: &str) -> Result<Node> {
        let identity = self
            .is()
            .ok_or(StoreError::NotAuthenticated { operation: "get" })?;
        self.graph.namespace(&identity.public_key)?.get(key)
    }

    pub fn soul(&self) -> Soul {
        self.graph.soul()
    }
}

/// Read-only view of another identity's namespace.
#[derive(Debug, Clone)]
pub struct ForeignUser {
    graph: Graph,
    public_key: String,
}

impl ForeignUser {
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Navigate within the identity's namespace.
    pub fn get(&self, key: &str) -> Result<Node> {
        self.graph.namespace(&self.public_key)?.get(key)
    }
}
