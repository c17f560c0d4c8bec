//! Graph nodes.
//!
//! A [`Node`] is a cheap-to-clone handle to one addressable unit of the graph.
//! Nodes are materialized lazily by [`Node::get`] and commit to a
//! [`NodeKind`] on first real use:
//!
//! - `put` of a primitive or a map commits `Leaf`
//! - `put` of another node commits `Edge` (the node aliases the other one)
//! - `set` (or `map` on an undetermined node) commits `Set`
//!
//! Committed kinds are terminal. Any later operation implying a different kind
//! fails with a logic error.
//!
//! Ownership only flows downwards: a node owns its children and the target of
//! its alias. Children and alias targets keep weak relay links back to the
//! nodes that depend on them, and those links are re-validated every time they
//! fire, so a retargeted alias or a replaced child goes quiet without any
//! explicit unsubscribe.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    Result,
    graph::Identity,
    scheduler::Scheduler,
    value::{GraphValue, ListenerData, Primitive, Soul, SoulValue},
};

pub mod errors;
pub mod listeners;
pub mod set_view;

pub use errors::{ErrorKind, StoreError};
pub use listeners::Listener;
pub use set_view::SetView;

/// The role a node has committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// Not yet used in a way that determines its role
    #[default]
    Undefined,
    /// Holds a primitive, null or a map of children
    Leaf,
    /// Aliases another node
    Edge,
    /// Collection of generated-key items
    Set,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Undefined => "undefined",
            NodeKind::Leaf => "leaf",
            NodeKind::Edge => "edge",
            NodeKind::Set => "set",
        };
        f.write_str(name)
    }
}

/// Acknowledgment handed to write callbacks.
///
/// Absence of an error means the write is durable for the rest of the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub err: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self { err: None }
    }

    pub fn error(err: impl Into<String>) -> Self {
        Self {
            err: Some(err.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

pub(crate) type AckFn = Box<dyn FnOnce(Ack)>;

/// One entry of a node's children map.
#[derive(Clone)]
pub(crate) enum ChildSlot {
    /// Inline null
    Null,
    /// Inline primitive
    Primitive(Primitive),
    /// Owned child node
    Node(Node),
}

/// What a node currently holds.
pub(crate) enum NodeValue {
    Undefined,
    Null,
    Primitive(Primitive),
    Children(IndexMap<String, ChildSlot>),
    Alias(Node),
}

impl NodeValue {
    fn describe(&self) -> &'static str {
        match self {
            NodeValue::Undefined => "nothing",
            NodeValue::Null => "null",
            NodeValue::Primitive(_) => "a primitive",
            NodeValue::Children(_) => "children",
            NodeValue::Alias(_) => "an edge",
        }
    }
}

pub(crate) struct NodeInner {
    /// `None` only for the namespace root
    key: Option<String>,
    kind: NodeKind,
    value: NodeValue,
    /// Durable `on` subscriptions
    listeners: Vec<Listener>,
    /// Durable `map().on` subscriptions
    set_listeners: Vec<Listener>,
    /// Nodes that depend on this one: the owning parent, and nodes aliasing it
    relays: Vec<Weak<RefCell<NodeInner>>>,
    is_child_of_root: bool,
    /// Authenticated identity; only ever set on the namespace root
    auth: Option<Identity>,
    /// Non-zero while a map put is being applied to this node
    batch_depth: usize,
    scheduler: Rc<Scheduler>,
}

/// How a dependent node is linked to a node that changed.
enum Link {
    /// The dependent owns the source under this key
    Child,
    /// The dependent currently aliases the source
    Alias,
    /// The link was severed since it was registered
    Stale,
}

/// Handle to a graph node.
///
/// Handles are reference counted; cloning is cheap and all clones address the
/// same node. Nodes are single-threaded (`!Send`).
#[derive(Clone)]
pub struct Node {
    inner: Rc<RefCell<NodeInner>>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Node")
                .field("key", &inner.key)
                .field("kind", &inner.kind)
                .field("value", &inner.value.describe())
                .field("listeners", &inner.listeners.len())
                .finish(),
            Err(_) => f.write_str("Node { <borrowed> }"),
        }
    }
}

impl Node {
    pub(crate) fn root(scheduler: Rc<Scheduler>) -> Self {
        Self::new(None, false, scheduler)
    }

    fn new(key: Option<String>, is_child_of_root: bool, scheduler: Rc<Scheduler>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeInner {
                key,
                kind: NodeKind::Undefined,
                value: NodeValue::Undefined,
                listeners: Vec::new(),
                set_listeners: Vec::new(),
                relays: Vec::new(),
                is_child_of_root,
                auth: None,
                batch_depth: 0,
                scheduler,
            })),
        }
    }

    /// The node's key, `None` for the namespace root.
    pub fn key(&self) -> Option<String> {
        self.inner.borrow().key.clone()
    }

    /// The committed kind.
    pub fn kind(&self) -> NodeKind {
        self.inner.borrow().kind
    }

    pub fn is_root(&self) -> bool {
        self.inner.borrow().key.is_none()
    }

    /// True once the node resolves to data (directly or through its alias).
    pub fn is_resolved(&self) -> bool {
        matches!(self.resolve(), Ok(Some(_)))
    }

    /// True if both handles address the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of durable `on` listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Read-only description of this node.
    pub fn soul(&self) -> Soul {
        let inner = self.inner.borrow();
        Soul {
            key: inner.key.clone(),
            kind: inner.kind,
            put: match &inner.value {
                NodeValue::Undefined => SoulValue::Undefined,
                NodeValue::Null => SoulValue::Null,
                NodeValue::Primitive(p) => SoulValue::Primitive(p.clone()),
                NodeValue::Children(_) | NodeValue::Alias(_) => SoulValue::Node,
            },
            sea: inner.auth.as_ref().map(|identity| identity.public_key.clone()),
        }
    }

    pub(crate) fn set_auth(&self, identity: Option<Identity>) {
        self.inner.borrow_mut().auth = identity;
    }

    pub(crate) fn auth(&self) -> Option<Identity> {
        self.inner.borrow().auth.clone()
    }

    pub(crate) fn scheduler(&self) -> Rc<Scheduler> {
        self.inner.borrow().scheduler.clone()
    }

    fn require_key(&self, operation: &'static str) -> std::result::Result<String, StoreError> {
        self.inner
            .borrow()
            .key
            .clone()
            .ok_or(StoreError::RootOperation { operation })
    }

    fn alias_target(&self) -> Option<Node> {
        match &self.inner.borrow().value {
            NodeValue::Alias(target) => Some(target.clone()),
            _ => None,
        }
    }

    /// Address a child, materializing it on first access.
    ///
    /// Descending into a node that holds a primitive or null is a logic error.
    /// On an edge the call is forwarded to the aliased node. Repeated calls
    /// with the same key return the same child.
    ///
    /// A child promoted from an inline entry of this node's data replays that
    /// data to this node's set listeners and listeners before it is returned.
    pub fn get(&self, key: &str) -> Result<Node> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey.into());
        }

        if let Some(target) = self.alias_target() {
            return target.get(key);
        }

        let (child, seed) = {
            let mut inner = self.inner.borrow_mut();
            let is_root = inner.key.is_none();
            let scheduler = inner.scheduler.clone();

            if matches!(inner.value, NodeValue::Undefined) {
                inner.value = NodeValue::Children(IndexMap::new());
            }
            let seed = match &inner.value {
                NodeValue::Children(children) => match children.get(key) {
                    Some(ChildSlot::Node(existing)) => return Ok(existing.clone()),
                    Some(ChildSlot::Null) => Some(None),
                    Some(ChildSlot::Primitive(p)) => Some(Some(p.clone())),
                    None => None,
                },
                NodeValue::Null | NodeValue::Primitive(_) => {
                    return Err(StoreError::PrimitiveDescent {
                        key: key.to_string(),
                    }
                    .into());
                }
                NodeValue::Undefined | NodeValue::Alias(_) => {
                    return Err(StoreError::assertion(
                        "get() reached a node that is neither children nor primitive",
                    )
                    .into());
                }
            };

            // Addressing a new key is leaf behaviour; a set keeps its kind and gains an item slot
            if inner.kind == NodeKind::Undefined {
                inner.kind = NodeKind::Leaf;
            }

            let child = Node::new(Some(key.to_string()), is_root, scheduler);
            if let NodeValue::Children(children) = &mut inner.value {
                children.insert(key.to_string(), ChildSlot::Node(child.clone()));
            }
            (child, seed)
        };

        let seeded = seed.is_some();
        if let Some(seed) = seed {
            // Promote the inline entry into the child; nobody listens to it yet
            let mut inner = child.inner.borrow_mut();
            match seed {
                Some(primitive) => {
                    inner.value = NodeValue::Primitive(primitive);
                    inner.kind = NodeKind::Leaf;
                }
                None => inner.value = NodeValue::Null,
            }
        }
        child.attach_relay(self);

        // A promoted entry replays through the new relay, like any child write
        if seeded {
            self.receive_relay(&child)?;
        }

        debug!(parent = ?self.key(), key, "Materialized child node");
        Ok(child)
    }

    /// Write data to this node.
    ///
    /// Listeners fire before this call returns. See [`Node::put_with_ack`].
    pub fn put(&self, data: impl Into<GraphValue>) -> Result<()> {
        self.put_inner(data.into(), None)
    }

    /// Write data to this node, then acknowledge.
    ///
    /// - a [`Node`] turns this node into an edge aliasing it
    /// - `Null` clears the value (and detaches an edge)
    /// - a primitive commits the node as a leaf
    /// - a map commits the node as a leaf; each entry becomes an inline
    ///   primitive or a child node. The whole batch is validated first, then
    ///   applied, then listeners fire once, then `ack` runs.
    ///
    /// Listeners always fire before `ack`, matching the emulated database.
    pub fn put_with_ack(
        &self,
        data: impl Into<GraphValue>,
        ack: impl FnOnce(Ack) + 'static,
    ) -> Result<()> {
        self.put_inner(data.into(), Some(Box::new(ack)))
    }

    fn put_inner(&self, data: GraphValue, ack: Option<AckFn>) -> Result<()> {
        self.check_put(&data)?;
        self.apply_put(data)?;
        if let Some(ack) = ack {
            ack(Ack::ok());
        }
        Ok(())
    }

    /// Validate a put without changing anything.
    fn check_put(&self, data: &GraphValue) -> Result<()> {
        let key = self.require_key("put")?;
        data.validate()?;

        let mut existing_children = Vec::new();
        {
            let inner = self.inner.borrow();
            if inner.kind == NodeKind::Set {
                return Err(StoreError::KindConflict {
                    operation: "put",
                    kind: NodeKind::Set,
                }
                .into());
            }

            match data {
                GraphValue::Node(target) => {
                    if inner.is_child_of_root {
                        return Err(StoreError::InvalidGraph { key }.into());
                    }
                    if inner.kind == NodeKind::Leaf {
                        return Err(StoreError::KindConflict {
                            operation: "put an edge",
                            kind: NodeKind::Leaf,
                        }
                        .into());
                    }
                    if let NodeValue::Alias(current) = &inner.value
                        && current.ptr_eq(target)
                    {
                        return Err(StoreError::DuplicateEdge { key }.into());
                    }
                }
                _ if inner.kind == NodeKind::Edge => {
                    if !matches!(data, GraphValue::Null) {
                        return Err(StoreError::EdgeOverwrite { key }.into());
                    }
                }
                GraphValue::Map(entries) => {
                    if let NodeValue::Primitive(_) = inner.value {
                        return Err(StoreError::ShapeConflict {
                            held: "a primitive",
                            found: "a map of children",
                        }
                        .into());
                    }
                    if let NodeValue::Children(children) = &inner.value {
                        for (k, v) in entries {
                            if let Some(ChildSlot::Node(child)) = children.get(k) {
                                existing_children.push((child.clone(), v));
                            }
                        }
                    }
                }
                _ => {
                    if inner.is_child_of_root {
                        return Err(StoreError::RootLevelPrimitive {
                            key,
                            found: format!("a {}", data.type_name()),
                        }
                        .into());
                    }
                    if !matches!(data, GraphValue::Null)
                        && matches!(inner.value, NodeValue::Children(_))
                    {
                        return Err(StoreError::ShapeConflict {
                            held: "children",
                            found: "a primitive",
                        }
                        .into());
                    }
                }
            }
        }

        match data {
            GraphValue::Node(target) => {
                self.check_same_graph(target)?;
                if self.would_cycle(target) {
                    return Err(StoreError::AliasCycle { key }.into());
                }
            }
            GraphValue::Map(entries) => {
                let mut refs = Vec::new();
                collect_references(data, &mut refs);
                for target in &refs {
                    self.check_same_graph(target)?;
                }
                for (child, v) in &existing_children {
                    child.check_put(v)?;
                }
                // References landing in fresh children only relay back up through this node
                for (k, v) in entries {
                    if existing_children
                        .iter()
                        .any(|(child, _)| child.key().as_deref() == Some(k.as_str()))
                    {
                        continue;
                    }
                    let mut refs = Vec::new();
                    collect_references(v, &mut refs);
                    if refs.iter().any(|target| self.would_cycle(target)) {
                        return Err(StoreError::AliasCycle { key: k.clone() }.into());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Apply an already validated put.
    fn apply_put(&self, data: GraphValue) -> Result<()> {
        match data {
            GraphValue::Node(target) => self.apply_alias(target),
            GraphValue::Map(entries) => self.apply_map(entries),
            scalar => {
                let Some(primitive) = scalar.into_scalar() else {
                    return Err(StoreError::assertion("non-scalar reached scalar put").into());
                };
                {
                    let mut inner = self.inner.borrow_mut();
                    match primitive {
                        Some(primitive) => {
                            inner.value = NodeValue::Primitive(primitive);
                            commit(&mut inner, NodeKind::Leaf, "put")?;
                        }
                        // Null clears the value; an edge stays an edge so it can be retargeted
                        None => {
                            if inner.kind == NodeKind::Edge {
                                debug!(key = ?inner.key, "Detached edge");
                            }
                            inner.value = NodeValue::Null;
                        }
                    }
                }
                self.emit()
            }
        }
    }

    fn apply_alias(&self, target: Node) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.value = NodeValue::Alias(target.clone());
            commit(&mut inner, NodeKind::Edge, "put an edge")?;
        }
        target.attach_relay(self);
        debug!(key = ?self.key(), target = ?target.key(), "Committed edge");

        if target.resolve()?.is_some() {
            self.emit()?;
        }
        Ok(())
    }

    fn apply_map(&self, entries: IndexMap<String, GraphValue>) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.value, NodeValue::Children(_)) {
                inner.value = NodeValue::Children(IndexMap::new());
            }
            commit(&mut inner, NodeKind::Leaf, "put")?;
            inner.batch_depth += 1;
        }

        let applied = entries
            .into_iter()
            .try_for_each(|(k, v)| self.apply_entry(k, v));

        self.inner.borrow_mut().batch_depth -= 1;
        applied?;

        self.emit()
    }

    fn apply_entry(&self, key: String, data: GraphValue) -> Result<()> {
        let existing = match &self.inner.borrow().value {
            NodeValue::Children(children) => match children.get(&key) {
                Some(ChildSlot::Node(child)) => Some(child.clone()),
                _ => None,
            },
            _ => return Err(StoreError::assertion("map entry applied to a non-map node").into()),
        };

        if let Some(child) = existing {
            return child.apply_put(data);
        }

        let slot = match data {
            GraphValue::Map(_) | GraphValue::Node(_) => {
                let child = Node::new(Some(key.clone()), false, self.scheduler());
                self.insert_child(&key, ChildSlot::Node(child.clone()))?;
                child.attach_relay(self);
                child.seed(data)?;
                return Ok(());
            }
            scalar => match scalar.into_scalar() {
                Some(Some(primitive)) => ChildSlot::Primitive(primitive),
                _ => ChildSlot::Null,
            },
        };
        let data = match &slot {
            ChildSlot::Primitive(primitive) => ListenerData::Primitive(primitive.clone()),
            _ => ListenerData::Null,
        };
        self.insert_child(&key, slot)?;
        self.fan_out_set(&data, &key);
        Ok(())
    }

    fn insert_child(&self, key: &str, slot: ChildSlot) -> Result<()> {
        match &mut self.inner.borrow_mut().value {
            NodeValue::Children(children) => {
                children.insert(key.to_string(), slot);
                Ok(())
            }
            _ => Err(StoreError::assertion("inserted a child into a non-map node").into()),
        }
    }

    /// Write the initial data of a node materialized from its parent's data.
    ///
    /// A map-shaped seed leaves the kind undetermined, so a node bootstrapped
    /// with a placeholder property can still become a set later.
    fn seed(&self, data: GraphValue) -> Result<()> {
        let map_shaped = matches!(data, GraphValue::Map(_));
        self.apply_put(data)?;
        if map_shaped {
            self.inner.borrow_mut().kind = NodeKind::Undefined;
        }
        Ok(())
    }

    /// Add an item to this node, used as a set.
    ///
    /// See [`Node::set_with_ack`].
    pub fn set(&self, item: impl Into<GraphValue>) -> Result<Node> {
        self.set_inner(item.into(), None)
    }

    /// Add an item to this node, used as a set, and acknowledge on the next scheduler turn.
    ///
    /// A [`Node`] item is stored under its own key as an edge to it; any other
    /// item gets a fresh random key. Set listeners (and this node's own
    /// listeners) are notified before this call returns; `ack` runs only once
    /// the owning graph's scheduler takes its next turn.
    pub fn set_with_ack(
        &self,
        item: impl Into<GraphValue>,
        ack: impl FnOnce(Ack) + 'static,
    ) -> Result<Node> {
        self.set_inner(item.into(), Some(Box::new(ack)))
    }

    fn set_inner(&self, item: GraphValue, ack: Option<AckFn>) -> Result<Node> {
        let key = self.require_key("set")?;
        item.validate()?;

        if self.kind() == NodeKind::Leaf {
            return Err(StoreError::KindConflict {
                operation: "set",
                kind: NodeKind::Leaf,
            }
            .into());
        }

        if let Some(target) = self.alias_target() {
            return target.set_inner(item, ack);
        }

        {
            let inner = self.inner.borrow();
            if !matches!(inner.value, NodeValue::Undefined | NodeValue::Children(_)) {
                return Err(StoreError::ShapeConflict {
                    held: inner.value.describe(),
                    found: "a set item",
                }
                .into());
            }
        }

        let item_key = match &item {
            GraphValue::Node(target) => {
                self.check_same_graph(target)?;
                if self.would_cycle(target) {
                    return Err(StoreError::AliasCycle { key }.into());
                }
                target.require_key("set")?
            }
            _ => uuid::Uuid::new_v4().to_string(),
        };

        let child = Node::new(Some(item_key.clone()), false, self.scheduler());
        match item {
            GraphValue::Node(target) => child.apply_alias(target)?,
            data => child.seed(data)?,
        }
        {
            let mut inner = self.inner.borrow_mut();
            if matches!(inner.value, NodeValue::Undefined) {
                inner.value = NodeValue::Children(IndexMap::new());
            }
            if let NodeValue::Children(children) = &mut inner.value {
                children.insert(item_key.clone(), ChildSlot::Node(child.clone()));
            }
            commit(&mut inner, NodeKind::Set, "set")?;
        }
        child.attach_relay(self);
        debug!(key = %key, item = %item_key, "Added set item");

        // Fan out the new item before the ack is even scheduled
        if child.resolve()?.is_some() {
            self.receive_relay(&child)?;
        }

        if let Some(ack) = ack {
            self.scheduler().defer(move || ack(Ack::ok()));
        }
        Ok(child)
    }

    /// Iterate this node's items, durably.
    ///
    /// Commits an undetermined node to `Set`. Calling it on a leaf is allowed
    /// (the node is then read as a map) but logged, since it usually means the
    /// node is used inconsistently.
    pub fn map(&self) -> Result<SetView> {
        let key = self.require_key("map")?;
        if let Some(target) = self.alias_target() {
            return target.map();
        }

        let mut inner = self.inner.borrow_mut();
        check_mappable(&inner.value)?;
        match inner.kind {
            NodeKind::Undefined => inner.kind = NodeKind::Set,
            NodeKind::Leaf => warn!(
                key = %key,
                "map() called on a node already used as a leaf, reading it as a map"
            ),
            NodeKind::Edge | NodeKind::Set => {}
        }
        drop(inner);
        Ok(SetView::new(self.clone()))
    }

    /// Iterate this node's current items once, without committing a kind.
    pub fn once_map(&self) -> Result<SetView> {
        self.require_key("once")?;
        if let Some(target) = self.alias_target() {
            return target.once_map();
        }
        check_mappable(&self.inner.borrow().value)?;
        Ok(SetView::new(self.clone()))
    }

    /// Edges never cross graphs: both ends must share one scheduler.
    fn check_same_graph(&self, target: &Node) -> std::result::Result<(), StoreError> {
        if Rc::ptr_eq(&self.scheduler(), &target.scheduler()) {
            Ok(())
        } else {
            Err(StoreError::ForeignNode {
                key: target.key().unwrap_or_default(),
            })
        }
    }

    /// Would aliasing `target` from this node make changes relay back to their origin?
    fn would_cycle(&self, target: &Node) -> bool {
        let mut stack = vec![self.clone()];
        let mut visited: Vec<Node> = Vec::new();
        while let Some(node) = stack.pop() {
            if node.ptr_eq(target) {
                return true;
            }
            if visited.iter().any(|seen| seen.ptr_eq(&node)) {
                continue;
            }
            stack.extend(node.linked_dependents());
            visited.push(node);
        }
        false
    }

    /// Dependents whose relay link to this node is still live.
    fn linked_dependents(&self) -> Vec<Node> {
        let relays = self.inner.borrow().relays.clone();
        relays
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| Node { inner })
            .filter(|dependent| !matches!(dependent.link_to(self), Link::Stale))
            .collect()
    }

    /// How this node depends on `source`, checked at relay time.
    fn link_to(&self, source: &Node) -> Link {
        let inner = self.inner.borrow();
        match &inner.value {
            NodeValue::Alias(target) if target.ptr_eq(source) => Link::Alias,
            NodeValue::Children(children) => {
                let Some(key) = source.key() else {
                    return Link::Stale;
                };
                match children.get(&key) {
                    Some(ChildSlot::Node(child)) if child.ptr_eq(source) => Link::Child,
                    _ => Link::Stale,
                }
            }
            _ => Link::Stale,
        }
    }
}

fn commit(
    inner: &mut NodeInner,
    kind: NodeKind,
    operation: &'static str,
) -> std::result::Result<(), StoreError> {
    if inner.kind == NodeKind::Undefined || inner.kind == kind {
        inner.kind = kind;
        Ok(())
    } else {
        Err(StoreError::KindConflict {
            operation,
            kind: inner.kind,
        })
    }
}

fn check_mappable(value: &NodeValue) -> std::result::Result<(), StoreError> {
    match value {
        NodeValue::Null | NodeValue::Primitive(_) => Err(StoreError::ShapeConflict {
            held: value.describe(),
            found: "a set cursor",
        }),
        _ => Ok(()),
    }
}

fn collect_references(value: &GraphValue, out: &mut Vec<Node>) {
    match value {
        GraphValue::Node(node) => out.push(node.clone()),
        GraphValue::Map(entries) => entries.values().for_each(|v| collect_references(v, out)),
        _ => {}
    }
}
