//! Listener registry: subscription, replay, flattening and relay delivery.
//!
//! Listeners are plain callbacks receiving `(data, key)`. They fire
//! synchronously and in registration order. Before any callback runs, the list
//! it belongs to is snapshotted and every borrow of the node is released, so
//! callbacks are free to call back into the store.

use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::trace;

use super::{ChildSlot, Link, Node, NodeKind, NodeValue, StoreError};
use crate::{
    Result,
    value::{Field, ListenerData, NodeRecord},
};

/// Subscriber callback, invoked with the node's data and key.
pub type Listener = Rc<dyn Fn(&ListenerData, &str)>;

impl Node {
    /// Subscribe durably.
    ///
    /// If the node already resolves to data, `callback` receives it before this
    /// call returns. It is then invoked on every change until [`Node::off`].
    pub fn on(&self, callback: impl Fn(&ListenerData, &str) + 'static) -> Result<()> {
        let key = self.require_key("on")?;
        let listener: Listener = Rc::new(callback);
        if let Some(data) = self.resolve()? {
            listener(&data, &key);
        }
        self.inner.borrow_mut().listeners.push(listener);
        Ok(())
    }

    /// Read the current data once.
    ///
    /// An unresolved node delivers [`ListenerData::Undefined`]. An edge whose
    /// target is still unresolved delivers nothing.
    pub fn once(&self, callback: impl FnOnce(&ListenerData, &str)) -> Result<()> {
        let key = self.require_key("once")?;
        match self.resolve()? {
            Some(data) => callback(&data, &key),
            None if self.alias_target().is_some() => {}
            None => callback(&ListenerData::Undefined, &key),
        }
        Ok(())
    }

    /// Remove every durable listener of this node.
    ///
    /// Set listeners, relays and descendants are untouched.
    pub fn off(&self) -> Result<()> {
        self.require_key("off")?;
        let removed = std::mem::take(&mut self.inner.borrow_mut().listeners).len();
        trace!(key = ?self.key(), removed, "Removed listeners");
        Ok(())
    }

    /// Current data, flattened one level. `None` while unresolved.
    pub(crate) fn resolve(&self) -> Result<Option<ListenerData>> {
        if let Some(target) = self.alias_target() {
            return target.resolve();
        }
        let children = match &self.inner.borrow().value {
            NodeValue::Undefined => return Ok(None),
            NodeValue::Null => return Ok(Some(ListenerData::Null)),
            NodeValue::Primitive(primitive) => {
                return Ok(Some(ListenerData::Primitive(primitive.clone())));
            }
            NodeValue::Children(children) => children.clone(),
            NodeValue::Alias(_) => {
                return Err(StoreError::assertion("alias changed while resolving").into());
            }
        };

        let soul = self.require_key("resolve")?;
        let fields = flatten(&children);
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(ListenerData::Node(NodeRecord { soul, fields })))
    }

    /// Fire own listeners with the current data, then tell dependents.
    pub(crate) fn emit(&self) -> Result<()> {
        let (key, listeners) = {
            let inner = self.inner.borrow();
            let Some(key) = inner.key.clone() else {
                return Err(StoreError::assertion("emit() reached the root node").into());
            };
            if inner.kind == NodeKind::Undefined && matches!(inner.value, NodeValue::Primitive(_))
            {
                return Err(StoreError::assertion(format!(
                    "node `{key}` holds a primitive without being committed"
                ))
                .into());
            }
            (key, inner.listeners.clone())
        };

        let Some(data) = self.resolve()? else {
            return Ok(());
        };

        trace!(key = %key, listeners = listeners.len(), "Firing listeners");
        for listener in &listeners {
            listener(&data, &key);
        }
        self.deliver_relays()
    }

    /// Hand this node's change to every node depending on it, pruning stale links.
    fn deliver_relays(&self) -> Result<()> {
        let relays = self.inner.borrow().relays.clone();
        let mut stale = Vec::new();

        for relay in &relays {
            let Some(inner) = relay.upgrade() else {
                stale.push(relay.clone());
                continue;
            };
            let dependent = Node { inner };
            match dependent.link_to(self) {
                Link::Alias => dependent.emit()?,
                Link::Child => dependent.receive_relay(self)?,
                Link::Stale => stale.push(relay.clone()),
            }
        }

        if !stale.is_empty() {
            trace!(key = ?self.key(), pruned = stale.len(), "Pruned stale relays");
            self.inner
                .borrow_mut()
                .relays
                .retain(|relay| !stale.iter().any(|gone| Weak::ptr_eq(gone, relay)));
        }
        Ok(())
    }

    /// A child changed: notify set listeners with its data, then own listeners.
    pub(crate) fn receive_relay(&self, child: &Node) -> Result<()> {
        if let (Some(data), Some(key)) = (child.resolve()?, child.key()) {
            self.fan_out_set(&data, &key);
        }

        let (batching, has_key) = {
            let inner = self.inner.borrow();
            (inner.batch_depth > 0, inner.key.is_some())
        };
        if !batching && has_key {
            self.emit()?;
        }
        Ok(())
    }

    /// Deliver one item to every set listener.
    pub(crate) fn fan_out_set(&self, data: &ListenerData, key: &str) {
        let listeners = self.inner.borrow().set_listeners.clone();
        if listeners.is_empty() {
            return;
        }
        trace!(parent = ?self.key(), key, listeners = listeners.len(), "Firing set listeners");
        for listener in &listeners {
            listener(data, key);
        }
    }

    /// Register `dependent` to be told when this node changes.
    pub(crate) fn attach_relay(&self, dependent: &Node) {
        let link = Rc::downgrade(&dependent.inner);
        let mut inner = self.inner.borrow_mut();
        if !inner.relays.iter().any(|relay| Weak::ptr_eq(relay, &link)) {
            inner.relays.push(link);
        }
    }

    /// Replay every current item to `callback`: child nodes flattened, inline entries raw.
    pub(crate) fn replay_items(&self, callback: &dyn Fn(&ListenerData, &str)) -> Result<()> {
        if let Some(target) = self.alias_target() {
            return target.replay_items(callback);
        }
        let children = match &self.inner.borrow().value {
            NodeValue::Children(children) => children.clone(),
            _ => return Ok(()),
        };

        for (key, slot) in &children {
            match slot {
                ChildSlot::Null => callback(&ListenerData::Null, key),
                ChildSlot::Primitive(primitive) => {
                    callback(&ListenerData::Primitive(primitive.clone()), key)
                }
                ChildSlot::Node(child) => {
                    if let Some(data) = child.resolve()? {
                        callback(&data, key);
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn add_set_listener(&self, listener: Listener) {
        self.inner.borrow_mut().set_listeners.push(listener);
    }
}

/// Flatten children one level: inline and primitive-holding entries raw,
/// map-shaped children as soul references.
///
/// Child nodes are reported by what they hold, not by being nodes: a child
/// node holding a primitive or null renders raw, so promoting an inline entry
/// with `get` never changes the parent's record. Children that hold nothing
/// yet are left out, so a node whose children are all unresolved is itself
/// unresolved and `on` stays quiet until one of them is written.
fn flatten(children: &IndexMap<String, ChildSlot>) -> IndexMap<String, Field> {
    children
        .iter()
        .filter_map(|(key, slot)| {
            let field = match slot {
                ChildSlot::Null => Field::Null,
                ChildSlot::Primitive(primitive) => Field::Primitive(primitive.clone()),
                ChildSlot::Node(child) => match &child.inner.borrow().value {
                    NodeValue::Undefined => return None,
                    NodeValue::Null => Field::Null,
                    NodeValue::Primitive(primitive) => Field::Primitive(primitive.clone()),
                    NodeValue::Children(_) | NodeValue::Alias(_) => Field::Soul(key.clone()),
                },
            };
            Some((key.clone(), field))
        })
        .collect()
}
