//! Cursor over every item of a node.

use std::rc::Rc;

use super::{Listener, Node};
use crate::{Result, value::ListenerData};

/// Returned by [`Node::map`] and [`Node::once_map`].
///
/// Items are delivered one call per entry, in insertion order, each with its
/// own key. Child nodes arrive flattened; inline entries arrive raw.
#[derive(Debug, Clone)]
pub struct SetView {
    node: Node,
}

impl SetView {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// The node whose items this view iterates.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Replay every existing item, then receive every item added or changed later.
    pub fn on(&self, callback: impl Fn(&ListenerData, &str) + 'static) -> Result<()> {
        let listener: Listener = Rc::new(callback);
        self.node.replay_items(listener.as_ref())?;
        self.node.add_set_listener(listener);
        Ok(())
    }

    /// Replay every existing item once.
    pub fn once(&self, callback: impl Fn(&ListenerData, &str)) -> Result<()> {
        self.node.replay_items(&callback)
    }
}
