use std::{cell::RefCell, rc::Rc};

use ripple::{Ack, Graph, GraphValue, ListenerData, Node};
use serde_json::Value as JsonValue;

// ==========================
// TEST FACTORIES
// ==========================

/// Build a graph value from a JSON literal.
pub fn value(json: JsonValue) -> GraphValue {
    GraphValue::from_json(json).expect("test value must be storable")
}

/// A fresh graph plus a node one level below the root.
///
/// Nodes directly under the root only accept node-shaped data, so most tests
/// work one level down.
pub fn setup() -> (Graph, Node) {
    let graph = Graph::new();
    let scope = graph.get("scope").expect("Failed to get scope node");
    (graph, scope)
}

// ==========================
// RECORDERS
// ==========================

/// Collects listener calls as `(payload as JSON, key)`.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<(JsonValue, String)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener appending to this recorder.
    pub fn listener(&self) -> impl Fn(&ListenerData, &str) + 'static {
        let events = self.events.clone();
        move |data: &ListenerData, key: &str| {
            events
                .borrow_mut()
                .push((data.to_json(), key.to_string()))
        }
    }

    pub fn events(&self) -> Vec<(JsonValue, String)> {
        self.events.borrow().clone()
    }

    pub fn values(&self) -> Vec<JsonValue> {
        self.events.borrow().iter().map(|(v, _)| v.clone()).collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.events.borrow().iter().map(|(_, k)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn last(&self) -> Option<(JsonValue, String)> {
        self.events.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Shared ordered log, for asserting the relative order of listeners and acks.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener logging `label`.
    pub fn listener(&self, label: &str) -> impl Fn(&ListenerData, &str) + 'static {
        let entries = self.entries.clone();
        let label = label.to_string();
        move |_: &ListenerData, _: &str| entries.borrow_mut().push(label.clone())
    }

    /// An ack logging `label`, or `label:<error>` on failure.
    pub fn ack(&self, label: &str) -> impl FnOnce(Ack) + 'static {
        let entries = self.entries.clone();
        let label = label.to_string();
        move |ack: Ack| {
            let entry = match ack.err {
                Some(err) => format!("{label}:{err}"),
                None => label,
            };
            entries.borrow_mut().push(entry);
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

/// Capture the ack of a synchronous call.
pub fn capture_ack(call: impl FnOnce(Box<dyn FnOnce(Ack)>)) -> Option<Ack> {
    let slot = Rc::new(RefCell::new(None));
    let sink = slot.clone();
    call(Box::new(move |ack| *sink.borrow_mut() = Some(ack)));
    slot.borrow_mut().take()
}
