//! Replay scripts.
//!
//! A script is either a bare JSON array of steps, or an object carrying graph
//! options next to the steps:
//!
//! ```json
//! {
//!   "options": { "pre_authenticated": "alice" },
//!   "steps": [
//!     { "op": "on", "path": ["scope", "profile"] },
//!     { "op": "put", "path": ["scope", "profile"], "value": { "name": "alice" } },
//!     { "op": "set", "path": ["status"], "namespace": "user", "value": "online" }
//!   ]
//! }
//! ```
//!
//! Paths are node keys walked from the namespace root; an empty path in the
//! root namespace addresses the root itself.

use std::{cell::RefCell, rc::Rc};

use anyhow::{Context, bail};
use ripple::{Ack, Graph, GraphOptions, GraphValue, ListenerData, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Namespace a step's path starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    #[default]
    Root,
    /// The authenticated user's namespace
    User,
}

/// One store operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    Put {
        path: Vec<String>,
        value: JsonValue,
        #[serde(default)]
        namespace: Namespace,
    },
    /// Make `path` an edge to `target`, both in the same namespace
    Alias {
        path: Vec<String>,
        target: Vec<String>,
        #[serde(default)]
        namespace: Namespace,
    },
    Set {
        path: Vec<String>,
        value: JsonValue,
        #[serde(default)]
        namespace: Namespace,
    },
    On {
        path: Vec<String>,
        #[serde(default)]
        namespace: Namespace,
    },
    Once {
        path: Vec<String>,
        #[serde(default)]
        namespace: Namespace,
    },
    MapOn {
        path: Vec<String>,
        #[serde(default)]
        namespace: Namespace,
    },
    Off {
        path: Vec<String>,
        #[serde(default)]
        namespace: Namespace,
    },
    Auth {
        alias: String,
        password: String,
    },
    Leave,
}

/// Something observed while replaying.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A listener fired
    Data {
        /// Index of the step that registered the listener
        step: usize,
        listener: String,
        key: String,
        data: JsonValue,
    },
    /// A write or authentication was acknowledged
    Ack {
        step: usize,
        op: String,
        err: Option<String>,
    },
    /// The step was rejected by the store
    Error { step: usize, error: String },
}

type EventSink = Rc<RefCell<Vec<Event>>>;

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Script {
    pub options: GraphOptions,
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script in either accepted shape.
    pub fn parse(source: &str) -> anyhow::Result<Self> {
        let value: JsonValue = serde_json::from_str(source).context("script is not valid JSON")?;
        let script = if value.is_array() {
            Script {
                options: GraphOptions::default(),
                steps: serde_json::from_value(value).context("invalid script steps")?,
            }
        } else {
            serde_json::from_value(value).context("invalid script")?
        };
        Ok(script)
    }

    /// Check every step without touching a graph.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            step.validate()
                .with_context(|| format!("step {index} is invalid"))?;
        }
        Ok(())
    }

    /// Run every step against a fresh graph and collect the events in order.
    ///
    /// A rejected step is recorded as an [`Event::Error`] and replay continues.
    /// Deferred work is drained after each step, so a step's acknowledgment
    /// follows the listener events it caused.
    pub fn run(&self) -> Vec<Event> {
        let graph = Graph::with_options(self.options.clone());
        let sink: EventSink = Rc::default();

        for (index, step) in self.steps.iter().enumerate() {
            if let Err(err) = step.apply(&graph, index, &sink) {
                tracing::debug!(step = index, %err, "Step rejected");
                sink.borrow_mut().push(Event::Error {
                    step: index,
                    error: err.to_string(),
                });
            }
            graph.run_until_idle();
        }

        sink.take()
    }
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Put { .. } => "put",
            Step::Alias { .. } => "alias",
            Step::Set { .. } => "set",
            Step::On { .. } => "on",
            Step::Once { .. } => "once",
            Step::MapOn { .. } => "map_on",
            Step::Off { .. } => "off",
            Step::Auth { .. } => "auth",
            Step::Leave => "leave",
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self {
            Step::Put { path, value, .. } | Step::Set { path, value, .. } => {
                validate_path(path)?;
                GraphValue::from_json(value.clone())?;
            }
            Step::Alias { path, target, .. } => {
                validate_path(path)?;
                validate_path(target)?;
            }
            Step::On { path, .. }
            | Step::Once { path, .. }
            | Step::MapOn { path, .. }
            | Step::Off { path, .. } => validate_path(path)?,
            Step::Auth { alias, .. } => {
                if alias.is_empty() {
                    bail!("auth needs an alias");
                }
            }
            Step::Leave => {}
        }
        Ok(())
    }

    fn apply(&self, graph: &Graph, index: usize, sink: &EventSink) -> ripple::Result<()> {
        match self {
            Step::Put {
                path,
                value,
                namespace,
            } => {
                let node = resolve(graph, *namespace, path)?;
                node.put_with_ack(GraphValue::from_json(value.clone())?, ack(sink, index, "put"))
            }
            Step::Alias {
                path,
                target,
                namespace,
            } => {
                let node = resolve(graph, *namespace, path)?;
                let target = resolve(graph, *namespace, target)?;
                node.put_with_ack(&target, ack(sink, index, "alias"))
            }
            Step::Set {
                path,
                value,
                namespace,
            } => {
                let node = resolve(graph, *namespace, path)?;
                node.set_with_ack(GraphValue::from_json(value.clone())?, ack(sink, index, "set"))?;
                Ok(())
            }
            Step::On { path, namespace } => {
                let label = format!("on {}", display_path(*namespace, path));
                resolve(graph, *namespace, path)?.on(listener(sink, index, label))
            }
            Step::Once { path, namespace } => {
                let label = format!("once {}", display_path(*namespace, path));
                resolve(graph, *namespace, path)?.once(listener(sink, index, label))
            }
            Step::MapOn { path, namespace } => {
                let label = format!("map_on {}", display_path(*namespace, path));
                resolve(graph, *namespace, path)?
                    .map()?
                    .on(listener(sink, index, label))
            }
            Step::Off { path, namespace } => resolve(graph, *namespace, path)?.off(),
            Step::Auth { alias, password } => {
                graph.user().auth(alias, password, ack(sink, index, self.name()));
                Ok(())
            }
            Step::Leave => {
                graph.user().leave();
                Ok(())
            }
        }
    }
}

fn validate_path(path: &[String]) -> anyhow::Result<()> {
    if path.iter().any(String::is_empty) {
        bail!("path segments must be non-empty");
    }
    Ok(())
}

fn display_path(namespace: Namespace, path: &[String]) -> String {
    let prefix = match namespace {
        Namespace::Root => "",
        Namespace::User => "~/",
    };
    format!("{prefix}{}", path.join("/"))
}

fn resolve(graph: &Graph, namespace: Namespace, path: &[String]) -> ripple::Result<Node> {
    let mut segments = path.iter();
    let mut node = match (namespace, segments.next()) {
        (Namespace::Root, None) => return Ok(graph.root().clone()),
        (Namespace::Root, Some(first)) => graph.get(first)?,
        (Namespace::User, first) => graph.user().get(first.map_or("", String::as_str))?,
    };
    for segment in segments {
        node = node.get(segment)?;
    }
    Ok(node)
}

fn listener(sink: &EventSink, step: usize, label: String) -> impl Fn(&ListenerData, &str) + 'static {
    let sink = sink.clone();
    move |data: &ListenerData, key: &str| {
        sink.borrow_mut().push(Event::Data {
            step,
            listener: label.clone(),
            key: key.to_string(),
            data: data.to_json(),
        })
    }
}

fn ack(sink: &EventSink, step: usize, op: &'static str) -> impl FnOnce(Ack) + 'static {
    let sink = sink.clone();
    move |ack: Ack| {
        sink.borrow_mut().push(Event::Ack {
            step,
            op: op.to_string(),
            err: ack.err,
        })
    }
}
