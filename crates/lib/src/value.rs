//! Value types flowing into and out of the graph.
//!
//! [`GraphValue`] is the closed union accepted by `put` and `set`.
//! [`ListenerData`] is what listeners receive: primitives are delivered raw,
//! map-shaped nodes are flattened one level into a [`NodeRecord`] where every
//! child node is replaced by a soul reference.

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue, json};

use crate::{
    Result,
    constants::{SOUL_FIELD, SOUL_KEY},
    node::{Node, NodeKind, StoreError},
};

/// A scalar that can live inline in a node or as a node's whole value.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Boolean value
    Bool(bool),
    /// Numeric value (always finite)
    Number(f64),
    /// Text value
    Text(String),
}

impl Primitive {
    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Bool(_) => "boolean",
            Primitive::Number(_) => "number",
            Primitive::Text(_) => "string",
        }
    }

    /// Attempts to convert to a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to convert to a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Primitive::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to convert to a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Primitive::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render as JSON.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Primitive::Bool(b) => JsonValue::Bool(*b),
            // Integral values render as JSON integers so payloads compare equal to `json!` literals
            Primitive::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => {
                json!(*n as i64)
            }
            Primitive::Number(n) => json!(n),
            Primitive::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

/// Largest integer an f64 represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Primitive::Bool(b) => write!(f, "{b}"),
            Primitive::Number(n) => write!(f, "{n}"),
            Primitive::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Data accepted by `put` and `set`.
///
/// Build maps with `FromIterator` or from JSON:
///
/// ```
/// # use ripple::GraphValue;
/// let profile: GraphValue = [("name", "alice"), ("avatar", "a.png")].into_iter().collect();
/// assert_eq!(profile.type_name(), "map");
///
/// let same = GraphValue::from_json(serde_json::json!({"name": "alice"})).unwrap();
/// assert_eq!(same.type_name(), "map");
/// ```
#[derive(Debug, Clone)]
pub enum GraphValue {
    /// Clears a value, or detaches an edge
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Child entries, written in iteration order
    Map(IndexMap<String, GraphValue>),
    /// Reference to another node (creates an edge)
    Node(Node),
}

impl GraphValue {
    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            GraphValue::Null => "null",
            GraphValue::Bool(_) => "boolean",
            GraphValue::Number(_) => "number",
            GraphValue::Text(_) => "string",
            GraphValue::Map(_) => "map",
            GraphValue::Node(_) => "node",
        }
    }

    /// Returns true for null and the scalar variants.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            GraphValue::Null | GraphValue::Bool(_) | GraphValue::Number(_) | GraphValue::Text(_)
        )
    }

    /// Convert a scalar into the primitive stored in the graph. `Null` maps to `None`.
    pub(crate) fn into_scalar(self) -> Option<Option<Primitive>> {
        match self {
            GraphValue::Null => Some(None),
            GraphValue::Bool(b) => Some(Some(Primitive::Bool(b))),
            GraphValue::Number(n) => Some(Some(Primitive::Number(n))),
            GraphValue::Text(s) => Some(Some(Primitive::Text(s))),
            GraphValue::Map(_) | GraphValue::Node(_) => None,
        }
    }

    /// Convert JSON into a graph value.
    ///
    /// Arrays are rejected: the graph has no list type, collections are built with `set`.
    pub fn from_json(value: JsonValue) -> Result<Self> {
        Ok(match value {
            JsonValue::Null => GraphValue::Null,
            JsonValue::Bool(b) => GraphValue::Bool(b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(n) => GraphValue::Number(n),
                None => {
                    return Err(StoreError::UnsupportedValue {
                        reason: format!("number {n} is not representable"),
                    }
                    .into());
                }
            },
            JsonValue::String(s) => GraphValue::Text(s),
            JsonValue::Array(_) => {
                return Err(StoreError::UnsupportedValue {
                    reason: "arrays cannot be stored, use set() to build collections".to_string(),
                }
                .into());
            }
            JsonValue::Object(entries) => GraphValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, GraphValue::from_json(v)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Check that this value can be stored at all.
    ///
    /// Rejects non-finite numbers, empty maps (at any depth) and references to a
    /// namespace root, which has no key to alias.
    pub(crate) fn validate(&self) -> std::result::Result<(), StoreError> {
        match self {
            GraphValue::Number(n) if !n.is_finite() => Err(StoreError::UnsupportedValue {
                reason: format!("non-finite number {n}"),
            }),
            GraphValue::Map(entries) if entries.is_empty() => Err(StoreError::EmptyNode),
            GraphValue::Map(entries) => entries.values().try_for_each(GraphValue::validate),
            GraphValue::Node(node) if node.is_root() => {
                Err(StoreError::RootOperation { operation: "alias" })
            }
            _ => Ok(()),
        }
    }
}

impl From<bool> for GraphValue {
    fn from(b: bool) -> Self {
        GraphValue::Bool(b)
    }
}

impl From<f64> for GraphValue {
    fn from(n: f64) -> Self {
        GraphValue::Number(n)
    }
}

impl From<i32> for GraphValue {
    fn from(n: i32) -> Self {
        GraphValue::Number(n.into())
    }
}

impl From<i64> for GraphValue {
    fn from(n: i64) -> Self {
        GraphValue::Number(n as f64)
    }
}

impl From<u32> for GraphValue {
    fn from(n: u32) -> Self {
        GraphValue::Number(n.into())
    }
}

impl From<&str> for GraphValue {
    fn from(s: &str) -> Self {
        GraphValue::Text(s.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(s: String) -> Self {
        GraphValue::Text(s)
    }
}

impl From<Primitive> for GraphValue {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::Bool(b) => GraphValue::Bool(b),
            Primitive::Number(n) => GraphValue::Number(n),
            Primitive::Text(s) => GraphValue::Text(s),
        }
    }
}

impl From<Node> for GraphValue {
    fn from(node: Node) -> Self {
        GraphValue::Node(node)
    }
}

impl From<&Node> for GraphValue {
    fn from(node: &Node) -> Self {
        GraphValue::Node(node.clone())
    }
}

impl<T: Into<GraphValue>> From<Option<T>> for GraphValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(GraphValue::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<GraphValue>> FromIterator<(K, V)> for GraphValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        GraphValue::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One entry of a flattened [`NodeRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Null entry
    Null,
    /// Inline primitive
    Primitive(Primitive),
    /// Reference to a child node, by key
    Soul(String),
}

impl Field {
    /// Render as JSON; souls become `{"#": key}`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Field::Null => JsonValue::Null,
            Field::Primitive(p) => p.to_json(),
            Field::Soul(key) => json!({ SOUL_KEY: key }),
        }
    }
}

/// A map-shaped node flattened one level deep.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub(crate) soul: String,
    pub(crate) fields: IndexMap<String, Field>,
}

impl NodeRecord {
    /// Key of the node this record was taken from.
    pub fn soul(&self) -> &str {
        &self.soul
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the fields without the reserved soul field.
    pub fn fields_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<JsonMap<_, _>>(),
        )
    }

    /// Render in wire shape: `{"_": {"#": soul}, field: value, ...}`.
    pub fn to_json(&self) -> JsonValue {
        let mut object = JsonMap::new();
        object.insert(SOUL_FIELD.to_string(), json!({ SOUL_KEY: self.soul }));
        for (k, v) in &self.fields {
            object.insert(k.clone(), v.to_json());
        }
        JsonValue::Object(object)
    }
}

/// Payload handed to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerData {
    /// Nothing has been written yet (only `once` on an unresolved node delivers this)
    Undefined,
    /// Null value
    Null,
    /// Primitive value
    Primitive(Primitive),
    /// Map-shaped node, flattened
    Node(NodeRecord),
}

impl ListenerData {
    pub fn is_undefined(&self) -> bool {
        matches!(self, ListenerData::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ListenerData::Null)
    }

    /// Attempts to view as a primitive
    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            ListenerData::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Attempts to view as a flattened node
    pub fn as_record(&self) -> Option<&NodeRecord> {
        match self {
            ListenerData::Node(record) => Some(record),
            _ => None,
        }
    }

    /// Render in wire shape. `Undefined` renders as JSON null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            ListenerData::Undefined | ListenerData::Null => JsonValue::Null,
            ListenerData::Primitive(p) => p.to_json(),
            ListenerData::Node(record) => record.to_json(),
        }
    }
}

/// What a node currently resolves to, as reported by [`Soul`].
#[derive(Debug, Clone, PartialEq)]
pub enum SoulValue {
    /// Nothing written yet
    Undefined,
    /// Null value
    Null,
    /// Primitive value
    Primitive(Primitive),
    /// Children or an alias; referenced as `{"#": key}`
    Node,
}

/// Read-only description of a node's identity and current state.
#[derive(Debug, Clone, PartialEq)]
pub struct Soul {
    /// Node key, `None` for the namespace root
    pub key: Option<String>,
    /// Committed kind
    pub kind: NodeKind,
    /// Resolution hint for the current value
    pub put: SoulValue,
    /// Public key of the authenticated identity (namespace root only)
    pub sea: Option<String>,
}
