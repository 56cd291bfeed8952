//! Pure extraction over raw parameter-dump payloads.
//!
//! A dump is `{ "parameters": [{ "name": "/<node>.<leaf>", "value": .. }, ..] }`.
//! Leaves ending in `min`, `max` or `step` carry the bounds of the editable
//! parameters of the same node. Bounds are matched to editable parameters by
//! position only, so a node must publish them in the same order and count.

use crate::error::ExtractError;
use serde_json::Value;
use std::collections::HashSet;

pub const UNKNOWN_ERROR: &str = "Error: An unknown error occurred.";

/// Range-input defaults used when a node publishes fewer bounds than
/// editable parameters.
pub const DEFAULT_MIN: f64 = 0.0;
pub const DEFAULT_MAX: f64 = 100.0;
pub const DEFAULT_STEP: f64 = 1.0;

/// Result of [`extract_node_names`]. Failures are carried as a display
/// string instead of an error type; callers must check the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeNames {
    Nodes(Vec<String>),
    Error(String),
}

impl Default for NodeNames {
    fn default() -> Self {
        NodeNames::Nodes(Vec::new())
    }
}

impl NodeNames {
    fn from_error(err: &ExtractError) -> Self {
        let msg = err.to_string();
        if msg.trim().is_empty() {
            NodeNames::Error(UNKNOWN_ERROR.to_string())
        } else {
            NodeNames::Error(format!("Error: {msg}"))
        }
    }

    /// Known node names; empty for the error variant.
    pub fn as_slice(&self) -> &[String] {
        match self {
            NodeNames::Nodes(nodes) => nodes,
            NodeNames::Error(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            NodeNames::Nodes(_) => None,
            NodeNames::Error(msg) => Some(msg),
        }
    }

    pub fn contains(&self, node: &str) -> bool {
        self.as_slice().iter().any(|n| n == node)
    }
}

/// Editable parameters of one node with their bounds, aligned by index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeParameters {
    pub names: Vec<String>,
    pub values: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    pub step: Vec<f64>,
}

/// One rendered control: a leaf parameter zipped with its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableParameter {
    pub leaf_name: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl NodeParameters {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, leaf: &str) -> Option<usize> {
        self.names.iter().position(|n| n == leaf)
    }

    pub fn row(&self, index: usize) -> Option<EditableParameter> {
        let leaf_name = self.names.get(index)?.clone();
        let value = *self.values.get(index)?;
        Some(EditableParameter {
            leaf_name,
            value,
            min: self.min.get(index).copied().unwrap_or(DEFAULT_MIN),
            max: self.max.get(index).copied().unwrap_or(DEFAULT_MAX),
            step: self.step.get(index).copied().unwrap_or(DEFAULT_STEP),
        })
    }

    pub fn rows(&self) -> Vec<EditableParameter> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Editable,
    Min,
    Max,
    Step,
    Hidden,
}

fn classify(name: &str) -> Role {
    if name.ends_with("min") {
        Role::Min
    } else if name.ends_with("max") {
        Role::Max
    } else if name.ends_with("step") {
        Role::Step
    } else if name.contains("location") || name.contains("sim") || name.ends_with("__") {
        Role::Hidden
    } else {
        Role::Editable
    }
}

fn decode_parameters(raw: &str) -> Result<Vec<Value>, ExtractError> {
    let root: Value = serde_json::from_str(raw)?;
    match root {
        Value::Object(mut map) => match map.remove("parameters") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ExtractError::MissingParameters),
        },
        _ => Err(ExtractError::MissingParameters),
    }
}

fn entry_name(item: &Value) -> Option<&str> {
    item.get("name")?.as_str()
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Text between a leading `/` and the first `.`; `None` when the name has no
/// such prefix on its first line.
pub fn node_of(name: &str) -> Option<&str> {
    let rest = name.strip_prefix('/')?;
    let end = rest.find(|c: char| c == '.' || is_line_terminator(c))?;
    rest[end..].starts_with('.').then(|| &rest[..end])
}

/// Distinct node names in first-seen order.
///
/// Never fails: malformed payloads come back as [`NodeNames::Error`].
pub fn extract_node_names(raw: &str) -> NodeNames {
    let items = match decode_parameters(raw) {
        Ok(items) => items,
        Err(e) => return NodeNames::from_error(&e),
    };

    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for name in items.iter().filter_map(entry_name) {
        if let Some(node) = node_of(name) {
            if seen.insert(node) {
                nodes.push(node.to_string());
            }
        }
    }
    NodeNames::Nodes(nodes)
}

/// Editable parameters and bounds of `node`, split into index-aligned lists.
///
/// Editable entries with non-numeric values cannot drive a slider and are
/// skipped. Non-numeric bounds fall back to the range-input defaults so the
/// bound lists keep their positions.
pub fn extract_parameters_by_node(raw: &str, node: &str) -> Result<NodeParameters, ExtractError> {
    let items = decode_parameters(raw)?;
    let prefix = format!("/{node}.");

    let mut out = NodeParameters::default();
    for item in &items {
        let Some(name) = entry_name(item) else { continue };
        if !name.starts_with(&prefix) {
            continue;
        }
        let value = item.get("value").and_then(Value::as_f64);
        match classify(name) {
            Role::Editable => {
                let Some(value) = value else {
                    tracing::debug!(name, "skipping non-numeric parameter");
                    continue;
                };
                let leaf = name.split('.').nth(1).unwrap_or_default();
                out.names.push(leaf.to_string());
                out.values.push(value);
            }
            // Bounds keep their slot even when unusable.
            Role::Min => out.min.push(value.unwrap_or(DEFAULT_MIN)),
            Role::Max => out.max.push(value.unwrap_or(DEFAULT_MAX)),
            Role::Step => out.step.push(value.unwrap_or(DEFAULT_STEP)),
            Role::Hidden => {}
        }
    }
    Ok(out)
}
