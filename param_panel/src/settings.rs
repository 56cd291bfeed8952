//! Settings-tree descriptor handed to the host, and the host's actions.

use crate::error::ExtractError;
use crate::panel::PanelState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GENERAL: &str = "general";
pub const SELECTED_NODE: &str = "selectedNode";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SettingsTree {
    pub nodes: BTreeMap<String, SettingsNode>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SettingsNode {
    pub label: String,
    pub fields: BTreeMap<String, SettingsField>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SettingsField {
    pub label: String,
    pub input: String,
    pub options: Vec<SelectOption>,
    pub value: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "action", content = "payload")]
pub enum SettingsAction {
    Update {
        path: Vec<String>,
        #[serde(default)]
        value: serde_json::Value,
    },
    PerformNodeAction {
        path: Vec<String>,
        id: String,
    },
}

pub fn settings_tree(state: &PanelState) -> SettingsTree {
    let options = state
        .node_options()
        .as_slice()
        .iter()
        .map(|node| SelectOption {
            value: node.clone(),
            label: node.clone(),
        })
        .collect();

    let selected = SettingsField {
        label: "Select Node".to_string(),
        input: "select".to_string(),
        options,
        value: state.selected_node().unwrap_or_default().to_string(),
    };

    let general = SettingsNode {
        label: "General Settings".to_string(),
        fields: BTreeMap::from([(SELECTED_NODE.to_string(), selected)]),
    };

    SettingsTree {
        nodes: BTreeMap::from([(GENERAL.to_string(), general)]),
    }
}

/// Routes a host action into the panel. Returns the number of loaded
/// parameters when the action selected a node, `None` when it was ignored.
pub fn handle_action(
    state: &mut PanelState,
    action: SettingsAction,
) -> Result<Option<usize>, ExtractError> {
    match action {
        SettingsAction::Update { path, value } => {
            if path.len() < 2 || path[0] != GENERAL || path[1] != SELECTED_NODE {
                return Ok(None);
            }
            let Some(node) = value.as_str() else {
                tracing::warn!(?value, "selected node is not a string");
                return Ok(None);
            };
            state.select_node(node).map(Some)
        }
        SettingsAction::PerformNodeAction { path, id } => {
            tracing::debug!(?path, id = %id, "node action ignored");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_action_parses_from_host_json() {
        let action: SettingsAction = serde_json::from_value(json!({
            "action": "update",
            "payload": { "path": ["general", "selectedNode"], "input": "select", "value": "camA" }
        }))
        .unwrap();
        assert_eq!(
            action,
            SettingsAction::Update {
                path: vec!["general".into(), "selectedNode".into()],
                value: json!("camA"),
            }
        );
    }

    #[test]
    fn unrelated_paths_are_ignored() {
        let mut state = PanelState::new();
        let action = SettingsAction::Update {
            path: vec!["general".into(), "other".into()],
            value: json!("camA"),
        };
        assert_eq!(handle_action(&mut state, action).unwrap(), None);
        assert!(state.selected_node().is_none());
    }

    #[test]
    fn error_listing_yields_no_options() {
        let mut state = PanelState::new();
        state.on_feed_message(r#"{"op":"serverInfo"}"#.to_string());
        let tree = settings_tree(&state);
        assert!(tree.nodes[GENERAL].fields[SELECTED_NODE].options.is_empty());
    }
}
