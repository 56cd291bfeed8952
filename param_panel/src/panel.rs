//! Panel state and its transitions.

use crate::error::{ExtractError, PanelError};
use crate::extractor::{self, EditableParameter, NodeNames, NodeParameters};
use crate::feed::RequestSink;
use panel_protocol::ClientRequest;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    None,
    Node {
        node: String,
        params: NodeParameters,
    },
}

#[derive(Debug, Default)]
pub struct PanelState {
    /// Raw text of the most recent inbound message; replaced by each message.
    last_payload: Option<String>,
    node_options: NodeNames,
    selection: Selection,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_payload(&self) -> Option<&str> {
        self.last_payload.as_deref()
    }

    pub fn node_options(&self) -> &NodeNames {
        &self.node_options
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_node(&self) -> Option<&str> {
        match &self.selection {
            Selection::None => None,
            Selection::Node { node, .. } => Some(node),
        }
    }

    pub fn rows(&self) -> Vec<EditableParameter> {
        match &self.selection {
            Selection::None => Vec::new(),
            Selection::Node { params, .. } => params.rows(),
        }
    }

    /// Caches `raw` and refreshes the node options from it.
    pub fn on_feed_message(&mut self, raw: String) -> &NodeNames {
        self.node_options = extractor::extract_node_names(&raw);
        if let Some(err) = self.node_options.error() {
            tracing::debug!("inbound message carries no parameter list: {err}");
        }
        self.last_payload = Some(raw);
        &self.node_options
    }

    /// Re-derives all control state for `node` from the cached payload.
    ///
    /// On failure the previous selection is left in place.
    pub fn select_node(&mut self, node: &str) -> Result<usize, ExtractError> {
        let raw = self.last_payload.as_deref().unwrap_or_default();
        let params = extractor::extract_parameters_by_node(raw, node)?;
        let count = params.len();
        tracing::info!(node, count, "node selected");
        self.selection = Selection::Node {
            node: node.to_string(),
            params,
        };
        Ok(count)
    }

    /// Sets one control and sends the matching update request.
    pub fn edit(
        &mut self,
        index: usize,
        value: f64,
        sink: &dyn RequestSink,
    ) -> Result<(), PanelError> {
        let Selection::Node { node, params } = &mut self.selection else {
            return Err(PanelError::NoNodeSelected);
        };
        let len = params.len();
        let (Some(slot), Some(leaf)) = (params.values.get_mut(index), params.names.get(index))
        else {
            return Err(PanelError::NoSuchParameter { index, len });
        };
        *slot = value;

        tracing::debug!(node = %node, leaf = %leaf, value, "parameter edited");
        sink.send_request(ClientRequest::set_one(node, leaf, index, value));
        Ok(())
    }

    /// Like [`PanelState::edit`] but addresses the control by leaf name.
    pub fn edit_by_name(
        &mut self,
        leaf: &str,
        value: f64,
        sink: &dyn RequestSink,
    ) -> Result<(), PanelError> {
        let index = match &self.selection {
            Selection::None => return Err(PanelError::NoNodeSelected),
            Selection::Node { params, .. } => params
                .position(leaf)
                .ok_or_else(|| PanelError::UnknownParameter(leaf.to_string()))?,
        };
        self.edit(index, value, sink)
    }

    pub fn fetch_parameters(&self, sink: &dyn RequestSink) {
        sink.send_request(ClientRequest::fetch_all());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<ClientRequest>>);

    impl RequestSink for Recorder {
        fn send_request(&self, request: ClientRequest) {
            self.0.borrow_mut().push(request);
        }
    }

    const DUMP: &str = r#"{"parameters":[
        {"name":"/camA.exposure","value":10},
        {"name":"/camA.exposure_min","value":0},
        {"name":"/camA.exposure_max","value":100},
        {"name":"/camA.exposure_step","value":1},
        {"name":"/camB.gain","value":5}]}"#;

    #[test]
    fn edit_without_selection_is_rejected() {
        let mut state = PanelState::new();
        let sink = Recorder::default();
        assert!(matches!(state.edit(0, 1.0, &sink), Err(PanelError::NoNodeSelected)));
        assert!(sink.0.borrow().is_empty());
    }

    #[test]
    fn select_before_any_message_fails_and_keeps_state() {
        let mut state = PanelState::new();
        assert!(state.select_node("camA").is_err());
        assert_eq!(state.selection(), &Selection::None);
    }

    #[test]
    fn edit_out_of_range_sends_nothing() {
        let mut state = PanelState::new();
        state.on_feed_message(DUMP.to_string());
        state.select_node("camA").unwrap();
        let sink = Recorder::default();
        assert!(matches!(
            state.edit(3, 1.0, &sink),
            Err(PanelError::NoSuchParameter { index: 3, len: 1 })
        ));
        assert!(sink.0.borrow().is_empty());
    }

    #[test]
    fn edit_by_name_resolves_index() {
        let mut state = PanelState::new();
        state.on_feed_message(DUMP.to_string());
        state.select_node("camA").unwrap();
        let sink = Recorder::default();
        state.edit_by_name("exposure", 42.0, &sink).unwrap();
        assert_eq!(state.rows()[0].value, 42.0);
        assert_eq!(sink.0.borrow()[0].id(), Some("slider-0-42-exposure"));
        assert!(matches!(
            state.edit_by_name("nope", 1.0, &sink),
            Err(PanelError::UnknownParameter(_))
        ));
    }
}
