//! Live parameter control panel over a WebSocket parameter feed.

pub mod config;
pub mod error;
pub mod extractor;
pub mod feed;
pub mod panel;
pub mod render;
pub mod settings;

pub use config::FeedConfig;
pub use error::{ExtractError, FeedError, PanelError};
pub use extractor::{
    extract_node_names, extract_parameters_by_node, EditableParameter, NodeNames, NodeParameters,
};
pub use feed::{FeedEvent, FeedHandle, RequestSink};
pub use panel::{PanelState, Selection};

pub use panel_protocol as protocol;
