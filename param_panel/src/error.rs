use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid JSON structure: 'parameters' field is missing or not an array.")]
    MissingParameters,
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("no node selected")]
    NoNodeSelected,
    #[error("no parameter at index {index} (node has {len})")]
    NoSuchParameter { index: usize, len: usize },
    #[error("no parameter named {0:?}")]
    UnknownParameter(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid feed url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported feed url scheme {0:?} (expected ws or wss)")]
    UnsupportedScheme(String),
    #[error("invalid sub-protocol {0:?}")]
    InvalidSubprotocol(String),
    #[error("request encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
}
