use crate::error::FeedError;
use url::Url;

pub const DEFAULT_FEED_URL: &str = "ws://192.168.1.100:8765";
pub const URL_ENV: &str = "PARAM_PANEL_URL";
pub const SUBPROTOCOL_ENV: &str = "PARAM_PANEL_SUBPROTOCOL";

/// Where the feed client connects and which sub-protocol it announces.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub url: Url,
    pub subprotocol: String,
}

impl FeedConfig {
    pub fn new(url: &str, subprotocol: &str) -> Result<Self, FeedError> {
        let url = Url::parse(url.trim())?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(FeedError::UnsupportedScheme(url.scheme().to_string()));
        }
        let subprotocol = subprotocol.trim();
        if subprotocol.is_empty() || subprotocol.contains(char::is_whitespace) {
            return Err(FeedError::InvalidSubprotocol(subprotocol.to_string()));
        }
        Ok(Self {
            url,
            subprotocol: subprotocol.to_string(),
        })
    }

    /// Explicit values win over the environment, which wins over the
    /// built-in endpoint.
    pub fn resolve(url: Option<&str>, subprotocol: Option<&str>) -> Result<Self, FeedError> {
        let url = url
            .map(str::to_string)
            .or_else(|| std::env::var(URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
        let subprotocol = subprotocol
            .map(str::to_string)
            .or_else(|| std::env::var(SUBPROTOCOL_ENV).ok())
            .unwrap_or_else(|| panel_protocol::SUBPROTOCOL.to_string());
        Self::new(&url, &subprotocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ws_and_wss() {
        assert!(FeedConfig::new("ws://127.0.0.1:8765", "foxglove.websocket.v1").is_ok());
        assert!(FeedConfig::new("wss://feed.local/", "foxglove.websocket.v1").is_ok());
    }

    #[test]
    fn rejects_http_scheme() {
        let err = FeedConfig::new("http://127.0.0.1:8765", "x").unwrap_err();
        assert!(matches!(err, FeedError::UnsupportedScheme(s) if s == "http"));
    }

    #[test]
    fn rejects_blank_subprotocol() {
        assert!(matches!(
            FeedConfig::new("ws://127.0.0.1:1", "  "),
            Err(FeedError::InvalidSubprotocol(_))
        ));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = FeedConfig::resolve(Some("ws://10.0.0.2:9000"), Some("custom.v2")).unwrap();
        assert_eq!(cfg.url.as_str(), "ws://10.0.0.2:9000/");
        assert_eq!(cfg.subprotocol, "custom.v2");
    }
}
