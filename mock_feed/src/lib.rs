//! In-process parameter feed for demos and tests.
//!
//! Serves a [`ParameterStore`] over WebSocket: `getParameters` is answered with
//! a `parameterValues` message and `setParameters` is applied to the store.
//! Every applied update is also published on [`MockFeed::updates`].

mod net;
pub mod store;

use crossbeam_channel::{bounded, Receiver};
use panel_protocol::{ParameterEntry, ParameterUpdate};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use net::NetworkThread;
pub use store::{sample_entries, ParameterStore};

pub const UPDATE_CAP: usize = 256;

#[derive(Debug, Error)]
pub enum MockFeedError {
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid parameter dump: {0}")]
    Dump(#[from] serde_json::Error),
}

pub struct MockFeed {
    net: NetworkThread,
    store: Arc<Mutex<ParameterStore>>,
    updates: Receiver<ParameterUpdate>,
}

impl MockFeed {
    /// Binds `addr` (use port 0 for an ephemeral port) and starts serving.
    pub fn spawn(addr: &str, store: ParameterStore) -> Result<Self, MockFeedError> {
        let store = Arc::new(Mutex::new(store));
        let (updates_tx, updates) = bounded(UPDATE_CAP);
        let net = NetworkThread::spawn_with_addr(addr, Arc::clone(&store), updates_tx)?;
        Ok(Self {
            net,
            store,
            updates,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.net.listen_addr()
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.listen_addr())
    }

    pub fn updates(&self) -> &Receiver<ParameterUpdate> {
        &self.updates
    }

    pub fn snapshot(&self) -> Vec<ParameterEntry> {
        self.store
            .lock()
            .map(|s| s.entries().to_vec())
            .unwrap_or_default()
    }

    pub fn shutdown(&self) {
        self.net.shutdown();
    }
}
