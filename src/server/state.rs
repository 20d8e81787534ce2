//! Server state management.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::marvel::MarvelClient;
use crate::protocol::ClientInfo;
use crate::tools::ToolRegistry;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub struct ServerState {
    pub config: ServerConfig,
    pub client: Arc<MarvelClient>,
    pub tools: ToolRegistry,
    initialized: AtomicBool,
    client_info: RwLock<Option<ClientInfo>>,
    request_count: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig, client: Arc<MarvelClient>, tools: ToolRegistry) -> Self {
        Self {
            config,
            client,
            tools,
            initialized: AtomicBool::new(false),
            client_info: RwLock::new(None),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn set_initialized(&self, client_info: ClientInfo) {
        *self.client_info.write() = Some(client_info);
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub fn client_info(&self) -> Option<ClientInfo> {
        self.client_info.read().clone()
    }

    pub fn record_request(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }
}

pub struct ServerStateBuilder {
    config: Option<ServerConfig>,
    client: Option<Arc<MarvelClient>>,
}

impl ServerStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            client: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn client(mut self, client: Arc<MarvelClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<ServerState> {
        let config = self.config.unwrap_or_default();
        let client = match self.client {
            Some(client) => client,
            None => Arc::new(MarvelClient::new(config.marvel.clone())?),
        };

        let tools = crate::tools::create_registry(Arc::clone(&client));

        Ok(ServerState::new(config, client, tools))
    }
}

impl Default for ServerStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MarvelConfigBuilder, ServerConfig};

    #[test]
    fn test_builder_creates_registry() {
        let marvel = MarvelConfigBuilder::new()
            .public_key("1234")
            .private_key("abcd")
            .build()
            .unwrap();
        let config = ServerConfig::builder().marvel(marvel).build();

        let state = ServerStateBuilder::new().config(config).build().unwrap();
        assert_eq!(state.tools.len(), 6);
        assert!(!state.is_initialized());
    }
}
