//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::gemini::{LiveConfig, TextClient};

/// State shared by all handlers.
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Gemini text generation client
    pub text_client: TextClient,
}

impl AppState {
    /// Create the application state from a loaded configuration.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let text_client = TextClient::new(
            reqwest::Client::new(),
            config.gemini_api_key.clone(),
            config.gemini_text_endpoint.clone(),
        );
        Arc::new(Self {
            config,
            text_client,
        })
    }

    /// Configuration for one upstream live session.
    pub fn live_config(&self) -> LiveConfig {
        self.config.live_config()
    }
}
