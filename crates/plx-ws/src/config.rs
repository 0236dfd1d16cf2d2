//! Feed client configuration.

use crate::error::{WsError, WsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a topic handler does when the subscriber's channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Wait for the subscriber. The transport's dispatch for that topic is
    /// held until the event is accepted, so a slow consumer slows its own
    /// topic and nothing is lost.
    #[default]
    Block,
    /// Drop the incoming event and keep the transport moving.
    DropNewest,
}

/// Feed client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Capacity of each subscriber channel. Must be at least 1.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Behavior on a full subscriber channel.
    #[serde(default)]
    pub delivery: DeliveryPolicy,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            delivery: DeliveryPolicy::default(),
        }
    }
}

impl FeedConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> WsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WsError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> WsResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| WsError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WsResult<()> {
        if self.channel_capacity == 0 {
            return Err(WsError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
