//! Configuration module.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AnthropicSettings, EmbeddingSettings, GeneralSettings, IngestSettings, SearchSettings,
    SessionSettings, Settings, VectorStoreSettings,
};
