//! Building blocks of the `wings` binary: configuration loading and the
//! HTTP-backed text generator.
//!
//! ```text
//! wings.toml ──► WingsConfig ──┬─► ConnectionConfig ──► ConnectionManager
//!                              └─► LlmConfig ─► HttpTextGenerator (TextGenerator)
//! ```

pub mod config;
pub mod llm;

pub use config::{LlmConfig, WingsConfig, CONFIG_ENV, DEFAULT_CONFIG_FILE};
pub use llm::HttpTextGenerator;
