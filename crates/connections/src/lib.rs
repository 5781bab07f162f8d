//! # Wings Connections
//!
//! Discovers and maintains relationships between saved pages ("wings").
//!
//! ## Pipeline
//!
//! ```text
//! new item / bulk import
//!     │
//!     ├──> ConnectionManager
//!     │      ├─ enumerate unordered pairs not yet connected
//!     │      ├─ RelevanceScorer (taxonomy, locality, semantic)
//!     │      ├─ keep pairs with score >= accept_threshold
//!     │      └─ RecordStore: persist connections
//!     │
//!     └──> queries: related items, stats, manual link / unlink, refresh
//! ```
//!
//! Two analysis paths exist. Per-item analysis asks the text generator once
//! per eligible pair and labels every accepted pair `semantic`. Batch
//! analysis asks once for the whole set, labelling generator-judged pairs
//! `semantic` and collection/domain-only pairs `taxonomy`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wings_connections::ConnectionManager;
//! use wings_relevance::DisabledGenerator;
//! use wings_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> wings_connections::Result<()> {
//!     let store = Arc::new(MemoryStore::load_or_default(".wings/store.json").await?);
//!     let manager = ConnectionManager::new(store, Arc::new(DisabledGenerator));
//!
//!     let created = manager.batch_analyze_all().await?;
//!     println!("connections found: {}", created.len());
//!     Ok(())
//! }
//! ```

mod batch;
mod config;
mod error;
mod handler;
mod manager;

pub use config::ConnectionConfig;
pub use error::{ConnectionError, Result};
pub use handler::CommandHandler;
pub use manager::ConnectionManager;

// Re-export shared records for convenience
pub use wings_protocol::{
    CommandRequest, CommandResponse, Connection, ConnectionKind, ConnectionStats, Item,
    RelatedItem,
};
