//! # Wings Store
//!
//! The persistence contract consumed by the connection engine, and an
//! in-process implementation of it.
//!
//! ## Architecture
//!
//! ```text
//! ConnectionManager
//!     │
//!     └──> RecordStore (trait)
//!            │
//!            └─> MemoryStore
//!                  ├─ items:   id -> Item
//!                  ├─ edges:   id -> Connection
//!                  ├─ pairs:   unordered pair -> connection id
//!                  └─ snapshot: versioned JSON (load/save)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use wings_store::{MemoryStore, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> wings_store::Result<()> {
//!     let store = MemoryStore::load_or_default(".wings/store.json").await?;
//!     println!("{} items", store.get_all_items().await?.len());
//!     store.save(".wings/store.json").await?;
//!     Ok(())
//! }
//! ```

mod error;
mod memory;
mod store;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, STORE_SNAPSHOT_SCHEMA_VERSION};
pub use store::RecordStore;
