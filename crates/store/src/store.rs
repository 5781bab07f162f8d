use crate::error::Result;
use async_trait::async_trait;
use wings_protocol::{Connection, ConnectionPatch, Item};

/// Record store consumed by the connection engine.
///
/// Items are owned by whoever captured them; this contract only reads them.
/// Connections are owned by the engine and written through here.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_all_items(&self) -> Result<Vec<Item>>;

    async fn get_item(&self, id: &str) -> Result<Option<Item>>;

    /// Order-independent: `(a, b)` and `(b, a)` resolve to the same record
    async fn get_edge_between(&self, id1: &str, id2: &str) -> Result<Option<Connection>>;

    async fn get_edges_for_item(&self, id: &str) -> Result<Vec<Connection>>;

    async fn get_all_edges(&self) -> Result<Vec<Connection>>;

    async fn create_edge(&self, edge: Connection) -> Result<Connection>;

    /// Fails with `NotFound` for an unknown id
    async fn update_edge(&self, id: &str, patch: ConnectionPatch) -> Result<Connection>;

    /// Unknown ids are a no-op
    async fn delete_edge(&self, id: &str) -> Result<()>;

    async fn delete_edges_for_item(&self, id: &str) -> Result<()>;

    /// Single write for a whole batch
    async fn batch_upsert_edges(&self, edges: Vec<Connection>) -> Result<()>;
}
