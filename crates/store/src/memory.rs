use crate::error::{Result, StoreError};
use crate::store::RecordStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;
use wings_protocol::{Connection, ConnectionKind, ConnectionPatch, Item, PairKey};

pub const STORE_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// In-process [`RecordStore`] with optional JSON snapshot persistence.
///
/// Every connection is indexed by its unordered endpoint pair, so at most one
/// connection can exist per pair no matter which id it was written with.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    items: BTreeMap<String, Item>,
    edges: BTreeMap<String, Connection>,
    pairs: HashMap<PairKey, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStore {
    schema_version: u32,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    connections: Vec<Connection>,
}

impl StoreState {
    fn edge_for_pair(&self, a: &str, b: &str) -> Option<&Connection> {
        self.pairs
            .get(&PairKey::new(a, b))
            .and_then(|id| self.edges.get(id))
    }

    fn insert_edge(&mut self, edge: Connection) {
        // Whatever currently occupies this id or this pair is replaced.
        self.remove_edge(&edge.id);
        let key = PairKey::new(&edge.item_id1, &edge.item_id2);
        if let Some(old_id) = self.pairs.get(&key).cloned() {
            self.remove_edge(&old_id);
        }
        self.pairs.insert(key, edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    fn remove_edge(&mut self, id: &str) -> Option<Connection> {
        let edge = self.edges.remove(id)?;
        let key = PairKey::new(&edge.item_id1, &edge.item_id2);
        if self.pairs.get(&key).map(String::as_str) == Some(id) {
            self.pairs.remove(&key);
        }
        Some(edge)
    }
}

fn validate_edge(edge: &Connection) -> Result<()> {
    if edge.id.is_empty() {
        return Err(StoreError::InvalidRecord("connection id is empty".to_string()));
    }
    if edge.item_id1.is_empty() || edge.item_id2.is_empty() {
        return Err(StoreError::InvalidRecord(format!(
            "connection {} has an empty endpoint",
            edge.id
        )));
    }
    if edge.item_id1 == edge.item_id2 {
        return Err(StoreError::InvalidRecord(format!(
            "connection {} links item {} to itself",
            edge.id, edge.item_id1
        )));
    }
    Ok(())
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let store = Self::new();
        store.upsert_items(items).await;
        store
    }

    pub async fn upsert_item(&self, item: Item) {
        let mut state = self.state.write().await;
        state.items.insert(item.id.clone(), item);
    }

    pub async fn upsert_items(&self, items: impl IntoIterator<Item = Item>) -> usize {
        let mut state = self.state.write().await;
        let mut count = 0;
        for item in items {
            state.items.insert(item.id.clone(), item);
            count += 1;
        }
        count
    }

    /// Remove an item record. Its connections are left for the caller to purge.
    pub async fn remove_item(&self, id: &str) -> Option<Item> {
        self.state.write().await.items.remove(id)
    }

    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.state.read().await.edges.len()
    }

    /// Load a snapshot written by [`MemoryStore::save`]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading store snapshot from {:?}", path);
        let bytes = tokio::fs::read(path).await?;
        let persisted: PersistedStore = serde_json::from_slice(&bytes)?;
        if persisted.schema_version != STORE_SNAPSHOT_SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: persisted.schema_version,
                expected: STORE_SNAPSHOT_SCHEMA_VERSION,
            });
        }

        let mut state = StoreState::default();
        for item in persisted.items {
            state.items.insert(item.id.clone(), item);
        }
        for edge in persisted.connections {
            if let Err(e) = validate_edge(&edge) {
                log::warn!("Skipping invalid connection in snapshot: {}", e);
                continue;
            }
            if state.edge_for_pair(&edge.item_id1, &edge.item_id2).is_some() {
                log::warn!(
                    "Skipping duplicate connection {} between {} and {}",
                    edge.id,
                    edge.item_id1,
                    edge.item_id2
                );
                continue;
            }
            state.insert_edge(edge);
        }

        log::info!(
            "Loaded {} items and {} connections",
            state.items.len(),
            state.edges.len()
        );
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Load a snapshot, or start empty when none exists yet
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await? {
            Self::load(path).await
        } else {
            log::debug!("No store snapshot at {:?}, starting empty", path);
            Ok(Self::new())
        }
    }

    /// Write a snapshot atomically (temp file + rename)
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let persisted = {
            let state = self.state.read().await;
            PersistedStore {
                schema_version: STORE_SNAPSHOT_SCHEMA_VERSION,
                items: state.items.values().cloned().collect(),
                connections: state.edges.values().cloned().collect(),
            }
        };
        let bytes = serde_json::to_vec_pretty(&persisted)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::info!(
            "Saved store snapshot to {:?} ({} items, {} connections)",
            path,
            persisted.items.len(),
            persisted.connections.len()
        );
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_all_items(&self) -> Result<Vec<Item>> {
        Ok(self.state.read().await.items.values().cloned().collect())
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        Ok(self.state.read().await.items.get(id).cloned())
    }

    async fn get_edge_between(&self, id1: &str, id2: &str) -> Result<Option<Connection>> {
        Ok(self.state.read().await.edge_for_pair(id1, id2).cloned())
    }

    async fn get_edges_for_item(&self, id: &str) -> Result<Vec<Connection>> {
        let state = self.state.read().await;
        Ok(state
            .edges
            .values()
            .filter(|edge| edge.touches(id))
            .cloned()
            .collect())
    }

    async fn get_all_edges(&self) -> Result<Vec<Connection>> {
        Ok(self.state.read().await.edges.values().cloned().collect())
    }

    async fn create_edge(&self, edge: Connection) -> Result<Connection> {
        validate_edge(&edge)?;
        let mut state = self.state.write().await;
        if let Some(existing) = state.edge_for_pair(&edge.item_id1, &edge.item_id2) {
            log::debug!(
                "Connection between {} and {} already exists ({}), keeping it",
                edge.item_id1,
                edge.item_id2,
                existing.id
            );
            return Ok(existing.clone());
        }
        state.insert_edge(edge.clone());
        Ok(edge)
    }

    async fn update_edge(&self, id: &str, patch: ConnectionPatch) -> Result<Connection> {
        let mut state = self.state.write().await;
        let edge = state
            .edges
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("connection {id}")))?;
        edge.apply(patch);
        Ok(edge.clone())
    }

    async fn delete_edge(&self, id: &str) -> Result<()> {
        self.state.write().await.remove_edge(id);
        Ok(())
    }

    async fn delete_edges_for_item(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let doomed: Vec<String> = state
            .edges
            .values()
            .filter(|edge| edge.touches(id))
            .map(|edge| edge.id.clone())
            .collect();
        for edge_id in &doomed {
            state.remove_edge(edge_id);
        }
        log::debug!("Deleted {} connections for item {}", doomed.len(), id);
        Ok(())
    }

    async fn batch_upsert_edges(&self, edges: Vec<Connection>) -> Result<()> {
        for edge in &edges {
            validate_edge(edge)?;
        }

        let mut state = self.state.write().await;
        for edge in edges {
            let pinned = state
                .edge_for_pair(&edge.item_id1, &edge.item_id2)
                .is_some_and(|existing| existing.kind == ConnectionKind::Manual);
            if pinned && edge.kind != ConnectionKind::Manual {
                log::debug!(
                    "Keeping manual connection between {} and {}",
                    edge.item_id1,
                    edge.item_id2
                );
                continue;
            }
            state.insert_edge(edge);
        }
        Ok(())
    }
}
