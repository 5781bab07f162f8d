use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};
use std::cmp::Ordering;
use std::sync::Arc;
use wings_protocol::{
    Connection, ConnectionKind, ConnectionPatch, ConnectionStats, Item, RelatedItem,
};
use wings_relevance::{PromptBuilder, RelevanceScorer, TextGenerator};
use wings_store::RecordStore;

/// Discovers, persists and serves connections between saved pages.
///
/// Holds its own store handle, so independent managers (one per test, say)
/// never share state.
pub struct ConnectionManager {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) scorer: RelevanceScorer,
    pub(crate) config: ConnectionConfig,
}

impl ConnectionManager {
    /// Manager with default thresholds
    pub fn new(store: Arc<dyn RecordStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self::build(store, generator, ConnectionConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn TextGenerator>,
        config: ConnectionConfig,
    ) -> Result<Self> {
        config.validate().map_err(ConnectionError::InvalidConfig)?;
        Ok(Self::build(store, generator, config))
    }

    fn build(
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn TextGenerator>,
        config: ConnectionConfig,
    ) -> Self {
        let scorer = RelevanceScorer::new(generator)
            .with_weights(config.weights)
            .with_prompt_builder(
                PromptBuilder::new().with_max_summary_chars(config.max_summary_chars),
            )
            .with_pair_max_tokens(config.semantic_max_tokens);
        Self {
            store,
            scorer,
            config,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Score `item` against every other item and persist the pairs that
    /// clear the acceptance threshold.
    ///
    /// Pairs that are already connected (in either direction) are not
    /// rescored. New connections are always stamped `semantic`, including
    /// pairs where no summary allowed the semantic signal to run.
    pub async fn analyze_connections_for_item(&self, item: &Item) -> Result<Vec<Connection>> {
        require_id("item id", &item.id)?;

        let others: Vec<Item> = self
            .store
            .get_all_items()
            .await?
            .into_iter()
            .filter(|other| other.id != item.id)
            .collect();

        if others.is_empty() {
            log::debug!("No other items to compare with {}", item.id);
            return Ok(Vec::new());
        }

        log::info!(
            "Analyzing connections for {} against {} items",
            item.id,
            others.len()
        );

        let mut created = Vec::new();
        let mut skipped_existing = 0usize;
        for other in &others {
            if self
                .store
                .get_edge_between(&item.id, &other.id)
                .await?
                .is_some()
            {
                skipped_existing += 1;
                continue;
            }

            let score = self.scorer.score(item, other).await;
            if score.combined < self.config.accept_threshold {
                continue;
            }

            let edge = Connection::new(
                item.id.clone(),
                other.id.clone(),
                score.combined,
                ConnectionKind::Semantic,
            );
            let stored = self.store.create_edge(edge.clone()).await?;
            if stored == edge {
                created.push(stored);
            } else {
                log::debug!(
                    "Connection {} appeared concurrently, keeping existing record",
                    stored.id
                );
            }
        }

        log::info!(
            "Created {} connections for {} ({} pairs already connected)",
            created.len(),
            item.id,
            skipped_existing
        );
        Ok(created)
    }

    /// Like [`Self::analyze_connections_for_item`], resolving the item first
    pub async fn analyze_connections_for_item_id(&self, item_id: &str) -> Result<Vec<Connection>> {
        require_id("item id", item_id)?;
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| ConnectionError::ItemNotFound(item_id.to_string()))?;
        self.analyze_connections_for_item(&item).await
    }

    /// Link two items by hand. An existing connection is promoted in place to
    /// `manual` with score 1.0; calling this twice leaves a single record.
    pub async fn create_manual_connection(&self, id1: &str, id2: &str) -> Result<Connection> {
        require_pair(id1, id2)?;

        if let Some(existing) = self.store.get_edge_between(id1, id2).await? {
            return self.promote(existing).await;
        }

        let stored = self.store.create_edge(Connection::manual(id1, id2)).await?;
        if stored.kind == ConnectionKind::Manual && stored.score >= 1.0 {
            log::info!("Manually linked {} and {}", id1, id2);
            Ok(stored)
        } else {
            self.promote(stored).await
        }
    }

    async fn promote(&self, existing: Connection) -> Result<Connection> {
        if existing.kind == ConnectionKind::Manual && existing.score >= 1.0 {
            return Ok(existing);
        }
        log::info!(
            "Promoting {} connection {} to manual",
            existing.kind,
            existing.id
        );
        Ok(self
            .store
            .update_edge(&existing.id, ConnectionPatch::promote_to_manual())
            .await?)
    }

    /// Delete the connection between two items. `false` when there was none.
    pub async fn remove_connection(&self, id1: &str, id2: &str) -> Result<bool> {
        require_id("first item id", id1)?;
        require_id("second item id", id2)?;

        match self.store.get_edge_between(id1, id2).await? {
            Some(edge) => {
                self.store.delete_edge(&edge.id).await?;
                log::info!("Removed connection {} between {} and {}", edge.id, id1, id2);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Items connected to `item_id`, best score first.
    ///
    /// Connections whose other end no longer resolves to an item are skipped.
    pub async fn get_related_items(&self, item_id: &str) -> Result<Vec<RelatedItem>> {
        require_id("item id", item_id)?;

        let edges = self.store.get_edges_for_item(item_id).await?;
        let mut related = Vec::with_capacity(edges.len());
        for edge in edges {
            let Some(other_id) = edge.other_end(item_id) else {
                continue;
            };
            match self.store.get_item(other_id).await? {
                Some(item) => related.push(RelatedItem {
                    item,
                    connection_score: edge.score,
                    connection_type: edge.kind,
                    connection_id: edge.id,
                }),
                None => log::debug!(
                    "Connection {} points at missing item {}",
                    edge.id,
                    other_id
                ),
            }
        }

        related.sort_by(|a, b| {
            b.connection_score
                .partial_cmp(&a.connection_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        Ok(related)
    }

    /// Drop every connection of `item_id` (manual ones included) and analyze
    /// it again. Unknown items yield an empty list.
    pub async fn refresh_connections(&self, item_id: &str) -> Result<Vec<Connection>> {
        require_id("item id", item_id)?;

        self.store.delete_edges_for_item(item_id).await?;
        match self.store.get_item(item_id).await? {
            Some(item) => self.analyze_connections_for_item(&item).await,
            None => {
                log::debug!("Refresh requested for unknown item {}", item_id);
                Ok(Vec::new())
            }
        }
    }

    /// Aggregate figures; all zero on an empty corpus
    pub async fn get_connection_stats(&self) -> Result<ConnectionStats> {
        let edges = self.store.get_all_edges().await?;
        let total_items = self.store.get_all_items().await?.len();

        let mut stats = ConnectionStats {
            total_connections: edges.len(),
            total_items,
            ..Default::default()
        };
        if edges.is_empty() {
            return Ok(stats);
        }

        let mut score_sum = 0.0f32;
        for edge in &edges {
            score_sum += edge.score;
            if edge.score >= self.config.high_score_threshold {
                stats.high_score_connections += 1;
            }
            *stats.connections_by_type.entry(edge.kind).or_insert(0) += 1;
        }
        stats.average_score = score_sum / edges.len() as f32;
        Ok(stats)
    }
}

pub(crate) fn require_id(what: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ConnectionError::InvalidArgument(format!("{what} is empty")));
    }
    Ok(())
}

fn require_pair(id1: &str, id2: &str) -> Result<()> {
    require_id("first item id", id1)?;
    require_id("second item id", id2)?;
    if id1 == id2 {
        return Err(ConnectionError::SelfConnection(id1.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wings_relevance::DisabledGenerator;
    use wings_store::MemoryStore;

    fn page(id: &str, url: &str) -> Item {
        Item::new(id, url, id.to_uppercase())
    }

    async fn manager_with(items: Vec<Item>) -> (Arc<MemoryStore>, ConnectionManager) {
        let store = Arc::new(MemoryStore::with_items(items).await);
        let manager = ConnectionManager::new(store.clone(), Arc::new(DisabledGenerator));
        (store, manager)
    }

    #[tokio::test]
    async fn empty_corpus_stats_are_zero() {
        let (_store, manager) = manager_with(vec![]).await;
        let stats = manager.get_connection_stats().await.unwrap();
        assert_eq!(stats, ConnectionStats::default());

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "totalConnections": 0,
                "totalItems": 0,
                "averageScore": 0.0,
                "highScoreConnections": 0,
                "connectionsByType": {}
            })
        );
    }

    #[tokio::test]
    async fn lone_item_has_nothing_to_analyze() {
        let (_store, manager) = manager_with(vec![page("a", "https://a.org")]).await;
        let item = page("a", "https://a.org");
        assert!(manager
            .analyze_connections_for_item(&item)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn self_link_is_a_programmer_error() {
        let (_store, manager) = manager_with(vec![page("a", "https://a.org")]).await;
        let err = manager.create_manual_connection("a", "a").await.unwrap_err();
        assert!(matches!(err, ConnectionError::SelfConnection(_)));

        let err = manager.create_manual_connection("", "a").await.unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unlink_without_connection_is_false() {
        let (_store, manager) =
            manager_with(vec![page("a", "https://a.org"), page("b", "https://b.org")]).await;
        assert!(!manager.remove_connection("a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn refresh_unknown_item_is_empty() {
        let (_store, manager) = manager_with(vec![]).await;
        assert!(manager.refresh_connections("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn analyze_by_unknown_id_reports_not_found() {
        let (_store, manager) = manager_with(vec![]).await;
        let err = manager
            .analyze_connections_for_item_id("ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let config = ConnectionConfig {
            accept_threshold: -1.0,
            ..Default::default()
        };
        let result = ConnectionManager::with_config(store, Arc::new(DisabledGenerator), config);
        assert!(matches!(result, Err(ConnectionError::InvalidConfig(_))));
    }
}
