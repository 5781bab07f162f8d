use crate::error::Result;
use crate::manager::ConnectionManager;
use std::collections::HashSet;
use wings_protocol::{Connection, ConnectionKind, Item, PairKey};
use wings_relevance::SignalScores;

impl ConnectionManager {
    /// Connection pass over a set of items, e.g. after a bulk import.
    ///
    /// Instead of one generator call per pair, all items with a summary go
    /// into a single batch prompt; those pairs become `semantic` connections.
    /// Every remaining pair is then scored on collections and domain alone and
    /// accepted as `taxonomy` when it clears the threshold. A failed batch
    /// call only skips the semantic step. Everything accepted is written in
    /// one store call.
    pub async fn batch_analyze_connections(&self, items: &[Item]) -> Result<Vec<Connection>> {
        let items = dedup_by_id(items);
        if items.len() < 2 {
            return Ok(Vec::new());
        }

        log::info!("Batch analyzing connections for {} items", items.len());

        let existing: HashSet<PairKey> = self
            .store
            .get_all_edges()
            .await?
            .iter()
            .map(|edge| PairKey::new(&edge.item_id1, &edge.item_id2))
            .collect();

        let mut accepted: Vec<Connection> = Vec::new();
        let mut accepted_pairs: HashSet<PairKey> = HashSet::new();

        self.semantic_batch_pass(&items, &existing, &mut accepted, &mut accepted_pairs)
            .await;
        let semantic_count = accepted.len();

        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                let key = PairKey::new(&a.id, &b.id);
                if existing.contains(&key) || accepted_pairs.contains(&key) {
                    continue;
                }

                let score = self.structural_score(a, b);
                if score >= self.config.accept_threshold {
                    accepted_pairs.insert(key);
                    accepted.push(Connection::new(
                        a.id.clone(),
                        b.id.clone(),
                        score,
                        ConnectionKind::Taxonomy,
                    ));
                }
            }
        }

        if !accepted.is_empty() {
            self.store.batch_upsert_edges(accepted.clone()).await?;
        }

        log::info!(
            "Batch analysis created {} connections ({} semantic, {} taxonomy)",
            accepted.len(),
            semantic_count,
            accepted.len() - semantic_count
        );
        Ok(accepted)
    }

    /// Batch pass over the whole corpus
    pub async fn batch_analyze_all(&self) -> Result<Vec<Connection>> {
        let items = self.store.get_all_items().await?;
        self.batch_analyze_connections(&items).await
    }

    /// Batch pass over the listed ids; unknown ids are skipped
    pub async fn batch_analyze_ids(&self, ids: &[String]) -> Result<Vec<Connection>> {
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            crate::manager::require_id("item id", id)?;
            match self.store.get_item(id).await? {
                Some(item) => items.push(item),
                None => log::warn!("Batch analysis skipping unknown item {}", id),
            }
        }
        self.batch_analyze_connections(&items).await
    }

    async fn semantic_batch_pass(
        &self,
        items: &[&Item],
        existing: &HashSet<PairKey>,
        accepted: &mut Vec<Connection>,
        accepted_pairs: &mut HashSet<PairKey>,
    ) {
        let summarized: Vec<&Item> = items.iter().copied().filter(|i| i.has_summary()).collect();
        if summarized.len() < 2 {
            log::debug!(
                "Skipping batch similarity: {} items with a summary",
                summarized.len()
            );
            return;
        }

        let pairs = match self
            .scorer
            .batch_similarity(
                &summarized,
                self.config.batch_semantic_threshold,
                self.config.batch_max_tokens,
            )
            .await
        {
            Ok(pairs) => pairs,
            Err(e) => {
                log::warn!(
                    "Batch similarity failed, continuing with collection/domain signals only: {}",
                    e
                );
                return;
            }
        };

        for pair in pairs {
            let a = summarized[pair.first];
            let b = summarized[pair.second];
            let key = PairKey::new(&a.id, &b.id);
            if existing.contains(&key) || accepted_pairs.contains(&key) {
                continue;
            }
            accepted_pairs.insert(key);
            accepted.push(Connection::new(
                a.id.clone(),
                b.id.clone(),
                pair.score.min(1.0),
                ConnectionKind::Semantic,
            ));
        }
    }

    /// `taxonomy * w_t + locality * w_l` (a plain sum, not an average)
    fn structural_score(&self, a: &Item, b: &Item) -> f32 {
        let signals = SignalScores::structural(a, b);
        signals.taxonomy * self.config.batch_taxonomy_weight
            + signals.locality * self.config.batch_locality_weight
    }
}

fn dedup_by_id(items: &[Item]) -> Vec<&Item> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| !item.id.is_empty() && seen.insert(item.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wings_relevance::DisabledGenerator;
    use wings_store::{MemoryStore, RecordStore};

    #[test]
    fn dedup_keeps_first_occurrence() {
        let items = vec![
            Item::new("a", "", "first"),
            Item::new("a", "", "second"),
            Item::new("", "", "blank"),
            Item::new("b", "", "b"),
        ];
        let unique = dedup_by_id(&items);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title, "first");
    }

    #[tokio::test]
    async fn structural_pass_runs_when_generator_is_down() {
        let items = vec![
            Item::new("a", "https://docs.rs/tokio", "A").with_summary("x"),
            Item::new("b", "https://docs.rs/serde", "B").with_summary("y"),
            Item::new("c", "https://example.org", "C"),
        ];
        let store = Arc::new(MemoryStore::with_items(items.clone()).await);
        let manager = ConnectionManager::new(store.clone(), Arc::new(DisabledGenerator));

        let created = manager.batch_analyze_connections(&items).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, ConnectionKind::Taxonomy);
        assert!((created[0].score - 0.32).abs() < 1e-5);
        assert!(store.get_edge_between("b", "a").await.unwrap().is_some());
    }
}
