use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// A saved page ("wing").
///
/// Only the fields the connection engine reads are modelled. Everything the
/// capture layer may leave out is optional or defaulted, so a record with
/// nothing but an id still deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// Short synopsis produced out-of-band (may be missing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Collection / nest memberships
    #[serde(default, deserialize_with = "null_as_default")]
    pub collection_ids: Vec<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            summary: None,
            collection_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_collections<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collection_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Summary text, if present and not blank
    pub fn summary_text(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn has_summary(&self) -> bool {
        self.summary_text().is_some()
    }
}

/// Explicit `null` reads the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// How a connection came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Accepted by a scoring pass that consulted the language model
    Semantic,

    /// Accepted from shared collections / domain alone
    Taxonomy,

    /// Asserted by the user; score is pinned to 1.0
    Manual,
}

impl ConnectionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConnectionKind::Semantic => "semantic",
            ConnectionKind::Taxonomy => "taxonomy",
            ConnectionKind::Manual => "manual",
        }
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Undirected, scored relation between two distinct items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub item_id1: String,
    pub item_id2: String,

    /// Combined relevance in [0, 1]
    pub score: f32,

    #[serde(rename = "type")]
    pub kind: ConnectionKind,

    /// Unix epoch milliseconds
    #[serde(default)]
    pub created_at: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

impl Connection {
    /// New connection with a pair-derived id. The score is clamped to [0, 1].
    pub fn new(
        item_id1: impl Into<String>,
        item_id2: impl Into<String>,
        score: f32,
        kind: ConnectionKind,
    ) -> Self {
        let item_id1 = item_id1.into();
        let item_id2 = item_id2.into();
        Self {
            id: crate::connection_id(&item_id1, &item_id2),
            item_id1,
            item_id2,
            score: clamp_score(score),
            kind,
            created_at: now_ms(),
            updated_at: None,
        }
    }

    pub fn manual(item_id1: impl Into<String>, item_id2: impl Into<String>) -> Self {
        Self::new(item_id1, item_id2, 1.0, ConnectionKind::Manual)
    }

    pub fn touches(&self, item_id: &str) -> bool {
        self.item_id1 == item_id || self.item_id2 == item_id
    }

    /// The endpoint that is not `item_id`, if this connection touches it
    pub fn other_end(&self, item_id: &str) -> Option<&str> {
        if self.item_id1 == item_id {
            Some(&self.item_id2)
        } else if self.item_id2 == item_id {
            Some(&self.item_id1)
        } else {
            None
        }
    }

    pub fn connects(&self, a: &str, b: &str) -> bool {
        crate::same_pair((&self.item_id1, &self.item_id2), (a, b))
    }

    /// Apply an in-place update
    pub fn apply(&mut self, patch: ConnectionPatch) {
        if let Some(score) = patch.score {
            self.score = clamp_score(score);
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        self.updated_at = Some(now_ms());
    }
}

/// Partial update for [`Connection`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConnectionKind>,
}

impl ConnectionPatch {
    pub fn promote_to_manual() -> Self {
        Self {
            score: Some(1.0),
            kind: Some(ConnectionKind::Manual),
        }
    }
}

/// An item resolved through one of its connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedItem {
    #[serde(flatten)]
    pub item: Item,
    pub connection_score: f32,
    pub connection_type: ConnectionKind,
    pub connection_id: String,
}

/// Aggregate figures over the whole connection graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub total_items: usize,
    pub average_score: f32,
    pub high_score_connections: usize,
    pub connections_by_type: BTreeMap<ConnectionKind, usize>,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
