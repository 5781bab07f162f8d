//! # Wings Relevance
//!
//! Scores how related two saved pages are.
//!
//! ## Signals
//!
//! ```text
//! (Item, Item)
//!     │
//!     ├──> Taxonomy  shared collections, |A ∩ B| / max(|A|, |B|)
//!     ├──> Locality  same host 0.8, same root domain 0.5
//!     └──> Semantic  text generator judges both summaries -> 0.0..1.0
//!                │
//!                └─> weighted average of contributing signals, capped at 1.0
//! ```
//!
//! Only the semantic signal performs I/O. Any failure there (transport error,
//! garbage output, out-of-range number) degrades that signal to 0 and never
//! escapes the scorer.

mod config;
mod error;
mod generator;
mod parse;
mod prompt;
mod scorer;
mod signals;

pub use config::ScoringWeights;
pub use error::{RelevanceError, Result};
pub use generator::{DisabledGenerator, GenerationRequest, GenerationResponse, TextGenerator};
pub use parse::{parse_batch_pairs, parse_confidence, BatchPair};
pub use prompt::{PromptBuilder, DEFAULT_MAX_SUMMARY_CHARS};
pub use scorer::{combine, PairScore, RelevanceScorer, SignalScores};
pub use signals::{
    locality_score, root_domain, taxonomy_score, LOCALITY_SAME_HOST, LOCALITY_SAME_ROOT,
};
