use crate::config::ScoringWeights;
use crate::error::{RelevanceError, Result};
use crate::generator::{GenerationRequest, TextGenerator};
use crate::parse::{parse_batch_pairs, parse_confidence, BatchPair};
use crate::prompt::PromptBuilder;
use crate::signals::{locality_score, taxonomy_score};
use std::sync::Arc;
use wings_protocol::Item;

const DEFAULT_PAIR_MAX_TOKENS: u32 = 10;

/// Raw signal values for one pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalScores {
    pub taxonomy: f32,
    pub locality: f32,

    /// `None` when the signal does not apply (a summary is missing)
    pub semantic: Option<f32>,
}

impl SignalScores {
    /// Taxonomy and locality only; no I/O
    pub fn structural(a: &Item, b: &Item) -> Self {
        Self {
            taxonomy: taxonomy_score(&a.collection_ids, &b.collection_ids),
            locality: locality_score(&a.url, &b.url),
            semantic: None,
        }
    }
}

/// Signals plus their weighted combination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub signals: SignalScores,
    pub combined: f32,
}

/// Weighted average over the signals that actually contribute.
///
/// A signal contributes when both its value and its weight are above 0; the
/// others stay out of the denominator. Without a semantic signal the
/// taxonomy and locality weights are doubled. The result is capped at 1.0,
/// and is exactly 0 when nothing contributes.
pub fn combine(signals: &SignalScores, weights: &ScoringWeights) -> f32 {
    let weights = if signals.semantic.is_some() {
        *weights
    } else {
        weights.without_semantic()
    };

    let terms = [
        (signals.taxonomy, weights.taxonomy),
        (signals.locality, weights.locality),
        (signals.semantic.unwrap_or(0.0), weights.semantic),
    ];

    let (weighted, total_weight) = terms
        .iter()
        .filter(|(score, weight)| *score > 0.0 && *weight > 0.0)
        .fold((0.0f32, 0.0f32), |(num, den), (score, weight)| {
            (num + score * weight, den + weight)
        });

    if total_weight <= 0.0 {
        0.0
    } else {
        (weighted / total_weight).min(1.0)
    }
}

/// Pairwise relevance scorer
///
/// Holds the text generator used for the semantic signal. Everything else is
/// computed locally.
pub struct RelevanceScorer {
    generator: Arc<dyn TextGenerator>,
    weights: ScoringWeights,
    prompts: PromptBuilder,
    pair_max_tokens: u32,
}

impl RelevanceScorer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            weights: ScoringWeights::default(),
            prompts: PromptBuilder::default(),
            pair_max_tokens: DEFAULT_PAIR_MAX_TOKENS,
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_pair_max_tokens(mut self, max_tokens: u32) -> Self {
        self.pair_max_tokens = max_tokens;
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a pair using every applicable signal
    pub async fn score(&self, a: &Item, b: &Item) -> PairScore {
        let mut signals = SignalScores::structural(a, b);
        signals.semantic = self.semantic_similarity(a, b).await;
        let combined = combine(&signals, &self.weights);

        log::debug!(
            "Scored {} <-> {}: taxonomy={:.2} locality={:.2} semantic={:?} combined={:.3}",
            a.id,
            b.id,
            signals.taxonomy,
            signals.locality,
            signals.semantic,
            combined
        );

        PairScore { signals, combined }
    }

    /// Language-model similarity of the two summaries.
    ///
    /// `None` when either summary is missing. A failed call or an unusable
    /// reply yields `Some(0.0)`.
    pub async fn semantic_similarity(&self, a: &Item, b: &Item) -> Option<f32> {
        if !a.has_summary() || !b.has_summary() {
            return None;
        }

        let request =
            GenerationRequest::new(self.prompts.build_pair_prompt(a, b), self.pair_max_tokens);
        let response = match self.generator.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!(
                    "Semantic similarity unavailable for {} <-> {}: {}",
                    a.id,
                    b.id,
                    e
                );
                return Some(0.0);
            }
        };

        match parse_confidence(&response.text) {
            Some(value) => Some(value),
            None => {
                log::debug!(
                    "Discarding unusable similarity reply for {} <-> {}: {:?}",
                    a.id,
                    b.id,
                    response.text
                );
                Some(0.0)
            }
        }
    }

    /// One generator call covering every pair among `items`.
    ///
    /// Indices in the returned pairs refer to positions in `items`. Unlike the
    /// pairwise signal, a failed call is reported so the caller can skip the
    /// semantic step as a whole.
    pub async fn batch_similarity(
        &self,
        items: &[&Item],
        min_score: f32,
        max_tokens: u32,
    ) -> Result<Vec<BatchPair>> {
        if items.len() < 2 {
            return Ok(Vec::new());
        }
        if items.iter().any(|item| !item.has_summary()) {
            return Err(RelevanceError::Other(
                "batch similarity needs a summary for every item".to_string(),
            ));
        }

        let prompt = self.prompts.build_batch_prompt(items, min_score);
        let response = self
            .generator
            .generate(GenerationRequest::new(prompt, max_tokens))
            .await?;
        let pairs = parse_batch_pairs(&response.text, items.len(), min_score);

        log::debug!(
            "Batch similarity over {} items returned {} pairs",
            items.len(),
            pairs.len()
        );
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{DisabledGenerator, GenerationResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedReply {
        text: String,
        calls: AtomicUsize,
    }

    impl FixedReply {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for FixedReply {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerationResponse {
                text: self.text.clone(),
            })
        }
    }

    fn page(id: &str, url: &str) -> Item {
        Item::new(id, url, id.to_uppercase())
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn combine_nothing_contributes_is_zero() {
        let signals = SignalScores::default();
        assert_eq!(combine(&signals, &ScoringWeights::default()), 0.0);

        let signals = SignalScores {
            semantic: Some(0.0),
            ..Default::default()
        };
        assert_eq!(combine(&signals, &ScoringWeights::default()), 0.0);
    }

    #[test]
    fn combine_single_signal_is_its_own_value() {
        let signals = SignalScores {
            taxonomy: 1.0,
            locality: 0.0,
            semantic: None,
        };
        assert!(approx(combine(&signals, &ScoringWeights::default()), 1.0));
    }

    #[test]
    fn combine_weighted_average_of_contributors() {
        let signals = SignalScores {
            taxonomy: 0.5,
            locality: 0.8,
            semantic: Some(0.9),
        };
        let expected = (0.5 * 0.20 + 0.8 * 0.15 + 0.9 * 0.65) / (0.20 + 0.15 + 0.65);
        assert!(approx(combine(&signals, &ScoringWeights::default()), expected));
    }

    #[test]
    fn combine_skips_zero_weight_signals() {
        let weights = ScoringWeights {
            semantic: 0.0,
            ..Default::default()
        };
        let signals = SignalScores {
            taxonomy: 0.5,
            locality: 0.0,
            semantic: Some(0.9),
        };
        assert!(approx(combine(&signals, &weights), 0.5));
    }

    #[tokio::test]
    async fn semantic_skipped_without_summaries() {
        let generator = FixedReply::new("0.9");
        let scorer = RelevanceScorer::new(generator.clone());
        let a = page("a", "https://a.org").with_summary("x");
        let b = page("b", "https://b.org");

        assert_eq!(scorer.semantic_similarity(&a, &b).await, None);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn out_of_range_reply_contributes_nothing() {
        let scorer = RelevanceScorer::new(FixedReply::new("1.5"));
        let a = page("a", "https://a.org").with_summary("x");
        let b = page("b", "https://b.org").with_summary("y");

        let score = scorer.score(&a, &b).await;
        assert_eq!(score.signals.semantic, Some(0.0));
        assert_eq!(score.combined, 0.0);
    }

    #[tokio::test]
    async fn generator_failure_degrades_to_zero() {
        let scorer = RelevanceScorer::new(Arc::new(DisabledGenerator));
        let a = page("a", "https://docs.rs/a").with_summary("x");
        let b = page("b", "https://docs.rs/b").with_summary("y");

        let score = scorer.score(&a, &b).await;
        assert_eq!(score.signals.semantic, Some(0.0));
        assert!(approx(score.combined, 0.8));
    }

    #[tokio::test]
    async fn full_signal_set_is_combined() {
        let scorer = RelevanceScorer::new(FixedReply::new("0.6"));
        let a = page("a", "https://blog.example.com/a")
            .with_summary("x")
            .with_collections(["c1"]);
        let b = page("b", "https://shop.example.com/b")
            .with_summary("y")
            .with_collections(["c1", "c2"]);

        let score = scorer.score(&a, &b).await;
        let expected = (0.5 * 0.20 + 0.5 * 0.15 + 0.6 * 0.65) / 1.0;
        assert!(approx(score.combined, expected));
    }

    #[tokio::test]
    async fn batch_similarity_single_item_makes_no_call() {
        let generator = FixedReply::new("0,1,0.9");
        let scorer = RelevanceScorer::new(generator.clone());
        let a = page("a", "https://a.org").with_summary("x");

        let pairs = scorer.batch_similarity(&[&a], 0.4, 100).await.unwrap();
        assert!(pairs.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_similarity_propagates_generator_errors() {
        let scorer = RelevanceScorer::new(Arc::new(DisabledGenerator));
        let a = page("a", "https://a.org").with_summary("x");
        let b = page("b", "https://b.org").with_summary("y");

        let err = scorer.batch_similarity(&[&a, &b], 0.4, 100).await;
        assert!(matches!(err, Err(RelevanceError::GeneratorDisabled)));
    }
}
