//! Prompts for the semantic similarity signal.
//!
//! Both prompts ask for bare numbers so the reply can be parsed without a
//! structured-output mode; see [`crate::parse`] for the readers.

use wings_protocol::Item;

pub const DEFAULT_MAX_SUMMARY_CHARS: usize = 500;

/// Prompt builder for pairwise and batch similarity questions
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    /// Maximum characters kept per title / summary
    max_summary_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            max_summary_chars: DEFAULT_MAX_SUMMARY_CHARS,
        }
    }

    pub fn with_max_summary_chars(mut self, max_chars: usize) -> Self {
        self.max_summary_chars = max_chars.max(1);
        self
    }

    /// Ask for a single confidence in [0.0, 1.0] that two pages are related
    pub fn build_pair_prompt(&self, a: &Item, b: &Item) -> String {
        format!(
            "Compare these two saved web pages and judge how closely related their topics are.\n\
             \n\
             Page 1: {}\n\
             Summary: {}\n\
             \n\
             Page 2: {}\n\
             Summary: {}\n\
             \n\
             Respond with a single decimal number between 0.0 and 1.0 for your confidence \
             that the pages are related, and nothing else.",
            self.clip(&a.title),
            self.clip(a.summary_text().unwrap_or_default()),
            self.clip(&b.title),
            self.clip(b.summary_text().unwrap_or_default()),
        )
    }

    /// Ask for every related pair among `items`, indexed from 0
    pub fn build_batch_prompt(&self, items: &[&Item], min_score: f32) -> String {
        let mut listing = String::new();
        for (idx, item) in items.iter().enumerate() {
            listing.push_str(&format!(
                "{}. {}: {}\n",
                idx,
                self.clip(&item.title),
                self.clip(item.summary_text().unwrap_or_default())
            ));
        }

        format!(
            "Below is a numbered list of saved web pages with short summaries.\n\
             \n\
             {listing}\n\
             Find the pairs of pages whose topics are related with a similarity of at least \
             {min_score:.1}. Output one pair per line as i,j,score where i and j are the list \
             numbers and score is a decimal between 0.0 and 1.0. Output nothing else. \
             If no pair qualifies, output the single word none."
        )
    }

    /// Collapse whitespace and cut to the configured length on a char boundary
    fn clip(&self, text: &str) -> String {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() <= self.max_summary_chars {
            return collapsed;
        }
        let mut clipped: String = collapsed.chars().take(self.max_summary_chars).collect();
        clipped.push('…');
        clipped
    }
}
