#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wings_connections::{ConnectionManager, Item};
use wings_relevance::{GenerationRequest, GenerationResponse, RelevanceError, TextGenerator};
use wings_store::MemoryStore;

enum Reply {
    Text(String),
    Fail,
}

struct Rule {
    needles: Vec<String>,
    reply: Reply,
}

/// Text generator fake: the first rule whose needles all occur in the prompt
/// decides the reply; otherwise the default reply is used.
pub struct ScriptedGenerator {
    rules: Vec<Rule>,
    default: Reply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(default: &str) -> Self {
        Self {
            rules: Vec::new(),
            default: Reply::Text(default.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            default: Reply::Fail,
            ..Self::replying("")
        }
    }

    pub fn when(mut self, needles: &[&str], reply: &str) -> Self {
        self.rules.push(Rule {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            reply: Reply::Text(reply.to_string()),
        });
        self
    }

    pub fn fail_when(mut self, needles: &[&str]) -> Self {
        self.rules.push(Rule {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            reply: Reply::Fail,
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> wings_relevance::Result<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let reply = self
            .rules
            .iter()
            .find(|rule| rule.needles.iter().all(|n| request.prompt.contains(n.as_str())))
            .map(|rule| &rule.reply)
            .unwrap_or(&self.default);

        match reply {
            Reply::Text(text) => Ok(GenerationResponse { text: text.clone() }),
            Reply::Fail => Err(RelevanceError::Generation("provider unavailable".to_string())),
        }
    }
}

pub fn page(id: &str, url: &str, title: &str) -> Item {
    Item::new(id, url, title)
}

pub async fn setup(
    items: Vec<Item>,
    generator: ScriptedGenerator,
) -> (Arc<MemoryStore>, Arc<ScriptedGenerator>, ConnectionManager) {
    let store = Arc::new(MemoryStore::with_items(items).await);
    let generator = Arc::new(generator);
    let manager = ConnectionManager::new(store.clone(), generator.clone());
    (store, generator, manager)
}
