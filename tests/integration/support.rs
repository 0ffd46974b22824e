//! Scripted providers and session builders shared by the integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use interrogation_core::{KeyValueStore, MemoryStore};
use interrogation_llm::{
    ChatMessage, CompletionParams, LlmError, LlmProvider, LlmResponse, LlmResult,
    ProviderGateway,
};
use interrogation_room::models::level::LevelCatalog;
use interrogation_room::services::{CaseSummaryService, InterrogationChannel, InterrogationSession};

/// One recorded provider call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub system: Option<String>,
    pub params: CompletionParams,
}

/// Provider that answers from a queue and records every call. An empty
/// queue answers with a network error.
pub struct ScriptedSuspect {
    name: String,
    replies: Mutex<VecDeque<LlmResult<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedSuspect {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_replies<S: Into<String>>(
        name: &str,
        replies: impl IntoIterator<Item = S>,
    ) -> Arc<Self> {
        let suspect = Self::new(name);
        for reply in replies {
            suspect.push(&reply.into());
        }
        suspect
    }

    pub fn push(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedSuspect {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn send_message(
        &self,
        messages: Vec<ChatMessage>,
        system: Option<String>,
        params: CompletionParams,
    ) -> LlmResult<LlmResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages,
            system,
            params,
        });
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content: Some(content),
                model: "scripted".to_string(),
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::NetworkError {
                message: "script exhausted".to_string(),
            }),
        }
    }
}

pub fn gateway_of(providers: &[Arc<ScriptedSuspect>]) -> ProviderGateway {
    ProviderGateway::new(
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn LlmProvider>)
            .collect(),
    )
}

/// Builder for a level-1 session wired to scripted providers.
pub struct SessionBuilder {
    suspect: ProviderGateway,
    summarizer: ProviderGateway,
    store: Arc<dyn KeyValueStore>,
    offline_fallback: bool,
    roll: f64,
}

impl SessionBuilder {
    pub fn new(suspect: &Arc<ScriptedSuspect>) -> Self {
        Self {
            suspect: gateway_of(std::slice::from_ref(suspect)),
            summarizer: ProviderGateway::new(Vec::new()),
            store: Arc::new(MemoryStore::new()),
            offline_fallback: true,
            roll: 0.99,
        }
    }

    pub fn summarizer(mut self, writer: &Arc<ScriptedSuspect>) -> Self {
        self.summarizer = gateway_of(std::slice::from_ref(writer));
        self
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    pub fn without_offline_fallback(mut self) -> Self {
        self.offline_fallback = false;
        self
    }

    pub fn roll(mut self, roll: f64) -> Self {
        self.roll = roll;
        self
    }

    pub fn build(self) -> InterrogationSession {
        let catalog = Arc::new(LevelCatalog::builtin());
        let level = catalog.first().clone();
        let channel = InterrogationChannel::new(self.suspect, catalog)
            .with_offline_fallback(self.offline_fallback);
        let roll = self.roll;
        InterrogationSession::new(
            level,
            channel,
            CaseSummaryService::new(self.summarizer),
            self.store,
            30_000,
        )
        .with_backlash_roll(move || roll)
    }
}

/// A reply with a `:::STATUS` sidecar.
pub fn status_reply(text: &str, stress: u8, thought: &str, confession: bool) -> String {
    format!(
        "{}\n:::STATUS\n{{\"stress\": {}, \"thought\": \"{}\", \"confession\": {}}}\n:::",
        text, stress, thought, confession
    )
}
