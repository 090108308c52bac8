//! Shared test harness for E2E scenarios.
//!
//! Wires a real `ChatSession` and `GeminiInterpreter` to a wiremock stand-in
//! for the Gemini API, with the in-memory store behind the application state.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lp_assistant::config::{AssistantConfig, ChatConfig, GeminiConfig};
use lp_assistant::inference::GeminiInterpreter;
use lp_assistant::session::{ChatSession, Submission, Turn, TurnContext};
use lp_assistant::state::{AppState, LoadedData};
use lp_assistant::store::MemoryStore;
use lp_protocol::{ChatMessage, Technician};

pub struct TestHarness {
    /// Mocked Gemini endpoint.
    pub gemini: MockServer,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub data: LoadedData,
    pub session: ChatSession,
    pub config: AssistantConfig,
}

impl TestHarness {
    /// Harness with the given technicians, a stored API key and the default timeout.
    pub async fn with_technicians(technicians: Vec<Technician>) -> Self {
        Self::build(technicians, 15, Some("test-key")).await
    }

    /// Harness with no API key stored.
    pub async fn without_credential(technicians: Vec<Technician>) -> Self {
        Self::build(technicians, 15, None).await
    }

    /// Harness whose session gives up after `timeout_secs`.
    pub async fn with_timeout(technicians: Vec<Technician>, timeout_secs: u64) -> Self {
        Self::build(technicians, timeout_secs, Some("test-key")).await
    }

    async fn build(technicians: Vec<Technician>, timeout_secs: u64, credential: Option<&str>) -> Self {
        let gemini = MockServer::start().await;
        let config = AssistantConfig {
            gemini: GeminiConfig {
                base_url: gemini.uri(),
                ..GeminiConfig::default()
            },
            chat: ChatConfig {
                timeout_secs,
                ..ChatConfig::default()
            },
            ..AssistantConfig::default()
        };

        let store = Arc::new(MemoryStore::with_technicians(technicians));
        if let Some(key) = credential {
            store.seed_setting(&config.credential_key, key).await;
        }
        let state = AppState::in_memory(store.clone());
        let Ok(data) = state.load().await else {
            panic!("in-memory load should succeed");
        };

        let interpreter = GeminiInterpreter::new(config.gemini.clone()).unwrap();
        let session = ChatSession::new(Arc::new(interpreter), &config.chat);

        Self {
            gemini,
            store,
            state,
            data,
            session,
            config,
        }
    }

    /// Answer every generateContent call with `text` as the model output.
    pub async fn model_replies(&self, text: &str) {
        self.model_replies_after(text, Duration::ZERO).await;
    }

    pub async fn model_replies_after(&self, text: &str, delay: Duration) {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        });
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(&self.gemini)
            .await;
    }

    /// Answer every generateContent call with an error response.
    pub async fn model_fails(&self, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.gemini)
            .await;
    }

    /// Submit `text` the way the chat screen does: fresh directory snapshot
    /// and the credential currently stored in settings.
    pub async fn say(&self, text: &str) -> Submission {
        let directory = self.data.roster.snapshot().await;
        let credential = self.data.settings.credential(&self.config).await;
        let ctx = TurnContext {
            directory: &directory,
            credential: credential.as_deref(),
            orders: &self.data.orders,
        };
        self.session.submit(text, &ctx).await
    }

    /// Like [`say`](Self::say) but expects the submission to be accepted.
    pub async fn turn(&self, text: &str) -> Turn {
        match self.say(text).await {
            Submission::Completed(turn) => turn,
            Submission::Ignored(reason) => panic!("submission ignored: {reason:?}"),
        }
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.session.history().await
    }

    /// Number of HTTP requests the Gemini mock received.
    pub async fn gemini_calls(&self) -> usize {
        self.gemini
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }
}

/// Single technician "André" with id `t1`.
pub fn andre() -> Vec<Technician> {
    vec![Technician::new("t1", "André").with_commission(30.0)]
}

/// "André" plus "André Silva".
pub fn two_andres() -> Vec<Technician> {
    vec![
        Technician::new("t1", "André"),
        Technician::new("t2", "André Silva"),
    ]
}
