//! Scripted interpreter for tests and offline development.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lp_protocol::CommandIntent;

use super::{CommandInterpreter, InterpretRequest, intent_from_text, user_prompt};
use crate::error::{InterpretError, InterpretResult};

#[derive(Debug, Clone)]
enum Script {
    Text(String),
    Fail(InterpretError),
}

/// Replies with a fixed model output (or failure) after an optional delay.
pub struct MockInterpreter {
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockInterpreter {
    /// Reply with `raw` as if it were the model's text output.
    pub fn replying(raw: impl Into<String>) -> Self {
        Self::scripted(Script::Text(raw.into()))
    }

    /// Fail every call with `error`.
    pub fn failing(error: InterpretError) -> Self {
        Self::scripted(Script::Fail(error))
    }

    fn scripted(script: Script) -> Self {
        Self {
            script,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Sleep this long before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl CommandInterpreter for MockInterpreter {
    async fn complete(&self, request: &InterpretRequest<'_>) -> InterpretResult<CommandIntent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompt) = self.last_prompt.lock() {
            *prompt = Some(user_prompt(request.user_text, request.technician_names));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Text(raw) => intent_from_text(raw),
            Script::Fail(error) => Err(error.clone()),
        }
    }

    fn engine_name(&self) -> &str {
        "mock"
    }
}
