//! One chat conversation: gate, history, and the interpret-then-reconcile pipeline.
//!
//! The session is `Idle` or `AwaitingResponse`. A submission while a call is
//! in flight is dropped, not queued. Each completed call appends exactly one
//! assistant reply; an actionable create-order intent then goes through
//! reconciliation and its outcome is appended as a second message.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lp_protocol::{ChatMessage, CommandAction, CommandIntent};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::directory::TechnicianDirectory;
use crate::error::InterpretError;
use crate::inference::{CommandInterpreter, interpret};
use crate::orders::{CreateOutcome, OrderBook};
use crate::reconcile::OrderDraft;

/// States in the session FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No interpreter call in flight.
    Idle,
    /// One interpreter call in flight; new submissions are dropped.
    AwaitingResponse,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::AwaitingResponse => write!(f, "awaiting_response"),
        }
    }
}

/// Per-call collaborators, passed explicitly instead of read from globals.
pub struct TurnContext<'a> {
    /// Snapshot used for both the prompt and reconciliation.
    pub directory: &'a TechnicianDirectory,
    pub credential: Option<&'a str>,
    pub orders: &'a OrderBook,
}

/// Why a submission was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// Blank input.
    Empty,
    /// A call is already in flight.
    Busy,
}

/// What one accepted submission produced.
#[derive(Debug)]
pub struct Turn {
    /// Intent handed to the rest of the pipeline (failures collapse to `Unrecognized`).
    pub intent: CommandIntent,
    /// Set when the interpreter call failed.
    pub failure: Option<InterpretError>,
    /// Reconciliation result for an actionable create-order intent.
    pub outcome: Option<CreateOutcome>,
}

#[derive(Debug)]
pub enum Submission {
    Ignored(Ignored),
    Completed(Turn),
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ChatSession {
    session_id: String,
    interpreter: Arc<dyn CommandInterpreter>,
    timeout: Duration,
    in_flight: AtomicBool,
    history: RwLock<Vec<ChatMessage>>,
}

impl ChatSession {
    pub fn new(interpreter: Arc<dyn CommandInterpreter>, config: &ChatConfig) -> Self {
        Self {
            session_id: Uuid::now_v7().to_string(),
            interpreter,
            timeout: config.timeout(),
            in_flight: AtomicBool::new(false),
            history: RwLock::new(vec![ChatMessage::assistant(config.greeting.clone())]),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.load(Ordering::SeqCst) {
            SessionState::AwaitingResponse
        } else {
            SessionState::Idle
        }
    }

    /// Messages so far, oldest first.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.read().await.clone()
    }

    /// Submit user text. Blank text and submissions while busy are ignored.
    pub async fn submit(&self, text: &str, ctx: &TurnContext<'_>) -> Submission {
        if text.trim().is_empty() {
            return Submission::Ignored(Ignored::Empty);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(session_id = %self.session_id, "submission dropped, call in flight");
            return Submission::Ignored(Ignored::Busy);
        }
        let in_flight = InFlight(&self.in_flight);

        self.push(ChatMessage::user(text)).await;

        let names = ctx.directory.names();
        let call = interpret(self.interpreter.as_ref(), text, &names, ctx.credential);
        let (intent, failure) = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(intent)) => (intent, None),
            Ok(Err(e)) => (e.clone().into_intent(), Some(e)),
            Err(_) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    engine = self.interpreter.engine_name(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "interpreter call timed out"
                );
                let e = InterpretError::Timeout;
                (e.clone().into_intent(), Some(e))
            }
        };

        if let Some(reply) = reply_text(&intent) {
            self.push(ChatMessage::assistant(reply)).await;
        }
        drop(in_flight);

        let outcome = match &intent.action {
            CommandAction::CreateOrder(payload) => {
                let draft = OrderDraft::from(payload.clone());
                let outcome = ctx.orders.create_from_draft(&draft, ctx.directory).await;
                self.push(ChatMessage::assistant(outcome.user_message())).await;
                Some(outcome)
            }
            _ => None,
        };

        Submission::Completed(Turn {
            intent,
            failure,
            outcome,
        })
    }

    async fn push(&self, message: ChatMessage) {
        self.history.write().await.push(message);
    }
}

/// Assistant reply for an intent; `None` when there is nothing to say.
fn reply_text(intent: &CommandIntent) -> Option<String> {
    if !intent.message.trim().is_empty() {
        return Some(intent.message.clone());
    }
    match &intent.action {
        CommandAction::CreateOrder(payload) => Some(format!(
            "Ação para criar a OS #{} recebida. Processando...",
            payload.id
        )),
        _ => None,
    }
}
