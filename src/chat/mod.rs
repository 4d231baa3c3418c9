//! Lead-qualification chat assistant.
//!
//! [`ChatController`] owns one [`Session`] and drives it through an explicit
//! [`Phase`] machine:
//!
//! ```text
//! Idle --open--> AwaitingName --submit(name)--> Active --submit(question)--> Active
//! ```
//!
//! A submission is split into three steps so callers can release locks while
//! the network round trip runs:
//! 1. [`ChatController::begin_submit`] records the user message and returns a
//!    [`PendingTurn`] (or `None` when the input is ignored),
//! 2. [`PendingTurn::run`] waits out the thinking delay or calls the generator,
//! 3. [`ChatController::complete`] appends the assistant reply.
//!
//! [`ChatController::submit`] chains all three for single-owner callers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::{GatewayError, GenerationRequest, TextGenerator};

pub mod prompt;
pub mod render;

use prompt::{build_chat_prompt, PromptContext};
use render::{parse_reply, Segment};

/// Greeting emitted when the widget is first opened.
pub const OPENING_GREETING: &str = "¡Hola! Soy Solut.ia, tu asistente virtual. Estoy aquí para ayudarte con cualquier pregunta que tengas sobre RISKscan. Para empezar, ¿cuál es tu nombre?";

/// Reply appended when a generation request fails.
pub const FALLBACK_REPLY: &str = "Lo siento, estoy teniendo problemas para conectarme en este momento. Por favor, intenta de nuevo más tarde.";

/// Default simulated thinking delay, in milliseconds, before the
/// personalized greeting.
pub const DEFAULT_THINKING_DELAY_MS: u64 = 1000;

/// Personalized greeting sent after the name is captured.
pub fn personal_greeting(name: &str) -> String {
    format!("¡Hola, {name}! Un placer conocerte. ¿En qué puedo ayudarte hoy sobre RISKscan?")
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Session model
// ---------------------------------------------------------------------------

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    /// The visitor.
    User,
    /// The assistant.
    Assistant,
}

/// A transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who wrote it.
    pub sender: Sender,
    /// Raw text.
    pub text: String,
}

impl Message {
    /// User message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// Assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }

    /// Renderable segments. Only assistant text is scanned for the booking marker.
    pub fn segments(&self) -> Vec<Segment> {
        match self.sender {
            Sender::Assistant => parse_reply(&self.text),
            Sender::User => vec![Segment::Text(self.text.clone())],
        }
    }
}

/// Conversation phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Never opened.
    Idle,
    /// Opened; the next submission is the visitor's name.
    AwaitingName,
    /// Name known; submissions are questions.
    Active {
        /// Capitalized visitor name.
        name: String,
    },
}

/// Ephemeral state of one widget activation.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    epoch: u64,
    phase: Phase,
    opening: Option<Message>,
    transcript: Vec<Message>,
    question_count: u32,
    in_flight: bool,
}

impl Session {
    fn new(epoch: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            phase: Phase::Idle,
            opening: None,
            transcript: Vec::new(),
            question_count: 0,
            in_flight: false,
        }
    }

    /// Session identifier used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Collected visitor name, once known.
    pub fn collected_name(&self) -> Option<&str> {
        match &self.phase {
            Phase::Active { name } => Some(name),
            Phase::Idle | Phase::AwaitingName => None,
        }
    }

    /// Opening greeting, present once the widget has been opened.
    pub fn opening(&self) -> Option<&Message> {
        self.opening.as_ref()
    }

    /// Exchanged messages in order, excluding the opening greeting.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Number of questions asked after name capture, failed ones included.
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    /// Whether a turn is outstanding; input must be disabled while true.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum TurnKind {
    Greeting(String),
    Question(GenerationRequest),
}

/// Work produced by an accepted submission.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    epoch: u64,
    kind: TurnKind,
}

impl PendingTurn {
    /// Generation request for question turns; `None` for the name greeting.
    pub fn request(&self) -> Option<&GenerationRequest> {
        match &self.kind {
            TurnKind::Question(request) => Some(request),
            TurnKind::Greeting(_) => None,
        }
    }

    /// Resolve the turn: wait out the thinking delay for the greeting, or
    /// perform one generation round trip. Failures become [`FALLBACK_REPLY`].
    pub async fn run(self, generator: &dyn TextGenerator, thinking_delay: Duration) -> CompletedTurn {
        match self.kind {
            TurnKind::Greeting(reply) => {
                tokio::time::sleep(thinking_delay).await;
                CompletedTurn {
                    epoch: self.epoch,
                    reply,
                    error: None,
                }
            }
            TurnKind::Question(request) => match generator.generate(request).await {
                Ok(reply) => CompletedTurn {
                    epoch: self.epoch,
                    reply,
                    error: None,
                },
                Err(err) => {
                    warn!(error = %err, model = generator.model_id(), "chat generation failed");
                    CompletedTurn {
                        epoch: self.epoch,
                        reply: FALLBACK_REPLY.to_owned(),
                        error: Some(err),
                    }
                }
            },
        }
    }
}

/// A resolved turn ready to be appended.
#[derive(Debug)]
pub struct CompletedTurn {
    epoch: u64,
    reply: String,
    error: Option<GatewayError>,
}

impl CompletedTurn {
    /// Reply text that will be appended.
    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// Underlying failure when the reply is the fallback.
    pub fn error(&self) -> Option<&GatewayError> {
        self.error.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns one chat session and applies the qualification policy.
pub struct ChatController {
    session: Session,
    visible: bool,
    generator: Arc<dyn TextGenerator>,
    thinking_delay: Duration,
}

impl ChatController {
    /// Create a controller with a closed, empty session.
    pub fn new(generator: Arc<dyn TextGenerator>, thinking_delay: Duration) -> Self {
        Self {
            session: Session::new(0),
            visible: false,
            generator,
            thinking_delay,
        }
    }

    /// Current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether the widget is open.
    pub fn is_open(&self) -> bool {
        self.visible
    }

    /// Whether input should be disabled.
    pub fn is_busy(&self) -> bool {
        self.session.in_flight
    }

    /// Open the widget. The first open emits the opening greeting; reopening
    /// keeps the existing session.
    pub fn open(&mut self) -> Option<&Message> {
        self.visible = true;
        if self.session.phase != Phase::Idle {
            return None;
        }
        self.session.phase = Phase::AwaitingName;
        self.session.opening = Some(Message::assistant(OPENING_GREETING));
        info!(session_id = %self.session.id, "chat session opened");
        self.session.opening.as_ref()
    }

    /// Hide the widget without discarding the session.
    pub fn close(&mut self) {
        self.visible = false;
        debug!(session_id = %self.session.id, "chat widget closed");
    }

    /// Discard the session. Replies to turns begun before the reset are dropped.
    pub fn reset(&mut self) {
        let epoch = self.session.epoch.wrapping_add(1);
        info!(session_id = %self.session.id, "chat session reset");
        self.session = Session::new(epoch);
        self.visible = false;
    }

    /// Accept a submission and record it.
    ///
    /// Returns `None` (no-op) when the trimmed text is empty, the widget is
    /// closed, or a turn is already outstanding.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() || !self.visible || self.session.in_flight {
            return None;
        }

        let collected = match &self.session.phase {
            Phase::Idle => return None,
            Phase::AwaitingName => None,
            Phase::Active { name } => Some(name.clone()),
        };

        let kind = match collected {
            None => {
                let name = capitalize(text);
                self.session.transcript.push(Message::user(text));
                let reply = personal_greeting(&name);
                info!(session_id = %self.session.id, "visitor name captured");
                self.session.phase = Phase::Active { name };
                TurnKind::Greeting(reply)
            }
            Some(name) => {
                let question_count = self.session.question_count.saturating_add(1);
                let prompt = build_chat_prompt(&PromptContext {
                    user_name: Some(&name),
                    question_count,
                    history: &self.session.transcript,
                    question: text,
                });
                self.session.question_count = question_count;
                self.session.transcript.push(Message::user(text));
                info!(
                    session_id = %self.session.id,
                    question_count,
                    "question submitted"
                );
                TurnKind::Question(GenerationRequest::text(prompt))
            }
        };

        self.session.in_flight = true;
        Some(PendingTurn {
            epoch: self.session.epoch,
            kind,
        })
    }

    /// Append the reply of a resolved turn and re-enable input.
    ///
    /// Returns the appended message, or `None` when the turn belongs to a
    /// session that has since been reset.
    pub fn complete(&mut self, turn: CompletedTurn) -> Option<&Message> {
        if turn.epoch != self.session.epoch {
            debug!(
                turn_epoch = turn.epoch,
                session_epoch = self.session.epoch,
                "discarding reply for a reset session"
            );
            return None;
        }
        self.session.in_flight = false;
        self.session.transcript.push(Message::assistant(turn.reply));
        self.session.transcript.last()
    }

    /// Run a full submission. Never fails; ignored input yields `None`.
    pub async fn submit(&mut self, text: &str) -> Option<&Message> {
        let turn = self.begin_submit(text)?;
        let generator = Arc::clone(&self.generator);
        let done = turn.run(generator.as_ref(), self.thinking_delay).await;
        self.complete(done)
    }
}
