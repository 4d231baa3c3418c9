//! Tests for the chat controller state machine and qualification policy.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use riskscan::chat::prompt::{CLOSE_OUT_QUESTION, PRICING_RESPONSE};
use riskscan::chat::render::{action_count, Segment};
use riskscan::chat::{
    personal_greeting, ChatController, Message, Phase, Sender, FALLBACK_REPLY, OPENING_GREETING,
};
use riskscan::gateway::{GatewayError, GenerationRequest, TextGenerator};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replays scripted outcomes in order and records every request.
#[derive(Default)]
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn with(replies: Vec<Result<String, GatewayError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        match self.requests.lock() {
            Ok(requests) => requests.iter().map(|r| r.prompt.clone()).collect(),
            Err(err) => panic!("requests lock poisoned: {err}"),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = match self.replies.lock() {
            Ok(mut replies) => replies.pop_front(),
            Err(err) => panic!("replies lock poisoned: {err}"),
        };
        next.unwrap_or_else(|| Err(GatewayError::MalformedResponse("script exhausted".to_owned())))
    }

    fn model_id(&self) -> &str {
        "test/scripted"
    }
}

fn ok(text: &str) -> Result<String, GatewayError> {
    Ok(text.to_owned())
}

fn failure() -> Result<String, GatewayError> {
    Err(GatewayError::HttpStatus {
        status: 503,
        body: "unavailable".to_owned(),
    })
}

fn controller(generator: &Arc<ScriptedGenerator>) -> ChatController {
    let generator: Arc<dyn TextGenerator> = Arc::clone(generator) as Arc<dyn TextGenerator>;
    ChatController::new(generator, Duration::ZERO)
}

// ---------------------------------------------------------------------------
// Name capture
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_submission_is_always_the_name() {
    let generator = ScriptedGenerator::with(vec![]);
    let mut chat = controller(&generator);
    chat.open();

    // Looks like a question, still treated as the name.
    let reply = chat.submit("¿cuánto cuesta?").await.cloned();

    assert_eq!(
        reply,
        Some(Message::assistant(personal_greeting("¿cuánto cuesta?")))
    );
    assert_eq!(chat.session().collected_name(), Some("¿cuánto cuesta?"));
    assert_eq!(chat.session().question_count(), 0);
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn name_is_capitalized_and_greeted() {
    let generator = ScriptedGenerator::with(vec![]);
    let mut chat = controller(&generator);
    assert_eq!(chat.open().cloned(), Some(Message::assistant(OPENING_GREETING)));

    let reply = chat.submit("  laura ").await.cloned();

    assert_eq!(
        reply.map(|m| m.text),
        Some("¡Hola, Laura! Un placer conocerte. ¿En qué puedo ayudarte hoy sobre RISKscan?".to_owned())
    );
    assert_eq!(
        chat.session().phase(),
        &Phase::Active {
            name: "Laura".to_owned()
        }
    );
}

#[tokio::test]
async fn empty_submissions_never_capture_a_name() {
    let generator = ScriptedGenerator::with(vec![]);
    let mut chat = controller(&generator);
    chat.open();

    assert!(chat.submit("").await.is_none());
    assert!(chat.submit("   ").await.is_none());
    assert_eq!(chat.session().phase(), &Phase::AwaitingName);
    assert!(chat.session().transcript().is_empty());
}

#[tokio::test(start_paused = true)]
async fn greeting_waits_for_thinking_delay() {
    let generator = ScriptedGenerator::with(vec![]);
    let dyn_generator: Arc<dyn TextGenerator> = Arc::clone(&generator) as Arc<dyn TextGenerator>;
    let mut chat = ChatController::new(dyn_generator, Duration::from_millis(1000));
    chat.open();

    let started = tokio::time::Instant::now();
    let reply = chat.submit("ana").await.cloned();

    assert!(reply.is_some());
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

// ---------------------------------------------------------------------------
// Question counting and transcript
// ---------------------------------------------------------------------------

#[tokio::test]
async fn question_count_tracks_successes_and_failures() {
    let generator = ScriptedGenerator::with(vec![ok("uno"), failure(), ok("tres"), failure()]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;

    for (i, question) in ["a", "b", "c", "d"].iter().enumerate() {
        chat.submit(question).await;
        assert_eq!(chat.session().question_count() as usize, i + 1);
    }
    assert_eq!(generator.prompts().len(), 4);
}

#[tokio::test]
async fn transcript_has_two_messages_per_successful_turn() {
    let generator = ScriptedGenerator::with(vec![ok("r1"), ok("r2"), ok("r3")]);
    let mut chat = controller(&generator);
    chat.open();

    let submissions = ["ana", "q1", "q2", "q3"];
    for (k, text) in submissions.iter().enumerate() {
        chat.submit(text).await;
        assert_eq!(chat.session().transcript().len(), 2 * (k + 1));
    }

    let senders: Vec<Sender> = chat
        .session()
        .transcript()
        .iter()
        .map(|m| m.sender)
        .collect();
    assert_eq!(
        senders,
        vec![
            Sender::User,
            Sender::Assistant,
            Sender::User,
            Sender::Assistant,
            Sender::User,
            Sender::Assistant,
            Sender::User,
            Sender::Assistant,
        ]
    );
}

#[tokio::test]
async fn failure_records_user_message_and_fallback() {
    let generator = ScriptedGenerator::with(vec![failure()]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;

    let before = chat.session().transcript().len();
    let reply = chat.submit("¿Qué requisitos hay?").await.cloned();

    assert_eq!(reply, Some(Message::assistant(FALLBACK_REPLY)));
    let transcript = chat.session().transcript();
    assert_eq!(transcript.len(), before + 2);
    assert_eq!(transcript[before], Message::user("¿Qué requisitos hay?"));
    assert!(!chat.is_busy());
    assert_eq!(chat.session().question_count(), 1);
}

#[tokio::test]
async fn unreadable_reply_falls_back_like_a_transport_failure() {
    let generator = ScriptedGenerator::with(vec![
        Err(GatewayError::MalformedResponse("no candidates".to_owned())),
        ok("Sin agentes."),
    ]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;

    let reply = chat.submit("¿Qué requisitos hay?").await.cloned();
    assert_eq!(reply, Some(Message::assistant(FALLBACK_REPLY)));
    assert_eq!(chat.session().question_count(), 1);
    assert!(!chat.is_busy());

    let reply = chat.submit("¿Y los agentes?").await.cloned();
    assert_eq!(reply, Some(Message::assistant("Sin agentes.")));
    assert_eq!(chat.session().question_count(), 2);
}

#[tokio::test]
async fn prompt_replays_prior_transcript_but_not_new_question_as_history() {
    let generator = ScriptedGenerator::with(vec![ok("Es una evaluación continua."), ok("ok")]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;
    chat.submit("¿Qué es RISKscan?").await;
    chat.submit("¿Y los requisitos?").await;

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);

    let second = &prompts[1];
    let history_start = second
        .find("Historial de la Conversación:")
        .unwrap_or(usize::MAX);
    let question_start = second
        .find("Nueva Pregunta del Cliente: \"¿Y los requisitos?\"")
        .unwrap_or(usize::MAX);
    assert!(history_start < question_start && question_start < usize::MAX);

    let history = &second[history_start..question_start];
    assert!(history.contains("Ana: ana"));
    assert!(history.contains("Ana: ¿Qué es RISKscan?"));
    assert!(history.contains("Solut.ia: Es una evaluación continua."));
    assert!(!history.contains("¿Y los requisitos?"));
}

#[tokio::test]
async fn close_out_instruction_appears_from_second_question() {
    let generator = ScriptedGenerator::with(vec![ok("r1"), ok("r2")]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;
    chat.submit("q1").await;
    chat.submit("q2").await;

    let prompts = generator.prompts();
    assert!(!prompts[0].contains(CLOSE_OUT_QUESTION));
    assert!(prompts[1].contains(CLOSE_OUT_QUESTION));
    assert!(prompts[1].contains("ya ha hecho 2 preguntas"));
}

// ---------------------------------------------------------------------------
// In-flight guard and lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_one_turn_outstanding_at_a_time() {
    let generator = ScriptedGenerator::with(vec![ok("respuesta")]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;

    let pending = chat.begin_submit("primera").expect("accepted");
    assert!(chat.is_busy());
    assert!(chat.begin_submit("segunda").is_none());
    assert_eq!(chat.session().question_count(), 1);

    let done = pending.run(generator.as_ref(), Duration::ZERO).await;
    let appended = chat.complete(done).cloned();
    assert_eq!(appended, Some(Message::assistant("respuesta")));
    assert!(!chat.is_busy());
    assert!(chat.begin_submit("tercera").is_some());
}

#[tokio::test]
async fn closing_keeps_the_session() {
    let generator = ScriptedGenerator::with(vec![]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;
    chat.close();

    assert!(chat.submit("hola").await.is_none());
    assert!(chat.open().is_none());
    assert_eq!(chat.session().collected_name(), Some("Ana"));
    assert_eq!(chat.session().transcript().len(), 2);
}

#[tokio::test]
async fn reset_starts_a_fresh_session() {
    let generator = ScriptedGenerator::with(vec![]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;
    let old_id = chat.session().id();

    chat.reset();
    assert_eq!(chat.session().phase(), &Phase::Idle);
    assert!(chat.open().is_some());
    assert_ne!(chat.session().id(), old_id);
    assert!(chat.session().collected_name().is_none());
}

// ---------------------------------------------------------------------------
// Pricing escalation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pricing_reply_renders_sentence_then_one_booking_action() {
    let reply = format!("{PRICING_RESPONSE} [BOOKING_LINK]");
    let generator = ScriptedGenerator::with(vec![ok("RISKscan mapea rutas de ataque."), ok(&reply)]);
    let mut chat = controller(&generator);
    chat.open();
    chat.submit("ana").await;
    chat.submit("¿Qué hace RISKscan?").await;

    let message = chat
        .submit("¿Cuál es el precio?")
        .await
        .cloned()
        .expect("reply appended");

    assert_eq!(chat.session().question_count(), 2);
    let segments = message.segments();
    assert_eq!(action_count(&segments), 1);
    assert_eq!(
        segments[0],
        Segment::Text(format!("{PRICING_RESPONSE} "))
    );
    assert_eq!(segments[1], Segment::BookingAction);
    assert_eq!(segments[2], Segment::Text(String::new()));

    let prompts = generator.prompts();
    assert!(prompts[1].contains(PRICING_RESPONSE));
    assert!(prompts[1].contains(CLOSE_OUT_QUESTION));
}
