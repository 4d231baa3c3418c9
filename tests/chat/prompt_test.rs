//! Prompt assembly tests.

use riskscan::chat::prompt::{
    build_chat_prompt, format_history, PromptContext, ANONYMOUS_SPEAKER, KNOWLEDGE_BASE,
    MEETING_OFFER, PRICING_RESPONSE,
};
use riskscan::chat::render::BOOKING_MARKER;
use riskscan::chat::Message;

#[test]
fn prompt_embeds_knowledge_base_and_verbatim_pricing_rule() {
    let prompt = build_chat_prompt(&PromptContext {
        user_name: Some("Ana"),
        question_count: 1,
        history: &[],
        question: "¿Qué es?",
    });
    assert!(prompt.contains(KNOWLEDGE_BASE));
    assert!(prompt.contains(&format!(
        "responde EXACTAMENTE: \"{PRICING_RESPONSE}\" y LUEGO inserta el placeholder {BOOKING_MARKER}"
    )));
    assert!(prompt.contains(MEETING_OFFER));
    assert!(prompt.contains("usa el nombre del cliente (Ana)"));
    assert!(prompt.trim_end().ends_with("Tu respuesta:"));
}

#[test]
fn empty_history_leaves_section_blank() {
    let prompt = build_chat_prompt(&PromptContext {
        user_name: Some("Ana"),
        question_count: 1,
        history: &[],
        question: "hola",
    });
    assert!(prompt.contains("Historial de la Conversación:\n\n\nNueva Pregunta"));
}

#[test]
fn history_lines_keep_chronological_order() {
    let history = vec![
        Message::user("uno"),
        Message::assistant("dos"),
        Message::user("tres"),
    ];
    let lines: Vec<String> = format_history(&history, None)
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(
        lines,
        vec![
            format!("{ANONYMOUS_SPEAKER}: uno"),
            "Solut.ia: dos".to_owned(),
            format!("{ANONYMOUS_SPEAKER}: tres"),
        ]
    );
}
