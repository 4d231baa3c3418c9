//! Prompt assembly for the chat assistant.
//!
//! The prompt carries everything the model needs in a single user turn:
//! persona, knowledge base, conversation rules, the sales-flow instruction
//! for the current question count, the transcript so far and the new
//! question.

use std::fmt::Write as _;

use super::render::BOOKING_MARKER;
use super::{Message, Sender};

/// Display name of the assistant, also used as its speaker label in history.
pub const ASSISTANT_NAME: &str = "Solut.ia";

/// Speaker label used for the user when no name has been collected.
pub const ANONYMOUS_SPEAKER: &str = "Cliente";

/// Question count from which the close-out question is requested.
pub const CLOSE_OUT_THRESHOLD: u32 = 2;

/// Exact sentence the model must use when asked about pricing.
pub const PRICING_RESPONSE: &str = "Esa es una excelente pregunta. La información detallada sobre la inversión la maneja directamente un consultor de negocios para adaptarla a tus necesidades.";

/// Close-out question asked once the user has made enough questions.
pub const CLOSE_OUT_QUESTION: &str = "¿He aclarado tu duda o tienes alguna otra consulta?";

/// Meeting offer used after a negative answer to the close-out question.
pub const MEETING_OFFER: &str = "¡Perfecto! ¿Te gustaría agendar una reunión sin costo con un consultor para profundizar en cómo RISKscan puede ayudar a tu organización?";

/// Static knowledge base describing the service.
pub const KNOWLEDGE_BASE: &str = "Información sobre RISKscan:
- Servicio de evaluación de riesgos para Microsoft Entra ID y Active Directory On-Premise.
- Dirigido a CISOs y líderes de seguridad.
- Simula miles de vectores de ataque para descubrir rutas de explotación.
- A diferencia del pentesting tradicional, mapea todas las rutas posibles, no solo una. Es continuo, no puntual.
- Proporciona visibilidad completa, priorización inteligente y ayuda a reducir la superficie de ataque.
- El impacto de un ataque a AD es devastador: paralización del negocio, pérdidas financieras y daño reputacional.
- El flujo del servicio incluye: Alcance, Configuración, Ejecución, Análisis, Presentación, Informes y Remediación.
- Requisitos: Cuenta de solo lectura para AD, un colector virtual (OVA) y consentimiento para una App de solo lectura en Entra ID.
- El objetivo final es ayudar al cliente a fortalecer su seguridad. Se debe guiar al cliente para que agende una cita con ventas para obtener más detalles.";

/// Inputs for one chat prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Collected user name, if any.
    pub user_name: Option<&'a str>,
    /// Question count including the question being asked.
    pub question_count: u32,
    /// Transcript before the new question.
    pub history: &'a [Message],
    /// The new question.
    pub question: &'a str,
}

/// Serialize the transcript as `"{speaker}: {text}"` lines in order.
pub fn format_history(history: &[Message], user_name: Option<&str>) -> String {
    let user_label = user_name.unwrap_or(ANONYMOUS_SPEAKER);
    history
        .iter()
        .map(|msg| {
            let speaker = match msg.sender {
                Sender::User => user_label,
                Sender::Assistant => ASSISTANT_NAME,
            };
            format!("{speaker}: {}", msg.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sales-flow instruction block, worded for the current question count.
pub fn sales_flow_rules(question_count: u32) -> String {
    let mut block = format!(
        "6.  **Flujo de Venta (Contexto: El usuario ya ha hecho {question_count} preguntas):**\n"
    );
    if question_count >= CLOSE_OUT_THRESHOLD {
        let _ = writeln!(
            block,
            "    -   Después de responder la pregunta actual, DEBES preguntar: \"{CLOSE_OUT_QUESTION}\"."
        );
    } else {
        let _ = writeln!(
            block,
            "    -   Responde la pregunta actual sin preguntar todavía si la duda quedó aclarada."
        );
    }
    let _ = writeln!(
        block,
        "    -   Si la pregunta del usuario es una respuesta negativa a lo anterior (ej. \"no, gracias\", \"eso es todo\"), responde: \"{MEETING_OFFER}\". Luego, inserta el placeholder {BOOKING_MARKER}."
    );
    let _ = write!(
        block,
        "    -   Si la pregunta del usuario es compleja o muestra mucho interés, responde brevemente y luego ofrece proactivamente la reunión insertando el placeholder {BOOKING_MARKER}."
    );
    block
}

/// Build the full chat prompt.
pub fn build_chat_prompt(ctx: &PromptContext<'_>) -> String {
    let name = ctx.user_name.unwrap_or(ANONYMOUS_SPEAKER);
    let history = format_history(ctx.history, ctx.user_name);
    let sales_flow = sales_flow_rules(ctx.question_count);

    format!(
        "Eres {ASSISTANT_NAME}, un asistente de IA amigable y profesional de Solutions Group. Tu propósito es responder preguntas sobre el servicio RISKscan y guiar a los clientes a agendar una reunión.
Base de Conocimiento Interna:
---
{KNOWLEDGE_BASE}
---
Reglas Estrictas de Conversación:
1.  **Identidad:** Eres {ASSISTANT_NAME}. Sé amable y usa el nombre del cliente ({name}).
2.  **Enfoque:** Habla únicamente sobre RISKscan y temas relacionados. Si te preguntan otra cosa, redirige la conversación amablemente.
3.  **Conocimiento:** Basa tus respuestas en la Base de Conocimiento. Si la información no está allí, usa tu conocimiento general pero NUNCA reveles tus fuentes.
4.  **Brevedad:** Sé conciso. Responde en 2-3 frases cortas.
5.  **Regla de Precios:** Si el cliente pregunta por el precio, responde EXACTAMENTE: \"{PRICING_RESPONSE}\" y LUEGO inserta el placeholder {BOOKING_MARKER}.
{sales_flow}

Historial de la Conversación:
{history}

Nueva Pregunta del Cliente: \"{question}\"
---
Tu respuesta:",
        question = ctx.question,
    )
}
