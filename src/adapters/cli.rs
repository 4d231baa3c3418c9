//! Terminal adapter — stdin/stdout chat loop and plain-text rendering.
//!
//! Input is read one line at a time and the next line is only read after the
//! current turn completes, so at most one generation request is ever in
//! flight for the session.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::chat::prompt::ASSISTANT_NAME;
use crate::chat::render::{Segment, BOOKING_LABEL};
use crate::chat::{ChatController, Message, Sender};
use crate::scenario::ImpactScenario;

/// Closes the widget and ends the loop.
pub const EXIT_COMMAND: &str = "/salir";

/// Discards the session and starts over.
pub const RESET_COMMAND: &str = "/reiniciar";

/// Label used for the visitor's own lines.
const USER_LABEL: &str = "Tú";

/// Render a single segment list. Text is written as received except for the
/// spacing that touches a call-to-action, which becomes a bracketed label
/// followed by the scheduling URL on its own line.
pub fn render_segments(segments: &[Segment], booking_url: &str) -> String {
    let mut out = String::new();
    let mut after_action = false;
    let mut iter = segments.iter().peekable();
    while let Some(segment) = iter.next() {
        match segment {
            Segment::Text(text) => {
                let mut text = text.as_str();
                if after_action {
                    text = text.trim_start();
                    if !text.is_empty() {
                        out.push('\n');
                    }
                }
                if matches!(iter.peek(), Some(Segment::BookingAction)) {
                    text = text.trim_end();
                }
                out.push_str(text);
                after_action = false;
            }
            Segment::BookingAction => {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!("  [{BOOKING_LABEL}] {booking_url}"));
                after_action = true;
            }
        }
    }
    out
}

/// Render one transcript message with its speaker label.
pub fn render_message(message: &Message, booking_url: &str) -> String {
    let speaker = match message.sender {
        Sender::User => USER_LABEL,
        Sender::Assistant => ASSISTANT_NAME,
    };
    format!(
        "{speaker}: {}",
        render_segments(&message.segments(), booking_url)
    )
}

/// Render the three impact cards.
pub fn render_scenario(scenario: &ImpactScenario) -> String {
    scenario
        .cards()
        .iter()
        .map(|(kind, card)| {
            format!(
                "[{kind} · {}] {}\n  {}\n  {}",
                card.severity, card.title, card.metric, card.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn input_hint(controller: &ChatController) -> &'static str {
    if controller.session().collected_name().is_some() {
        "Haz una pregunta..."
    } else {
        "Escribe tu nombre..."
    }
}

/// Drive one chat session until EOF or [`EXIT_COMMAND`].
///
/// # Errors
///
/// Returns an error only on I/O failure of the terminal streams; generation
/// failures are rendered as the fallback reply.
pub async fn run_chat<R, W>(
    controller: &mut ChatController,
    booking_url: &str,
    mut input: R,
    output: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(greeting) = controller.open() {
        let line = render_message(greeting, booking_url);
        write_line(output, &line).await?;
    }

    let mut line = String::new();
    loop {
        write_prompt(output, input_hint(controller)).await?;
        line.clear();
        let read = input
            .read_line(&mut line)
            .await
            .context("failed to read chat input")?;
        if read == 0 {
            debug!("chat input closed");
            controller.close();
            break;
        }

        match line.trim() {
            EXIT_COMMAND => {
                controller.close();
                break;
            }
            RESET_COMMAND => {
                controller.reset();
                if let Some(greeting) = controller.open() {
                    let rendered = render_message(greeting, booking_url);
                    write_line(output, &rendered).await?;
                }
            }
            text => {
                if let Some(reply) = controller.submit(text).await {
                    let rendered = render_message(reply, booking_url);
                    write_line(output, &rendered).await?;
                }
            }
        }
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output
        .write_all(format!("{text}\n\n").as_bytes())
        .await
        .context("failed to write chat output")?;
    output.flush().await.context("failed to flush chat output")
}

async fn write_prompt<W: AsyncWrite + Unpin>(output: &mut W, hint: &str) -> Result<()> {
    output
        .write_all(format!("({hint}) > ").as_bytes())
        .await
        .context("failed to write chat prompt")?;
    output.flush().await.context("failed to flush chat prompt")
}
