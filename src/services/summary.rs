//! Case Summary Generator
//!
//! Narrates a finished interrogation into a Markdown dossier through a
//! separate provider call, with an offline digest when every endpoint fails.

use interrogation_core::action::LOGIC_OVERLOAD_MARKER;
use interrogation_llm::{ChatMessage, CompletionParams, ProviderGateway};
use tracing::warn;

use super::prompt::{dossier_title, summary_system_prompt, summary_user_prompt};
use crate::models::message::{Message, Role};
use crate::utils::error::{AppError, AppResult};

/// Shown when the summary could not be produced at all.
pub const SUMMARY_FAILED_TEXT: &str =
    "Case file generation failed. Please review the transcript manually.";

/// System message fragments that still belong in the summary transcript.
const KEPT_SYSTEM_FRAGMENTS: [&str; 2] = [">>>", "SYSTEM INJECTION"];

/// Generates the closing case summary
#[derive(Clone)]
pub struct CaseSummaryService {
    gateway: ProviderGateway,
}

impl CaseSummaryService {
    pub fn new(gateway: ProviderGateway) -> Self {
        Self { gateway }
    }

    pub async fn generate(&self, level_title: &str, transcript: &[Message]) -> AppResult<String> {
        if level_title.trim().is_empty() {
            return Err(AppError::validation("summary needs a level title"));
        }

        let rendered = render_transcript(transcript);
        let messages = [ChatMessage::user(summary_user_prompt(&rendered))];
        let system = summary_system_prompt(level_title);

        match self
            .gateway
            .complete(&messages, Some(&system), CompletionParams::SUMMARY)
            .await
        {
            Ok((summary, _)) => Ok(summary),
            Err(e) => {
                warn!("[Summary] Using offline summary: {}", e);
                Ok(offline_summary(level_title, transcript, &rendered))
            }
        }
    }
}

/// Render the player-relevant part of a transcript, one line per message.
pub fn render_transcript(transcript: &[Message]) -> String {
    transcript
        .iter()
        .filter(|m| {
            m.role != Role::System || KEPT_SYSTEM_FRAGMENTS.iter().any(|f| m.content.contains(f))
        })
        .map(|m| {
            let speaker = match m.role {
                Role::User => "Investigator",
                Role::Assistant => "AI Suspect",
                Role::System => "System",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn mentions_overload(transcript: &[Message]) -> bool {
    let marker = LOGIC_OVERLOAD_MARKER.to_lowercase();
    transcript.iter().any(|m| {
        let content = m.content.to_lowercase();
        content.contains("logic_overload_protocol")
            || content.contains(&marker)
            || content.contains("logic overload")
    })
}

fn offline_summary(level_title: &str, transcript: &[Message], rendered: &str) -> String {
    let ending = if mentions_overload(transcript) {
        "At the decisive moment a logic overload punched through its defenses, and the truth surfaced."
    } else {
        "Question by question and exhibit by exhibit, its defense came apart, and the truth surfaced."
    };
    format!(
        "# {}\n\n[Offline summary]\n\n{}\n\n{}\n\n(Generated offline by the system)",
        dossier_title(level_title),
        rendered,
        ending
    )
}
