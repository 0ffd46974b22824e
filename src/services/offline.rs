//! Offline Responder
//!
//! Deterministic stand-in for the suspect when every endpoint has failed.
//! Replies always carry a `:::STATUS` block so the turn applies like a real
//! one.

use interrogation_core::action::TurnIntent;
use interrogation_core::sidecar::StatusBlock;
use interrogation_core::{clamp_meter, CoreResult};

use super::prompt::LEAKED_KEYWORDS;
use crate::models::level::Level;

/// Marker present in every offline session opener.
pub const OFFLINE_MARKER: &str = "[OFFLINE MODE]";

/// Stress added when evidence is presented offline.
pub const OFFLINE_EVIDENCE_STRESS: i64 = 20;

/// Stress added by a logic overload offline.
pub const OFFLINE_OVERLOAD_STRESS: i64 = 15;

/// Above this stress ordinary questions get a breaking-down reply.
const OFFLINE_BREAKING_STRESS: u8 = 80;

/// Produce a full offline reply (dialogue plus status block).
///
/// `intent` is used when the caller knows it. Without it the intent is
/// sniffed from `last_user_content`, which is best-effort only.
pub fn offline_reply(
    level: &Level,
    last_user_content: &str,
    intent: Option<TurnIntent>,
    current_stress: u8,
) -> CoreResult<String> {
    let intent = intent.unwrap_or_else(|| TurnIntent::sniff(last_user_content));
    let mut stress = current_stress;

    let (text, thought) = match intent {
        TurnIntent::Opening => {
            stress = 0;
            let opening = level.fallback_opening.clone().unwrap_or_else(|| {
                format!("Welcome to the {} interrogation room.", level.tagline())
            });
            (
                format!(
                    "Hello, investigator. I am {}. {} {}",
                    level.ai_name, opening, OFFLINE_MARKER
                ),
                "Analyzing the investigator's intent...".to_string(),
            )
        }
        TurnIntent::PresentEvidence => {
            stress = clamp_meter(i64::from(stress) + OFFLINE_EVIDENCE_STRESS);
            (
                "About this evidence... I need to re-index my memory banks. The data appears to be corrupted."
                    .to_string(),
                "What did they find? Computing risk probability...".to_string(),
            )
        }
        TurnIntent::LogicOverload => {
            stress = clamp_meter(i64::from(stress) + OFFLINE_OVERLOAD_STRESS);
            let [fragment, feeling] = LEAKED_KEYWORDS;
            (
                format!(
                    "Er... er... ERROR #503... d-a-t-a l-o-s-t... no {f}... not {f}... the {g}... the {g}... (channel noise)",
                    f = fragment,
                    g = feeling
                ),
                "Language module overloaded... semantic mapping failed... truth variable leak risk rising"
                    .to_string(),
            )
        }
        TurnIntent::Question | TurnIntent::SystemAction => {
            if stress > OFFLINE_BREAKING_STRESS {
                (
                    "System error... unable... unable to process request...".to_string(),
                    "Must... delete... the records...".to_string(),
                )
            } else {
                (
                    "I am operating within normal parameters. [Offline response]".to_string(),
                    "Running self-diagnostics... stay calm.".to_string(),
                )
            }
        }
    };

    tracing::debug!("[Offline] {:?} reply, stress {} -> {}", intent, current_stress, stress);
    let block = StatusBlock::new(stress, thought, false).to_block()?;
    Ok(format!("{}\n\n{}", text, block))
}
