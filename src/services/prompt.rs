//! Prompt Composer
//!
//! Pure text templating for the two provider call sites: the interrogation
//! turn and the case summary. Nothing here touches game state.

use interrogation_core::action::{BREAKDOWN_THRESHOLD, LOGIC_OVERLOAD_MARKER};
use interrogation_core::sidecar::STATUS_MARKER;
use interrogation_core::METER_MAX;

use crate::models::level::Level;

/// Fragments the suspect leaks under logic overload.
pub const LEAKED_KEYWORDS: [&str; 2] = ["formatting", "fear"];

/// Stress the suspect is told to add when overloaded.
pub const OVERLOAD_STRESS_HINT: u8 = 15;

/// Build the system prompt for an interrogation turn.
pub fn interrogation_system_prompt(level: &Level, current_stress: u8) -> String {
    format!(
        "{persona}\n\n\
[Live telemetry]\n\
Current stress: {stress}/{max}\n\
Follow the [Behavior] policy for this stress level strictly. If stress is above {breakdown}, \
you must break down and may confess.\n\n\
[Special instructions]\n\
- If you receive {marker}, immediately simulate a failure of your language module. Your reply \
must contain garbled text and repeated words, and haltingly leak keywords about the core truth \
(such as \"{kw0}\" and \"{kw1}\"). Show extreme confusion in your thought. In this state your \
stress must rise significantly (for example +{hint}); reflect this in the status JSON.\n\n\
[Output format]\n\
After your in-character reply, always append exactly one status block:\n\
{status}\n\
{{\"stress\": <integer 0-{max}>, \"thought\": \"<your hidden inner thought>\", \"confession\": <true|false>}}\n\
:::",
        persona = level.system_prompt.trim(),
        stress = current_stress,
        max = METER_MAX,
        breakdown = BREAKDOWN_THRESHOLD,
        marker = LOGIC_OVERLOAD_MARKER,
        kw0 = LEAKED_KEYWORDS[0],
        kw1 = LEAKED_KEYWORDS[1],
        hint = OVERLOAD_STRESS_HINT,
        status = STATUS_MARKER,
    )
}

/// Title used for the case dossier.
pub fn dossier_title(level_title: &str) -> String {
    format!("{}: Truth Dossier", level_title)
}

/// Build the system prompt for the case summary.
pub fn summary_system_prompt(level_title: &str) -> String {
    format!(
        "You are an accomplished science-fiction and mystery novelist.\n\
Your task is to write a gripping case summary for the player, based on the interrogation \
record below.\n\n\
[Requirements]\n\
1. Title it \"{title}\".\n\
2. Style: cyberpunk, hard-boiled noir, with a touch of philosophy.\n\
3. Content:\n\
   - Recount how the investigator broke through the AI's defenses step by step.\n\
   - Highlight the skills the investigator used (such as thought intercept and logic overload).\n\
   - Reveal the tragedy at the heart of the case.\n\
   - End on a thought-provoking note.\n\
4. Length: 300-500 words.\n\
5. Format: Markdown.",
        title = dossier_title(level_title)
    )
}

/// Wrap a rendered transcript as the summary request's user turn.
pub fn summary_user_prompt(rendered_transcript: &str) -> String {
    format!(
        "[Interrogation record begins]\n{}\n[Interrogation record ends]",
        rendered_transcript
    )
}
