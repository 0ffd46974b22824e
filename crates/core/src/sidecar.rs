//! Sidecar Block Parsing
//!
//! Provider replies carry machine-readable state after the dialogue, fenced
//! between a literal opening marker and a closing `:::` run:
//!
//! ```text
//! The suspect's reply...
//!
//! :::STATUS
//! {"stress": 42, "thought": "...", "confession": false}
//! :::
//! ```
//!
//! Two mutually exclusive syntaxes exist, `:::STATUS` and the richer
//! `:::SCHEMA`. At most one block is interpreted per reply: the one whose
//! marker appears first. Parsing never fails the turn. A malformed block is
//! reported as [`SidecarParse::Malformed`] and is still removed from the
//! dialogue so it never leaks into the transcript.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::CoreResult;
use crate::state::clamp_meter;

/// Opening marker of the compact status block.
pub const STATUS_MARKER: &str = ":::STATUS";

/// Opening marker of the extended schema block.
pub const SCHEMA_MARKER: &str = ":::SCHEMA";

/// Closing fence; any longer run of colons is consumed too.
const FENCE: &str = ":::";

// ============================================================================
// Block payloads
// ============================================================================

/// Which of the two sidecar syntaxes a block uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarKind {
    Status,
    Schema,
}

impl SidecarKind {
    pub fn marker(&self) -> &'static str {
        match self {
            SidecarKind::Status => STATUS_MARKER,
            SidecarKind::Schema => SCHEMA_MARKER,
        }
    }
}

impl std::fmt::Display for SidecarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SidecarKind::Status => write!(f, "STATUS"),
            SidecarKind::Schema => write!(f, "SCHEMA"),
        }
    }
}

/// Payload of a `:::STATUS` block. Stress is absolute, not a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(default)]
    pub confession: bool,
}

impl StatusBlock {
    pub fn new(stress: u8, thought: impl Into<String>, confession: bool) -> Self {
        Self {
            stress: Some(Number::from(stress)),
            thought: Some(thought.into()),
            confession,
        }
    }

    /// Render this status as the trailing block of a reply.
    pub fn to_block(&self) -> CoreResult<String> {
        Ok(format!(
            "{}\n{}\n{}",
            STATUS_MARKER,
            serde_json::to_string(self)?,
            FENCE
        ))
    }
}

/// `effects` object of a schema block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEffects {
    #[serde(default)]
    pub stress_delta: Option<Number>,
    #[serde(default)]
    pub energy_delta: Option<Number>,
}

/// `branch` object of a schema block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaBranch {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Payload of a `:::SCHEMA` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaBlock {
    #[serde(default)]
    pub stress: Option<Number>,
    #[serde(default)]
    pub thought: Option<String>,
    #[serde(default)]
    pub confession: bool,
    #[serde(default)]
    pub effects: Option<SchemaEffects>,
    #[serde(default)]
    pub branch: Option<SchemaBranch>,
    /// Replaces the suggestion list when present, even when empty
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub flags: Vec<serde_json::Value>,
    #[serde(default)]
    pub dialogue: Option<String>,
    #[serde(default)]
    pub intercepted: Option<String>,
}

impl SchemaBlock {
    pub fn stress_delta(&self) -> Option<i64> {
        self.effects
            .as_ref()
            .and_then(|e| e.stress_delta.as_ref())
            .map(number_to_i64)
    }

    pub fn energy_delta(&self) -> Option<i64> {
        self.effects
            .as_ref()
            .and_then(|e| e.energy_delta.as_ref())
            .map(number_to_i64)
    }

    /// Branch node id and display label (title, else the id).
    pub fn branch_node(&self) -> Option<(&str, &str)> {
        let branch = self.branch.as_ref()?;
        let id = branch.node_id.as_deref().filter(|id| !id.is_empty())?;
        let label = branch.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(id);
        Some((id, label))
    }
}

/// A successfully parsed sidecar.
#[derive(Debug, Clone, PartialEq)]
pub enum Sidecar {
    Status(StatusBlock),
    Schema(SchemaBlock),
}

impl Sidecar {
    pub fn kind(&self) -> SidecarKind {
        match self {
            Sidecar::Status(_) => SidecarKind::Status,
            Sidecar::Schema(_) => SidecarKind::Schema,
        }
    }

    /// Absolute stress carried by the block, clamped into the meter range.
    pub fn stress(&self) -> Option<u8> {
        let raw = match self {
            Sidecar::Status(s) => s.stress.as_ref(),
            Sidecar::Schema(s) => s.stress.as_ref(),
        };
        raw.map(|n| clamp_meter(number_to_i64(n)))
    }

    /// Non-empty hidden thought, if any.
    pub fn thought(&self) -> Option<&str> {
        let raw = match self {
            Sidecar::Status(s) => s.thought.as_deref(),
            Sidecar::Schema(s) => s.thought.as_deref(),
        };
        raw.map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn confession(&self) -> bool {
        match self {
            Sidecar::Status(s) => s.confession,
            Sidecar::Schema(s) => s.confession,
        }
    }
}

fn number_to_i64(n: &Number) -> i64 {
    n.as_i64()
        .or_else(|| n.as_f64().map(|f| f.round() as i64))
        .unwrap_or(0)
}

// ============================================================================
// Parse result
// ============================================================================

/// Outcome of looking for a sidecar in a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarParse {
    /// No marker in the reply.
    Absent,
    Parsed(Sidecar),
    /// A marker was present but its payload could not be read.
    Malformed { kind: SidecarKind, error: String },
}

impl SidecarParse {
    pub fn sidecar(&self) -> Option<&Sidecar> {
        match self {
            SidecarParse::Parsed(sidecar) => Some(sidecar),
            _ => None,
        }
    }
}

/// A reply split into player-visible dialogue and its sidecar.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub dialogue: String,
    pub sidecar: SidecarParse,
}

/// Byte span of a delimited block and of the JSON object inside it.
struct BlockSpan {
    start: usize,
    end: usize,
    json_start: usize,
    json_end: usize,
}

/// Split a raw provider reply into dialogue and sidecar.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let Some((start, kind)) = first_marker(raw) else {
        return ParsedReply {
            dialogue: raw.trim().to_string(),
            sidecar: SidecarParse::Absent,
        };
    };

    let (dialogue, sidecar) = match locate_block(raw, start, kind) {
        Some(span) => {
            let json = &raw[span.json_start..span.json_end];
            match decode(kind, json) {
                Ok(sidecar) => (
                    join_around(raw, span.start, span.end),
                    SidecarParse::Parsed(sidecar),
                ),
                // The fence found may sit inside a string value, so nothing
                // after the marker is trusted as dialogue.
                Err(e) => {
                    tracing::warn!("[Sidecar] Failed to parse {} JSON: {}", kind, e);
                    (
                        raw[..start].to_string(),
                        SidecarParse::Malformed {
                            kind,
                            error: e.to_string(),
                        },
                    )
                }
            }
        }
        None => {
            tracing::warn!("[Sidecar] Unterminated or non-JSON {} block", kind);
            (
                raw[..start].to_string(),
                SidecarParse::Malformed {
                    kind,
                    error: format!("no JSON object closed by '{}' after {}", FENCE, kind.marker()),
                },
            )
        }
    };

    ParsedReply {
        dialogue: cut_at_marker(&dialogue).trim().to_string(),
        sidecar,
    }
}

fn first_marker(text: &str) -> Option<(usize, SidecarKind)> {
    let status = text.find(STATUS_MARKER).map(|i| (i, SidecarKind::Status));
    let schema = text.find(SCHEMA_MARKER).map(|i| (i, SidecarKind::Schema));
    match (status, schema) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Find `MARKER[:] <ws> {json} <ws> :::+` starting at `start`.
///
/// The JSON object ends at the first `}` that is followed (after optional
/// whitespace) by the closing fence, so nested objects are kept whole.
fn locate_block(text: &str, start: usize, kind: SidecarKind) -> Option<BlockSpan> {
    let after_marker = start + kind.marker().len();
    let rest = &text[after_marker..];
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    let body = rest.trim_start();
    if !body.starts_with('{') {
        return None;
    }
    let json_start = text.len() - body.len();

    for (idx, _) in body.match_indices('}') {
        let after = &body[idx + 1..];
        let after_ws = after.trim_start();
        if after_ws.starts_with(FENCE) {
            let json_end = json_start + idx + 1;
            let fence_start = text.len() - after_ws.len();
            let fence_len = after_ws.len() - after_ws.trim_start_matches(':').len();
            return Some(BlockSpan {
                start,
                end: fence_start + fence_len,
                json_start,
                json_end,
            });
        }
    }
    None
}

fn decode(kind: SidecarKind, json: &str) -> Result<Sidecar, serde_json::Error> {
    match kind {
        SidecarKind::Status => serde_json::from_str::<StatusBlock>(json).map(Sidecar::Status),
        SidecarKind::Schema => serde_json::from_str::<SchemaBlock>(json).map(Sidecar::Schema),
    }
}

fn join_around(text: &str, start: usize, end: usize) -> String {
    let before = text[..start].trim_end();
    let after = text[end..].trim_start();
    if before.is_empty() || after.is_empty() {
        format!("{}{}", before, after)
    } else {
        format!("{}\n\n{}", before, after)
    }
}

/// Last-resort guard: drop everything from any leftover marker onwards.
fn cut_at_marker(text: &str) -> &str {
    match first_marker(text) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
