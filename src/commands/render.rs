//! Terminal Rendering
//!
//! Plain-text views of outcomes, meters, the evidence board and the archive.

use interrogation_core::{ArchiveView, GameStatus, NodeEntry, NodeKind, Snapshot, METER_MAX};

use crate::models::message::{Message, Role};
use crate::models::response::ActionOutcome;
use crate::services::session::InterrogationSession;
use crate::state::LevelStatus;

const BAR_WIDTH: usize = 20;

fn meter(label: &str, value: u8) -> String {
    let filled = usize::from(value) * BAR_WIDTH / usize::from(METER_MAX);
    format!(
        "{:<7}[{}{}] {:>3}/{}",
        label,
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        value,
        METER_MAX
    )
}

fn status_label(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Playing => "in progress",
        GameStatus::Won => "CONFESSION OBTAINED",
        GameStatus::Lost => "COLD CASE",
    }
}

pub fn render_message(message: &Message, ai_name: &str) -> String {
    let mut out = match message.role {
        Role::User => format!("you> {}", message.content),
        Role::Assistant => format!("{}> {}", ai_name, message.content),
        Role::System => message.content.clone(),
    };
    if let Some(thought) = &message.thought {
        out.push_str(&format!("\n  [intercepted thought] {}", thought));
    }
    out
}

pub fn render_outcome(outcome: &ActionOutcome, ai_name: &str) -> String {
    match outcome {
        ActionOutcome::Applied(report) => {
            let mut lines: Vec<String> = report
                .messages
                .iter()
                .map(|m| render_message(m, ai_name))
                .collect();
            lines.push(format!(
                "-- stress {}/{} | energy {}/{} | {}",
                report.stress,
                METER_MAX,
                report.energy,
                METER_MAX,
                status_label(report.status)
            ));
            lines.join("\n")
        }
        ActionOutcome::Rejected {
            notice: Some(notice),
            ..
        } => render_message(notice, ai_name),
        ActionOutcome::Rejected { reason, .. } => format!("(!) {}", reason),
    }
}

pub fn render_status(session: &InterrogationSession) -> String {
    let state = session.state();
    let mut lines = vec![
        format!("{} [{}]", session.level().title, status_label(state.game_status())),
        meter("stress", state.stress()),
        meter("energy", state.energy()),
        format!("combo  x{}   turns {}", state.combo(), session.turn_count()),
    ];
    if let Some(objective) = state.objective() {
        lines.push(format!("objective: {}", objective));
    }
    if !session.suggestions().is_empty() {
        lines.push(format!("suggestions: {}", session.suggestions().join(" | ")));
    }
    if !state.achievements().is_empty() {
        lines.push(format!("achievements: {}", state.achievements().join(", ")));
    }
    let decisions = state.distinct_decisions();
    if !decisions.is_empty() {
        lines.push(format!("decisions: {}", decisions.join(" > ")));
    }
    let skills: Vec<&str> = state
        .nodes_of(Some(NodeKind::Skill))
        .into_iter()
        .map(|n| n.label.as_str())
        .collect();
    if !skills.is_empty() {
        lines.push(format!("skills used: {}", skills.join(", ")));
    }
    lines.join("\n")
}

pub fn render_evidence(session: &InterrogationSession) -> String {
    session
        .evidence_board()
        .into_iter()
        .map(|(item, found)| {
            if found {
                format!("[x] {:<12} {} - {}", item.id, item.name, item.desc)
            } else {
                format!("[ ] {:<12} (locked)", item.id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Node graph timeline, oldest first.
pub fn render_graph(nodes: &[&NodeEntry]) -> String {
    if nodes.is_empty() {
        return "Nothing recorded yet.".to_string();
    }
    nodes
        .iter()
        .map(|n| {
            format!(
                "{} {:<8} {}",
                n.timestamp.format("%H:%M:%S"),
                n.kind.to_string(),
                n.label
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_levels(levels: &[LevelStatus]) -> String {
    levels
        .iter()
        .map(|l| {
            let mark = match (l.completed, l.unlocked) {
                (true, _) => "solved",
                (false, true) => "open",
                (false, false) => "locked",
            };
            format!("{:<10} {:<8} {}", l.id, mark, l.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_snapshots(snapshots: &[Snapshot]) -> String {
    if snapshots.is_empty() {
        return "No archived cases yet.".to_string();
    }
    snapshots
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{:>2}. {} {} | {} | {} turns, stress {}",
                i + 1,
                s.timestamp.format("%Y-%m-%d %H:%M"),
                s.title,
                status_label(s.result),
                s.turns,
                s.stress
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_archive_view(view: &ArchiveView) -> String {
    let mut lines = vec!["[Archive review]".to_string()];
    if let Some(objective) = &view.objective {
        lines.push(format!("objective: {}", objective));
    }
    lines.push(format!("decisions: {}", view.decisions.join(" > ")));
    if !view.suggestion_history.is_empty() {
        lines.push(format!("suggestions: {}", view.suggestion_history.join(" | ")));
    }
    for node in &view.node_graph {
        lines.push(format!("  - {} {}", node.kind, node.label));
    }
    lines.join("\n")
}
