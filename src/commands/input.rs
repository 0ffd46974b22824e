//! Input Commands
//!
//! Parses one line of player input. Lines starting with `/` are commands;
//! anything else is a question for the suspect.

use interrogation_core::action::Action;
use interrogation_core::NodeKind;

use crate::utils::error::{AppError, AppResult};

pub const HELP_TEXT: &str = "\
Commands:
  <text>            ask the suspect a question (5 energy, +15 after the reply)
  /present <id>     present a found evidence item (5 energy)
  /scan             deep scan: read the next reply's hidden thought (20 energy)
  /hack             unlock the next hidden evidence item (30 energy)
  /press            logic overload (40 energy, 30s cooldown, may backfire)
  /rest             recover 20 energy, relieve 5 stress
  /appease          recover 50 energy, relieve 15 stress
  /close            force the case closed (won above 80 stress)
  /evidence         show the evidence board
  /status           show meters, objective and decisions
  /levels           list levels
  /open <id>        open a level and start the interrogation
  /graph [kind]     show the node graph (evidence, skill, node, system)
  /archive [n]      list archived cases, or review case n
  /summary          show the case summary
  /reset            replay the current chapter
  /reset-all        replay and forget completed levels
  /help             show this help
  /quit             leave";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    Levels,
    Open(String),
    Evidence,
    Status,
    Graph(Option<NodeKind>),
    Archive,
    /// Zero-based snapshot index
    Load(usize),
    Summary,
    Reset,
    ResetAll,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> AppResult<Command> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Action(Action::Ask(line.to_string())));
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    let command = match (name.as_str(), arg) {
        ("start", None) => Command::Action(Action::Start),
        ("scan", None) => Command::Action(Action::DeepScan),
        ("hack", None) => Command::Action(Action::Hack),
        ("press", None) => Command::Action(Action::LogicPress),
        ("rest", None) => Command::Action(Action::Rest),
        ("appease", None) => Command::Action(Action::Appease),
        ("close", None) => Command::Action(Action::ForceClose),
        ("present", Some(id)) => Command::Action(Action::PresentEvidence(id.to_string())),
        ("open", Some(id)) => Command::Open(id.to_string()),
        ("archive" | "load", Some(n)) => Command::Load(case_index(n)?),
        ("graph", None) => Command::Graph(None),
        ("graph", Some(kind)) => match NodeKind::parse(kind) {
            Some(kind) => Command::Graph(Some(kind)),
            None => {
                return Err(AppError::validation(format!(
                    "unknown node kind '{}'",
                    kind
                )))
            }
        },
        ("levels", None) => Command::Levels,
        ("evidence", None) => Command::Evidence,
        ("status", None) => Command::Status,
        ("archive", None) => Command::Archive,
        ("summary", None) => Command::Summary,
        ("reset", None) => Command::Reset,
        ("reset-all", None) => Command::ResetAll,
        ("help", None) => Command::Help,
        ("quit" | "exit", None) => Command::Quit,
        ("present" | "open" | "load", None) => {
            return Err(AppError::validation(format!("/{} needs an argument", name)))
        }
        _ => {
            return Err(AppError::validation(format!(
                "unknown command '/{}', try /help",
                rest
            )))
        }
    };
    Ok(command)
}

/// One-based case number to a snapshot index
fn case_index(arg: &str) -> AppResult<usize> {
    let n: usize = arg
        .parse()
        .map_err(|_| AppError::validation(format!("'{}' is not a case number", arg)))?;
    n.checked_sub(1)
        .ok_or_else(|| AppError::validation("case numbers start at 1"))
}
