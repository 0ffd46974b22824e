//! Front-End Commands
//!
//! Entry points for the terminal front end: parse a line, run it against
//! the application state and render the result as text.

pub mod input;
pub mod render;

pub use input::*;
pub use render::*;

use interrogation_core::action::Action;

use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// What the input loop should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// Run one parsed command.
pub async fn execute(state: &AppState, command: Command) -> AppResult<Flow> {
    let text = match command {
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => HELP_TEXT.to_string(),
        Command::Levels => render_levels(&state.level_statuses()),
        Command::Open(id) => {
            state.open_level(&id).await?;
            start_case(state).await?
        }
        Command::Action(action) => perform(state, action).await?,
        Command::Status => state.with_session(|s| render_status(s)).await?,
        Command::Evidence => state.with_session(|s| render_evidence(s)).await?,
        Command::Graph(kind) => {
            state
                .with_session(|s| render_graph(&s.state().nodes_of(kind)))
                .await?
        }
        Command::Archive => render_snapshots(&state.snapshots()),
        Command::Load(index) => state
            .with_session(|s| s.load_snapshot(index).map(render_archive_view))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Archived case {}", index + 1)))?,
        Command::Summary => state
            .with_session(|s| s.summary().map(str::to_string))
            .await?
            .unwrap_or_else(|| "The case is still open.".to_string()),
        Command::Reset => {
            state.with_session(|s| s.reset_chapter()).await?;
            start_case(state).await?
        }
        Command::ResetAll => {
            state.with_session(|s| s.reset_all()).await?;
            start_case(state).await?
        }
    };
    Ok(Flow::Continue(text))
}

async fn start_case(state: &AppState) -> AppResult<String> {
    let intro = state
        .with_session(|s| format!("== {} ==\n{}", s.level().title, s.level().intro_story))
        .await?;
    let opening = perform(state, Action::Start).await?;
    Ok(format!("{}\n\n{}", intro, opening))
}

/// Dispatch an action and render it, appending the case summary once the
/// case is closed.
async fn perform(state: &AppState, action: Action) -> AppResult<String> {
    let outcome = state.dispatch(action).await;
    let (ai_name, summary) = state
        .with_session(|s| {
            let closed = !s.state().is_playing();
            (
                s.level().ai_name.clone(),
                closed.then(|| s.summary().map(str::to_string)).flatten(),
            )
        })
        .await
        .unwrap_or_default();

    let mut text = render_outcome(&outcome, &ai_name);
    if outcome.is_applied() {
        if let Some(summary) = summary {
            text.push_str("\n\n");
            text.push_str(&summary);
        }
    }
    Ok(text)
}
