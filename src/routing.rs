//! Which moves the board offers for a candidate.
//!
//! These are affordances for the presentation layer only. The store accepts
//! any transition; nothing here is enforced.

use crate::candidate::{Candidate, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartChinese,
    StartEnglish,
    /// Leave the current interview. Goes to `Completed` when the other
    /// language is already done, otherwise back to the waiting lobby.
    Finish { to: Stage },
    /// Manual override for a waiting candidate with both interviews done.
    MarkCompleted,
}

impl Action {
    pub fn target(&self) -> Stage {
        match self {
            Action::StartChinese => Stage::InChinese,
            Action::StartEnglish => Stage::InEnglish,
            Action::Finish { to } => *to,
            Action::MarkCompleted => Stage::Completed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::StartChinese => "Chinese interview",
            Action::StartEnglish => "English interview",
            Action::Finish {
                to: Stage::Completed,
            } => "All done",
            Action::Finish { .. } => "Finish (back to lobby)",
            Action::MarkCompleted => "Mark completed",
        }
    }
}

/// Actions available to `candidate`, in display order.
pub fn available_actions(candidate: &Candidate) -> Vec<Action> {
    let stage = candidate.current_stage;
    if stage == Stage::Completed {
        return Vec::new();
    }

    let mut actions = Vec::with_capacity(3);
    if stage != Stage::InChinese && !candidate.has_completed_chinese {
        actions.push(Action::StartChinese);
    }
    if stage != Stage::InEnglish && !candidate.has_completed_english {
        actions.push(Action::StartEnglish);
    }

    let other_done = match stage {
        Stage::InChinese => Some(candidate.has_completed_english),
        Stage::InEnglish => Some(candidate.has_completed_chinese),
        _ => None,
    };
    if let Some(other_done) = other_done {
        let to = if other_done {
            Stage::Completed
        } else {
            Stage::Waiting
        };
        actions.push(Action::Finish { to });
    }

    if stage == Stage::Waiting && candidate.has_completed_chinese && candidate.has_completed_english
    {
        actions.push(Action::MarkCompleted);
    }
    actions
}
