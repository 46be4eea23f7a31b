use client_core::Notice;
use shared::domain::{ConversationTurn, TurnRole};

/// Assistant content is printed as received, without markup processing.
pub fn render_turn(turn: &ConversationTurn) -> String {
    match turn.role() {
        TurnRole::User => format!("you: {}", turn.content()),
        TurnRole::Assistant => {
            let mut rendered = format!("assistant:\n{}", turn.content());
            if !turn.context_files().is_empty() {
                rendered.push_str("\n\nReferenced files:");
                for file in turn.context_files() {
                    rendered.push_str("\n  - ");
                    rendered.push_str(file);
                }
            }
            rendered
        }
    }
}

pub fn render_notice(notice: &Notice) -> String {
    format!("error: {}", notice.message())
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
