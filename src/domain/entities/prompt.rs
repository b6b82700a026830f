use serde::Serialize;

use crate::domain::entities::conversation::TurnRole;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptTurn {
    pub role: TurnRole,
    pub text: String,
}

/// Provider-neutral prompt: an optional system instruction followed by the
/// dialogue in chronological order, ending with the turn to answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub system_instruction: Option<String>,
    pub turns: Vec<PromptTurn>,
}

impl Prompt {
    pub fn single_turn(text: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            turns: vec![PromptTurn {
                role: TurnRole::User,
                text: text.into(),
            }],
        }
    }

    pub fn last_turn(&self) -> Option<&PromptTurn> {
        self.turns.last()
    }
}
