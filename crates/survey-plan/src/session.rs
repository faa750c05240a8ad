use serde::Serialize;

use crate::model::Pattern;

/// Active pattern plus whether its markers are currently editable.
///
/// Transitions are pure and return the next session; a transition that is
/// not allowed from the current state returns the session unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditSession {
    pub pattern: Pattern,
    pub editing: bool,
}

impl Default for EditSession {
    fn default() -> Self {
        Self { pattern: Pattern::Manual, editing: false }
    }
}

impl EditSession {
    pub fn is_locked(&self) -> bool {
        !self.editing
    }

    /// Switch pattern; only allowed while locked.
    pub fn select(self, pattern: Pattern) -> Self {
        if self.editing {
            self
        } else {
            Self { pattern, ..self }
        }
    }

    pub fn toggle(self) -> Self {
        Self { editing: !self.editing, ..self }
    }

    pub fn locked(self) -> Self {
        Self { editing: false, ..self }
    }
}
