use serde::{Deserialize, Serialize};

/// Readiness of an entity for destruction.
///
/// Life only ever advances: Alive -> Dying -> Dead. A Dead entity may then be
/// removed from the store entirely, after which it no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Life {
    Alive,
    Dying,
    Dead,
}

impl Life {
    pub fn as_str(&self) -> &'static str {
        match self {
            Life::Alive => "alive",
            Life::Dying => "dying",
            Life::Dead => "dead",
        }
    }

    /// True when this life has reached `target` or moved beyond it.
    pub fn is_at_least(&self, target: Life) -> bool {
        *self >= target
    }
}

impl std::fmt::Display for Life {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
