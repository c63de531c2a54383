use serde::Serialize;

/// Tri-state result shared by UPDATE, CHECK, LOOKUP and FETCH replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Affirmative; LOOKUP and FETCH replies carry a value.
    Found,
    /// Negative or key not present.
    NotFound,
    /// Backend error, or no handler registered for the request.
    Failed,
}

impl Outcome {
    /// Wire encoding of the result field.
    pub fn code(self) -> i32 {
        match self {
            Outcome::Found => 1,
            Outcome::NotFound => 0,
            Outcome::Failed => -1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Outcome::Found),
            0 => Some(Outcome::NotFound),
            -1 => Some(Outcome::Failed),
            _ => None,
        }
    }

    pub fn is_found(self) -> bool {
        self == Outcome::Found
    }
}

impl From<bool> for Outcome {
    fn from(found: bool) -> Self {
        if found {
            Outcome::Found
        } else {
            Outcome::NotFound
        }
    }
}
