use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Structured, closed-set representation of what a natural-language
/// question is asking for. Produced by the external language-model call;
/// the engine never parses free text. Anything the model could not
/// classify arrives as `Unrecognized` and is answered with a
/// clarification request, never a guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    TimeRange {
        #[serde(default, with = "time::serde::rfc3339::option")]
        from: Option<OffsetDateTime>,
        #[serde(default, with = "time::serde::rfc3339::option")]
        to: Option<OffsetDateTime>,
    },
    StatusIs {
        status: String,
    },
    TeamIs {
        team: String,
    },
    PlatformIs {
        platform: String,
    },
    Transition {
        from: String,
        to: String,
    },
    All {
        intents: Vec<Intent>,
    },
    Unrecognized,
}

impl Intent {
    /// True when the intent carries an explicit time range anywhere in
    /// its tree. Intents without one are refinements of the previous
    /// question when a conversation context exists.
    pub fn has_time_range(&self) -> bool {
        match self {
            Intent::TimeRange { .. } => true,
            Intent::All { intents } => intents.iter().any(Intent::has_time_range),
            _ => false,
        }
    }

    /// True when no part of the intent tree is `Unrecognized`. A
    /// conjunction with one unmappable part is as unanswerable as a
    /// wholly unmapped question.
    pub fn is_recognized(&self) -> bool {
        match self {
            Intent::Unrecognized => false,
            Intent::All { intents } => intents.iter().all(Intent::is_recognized),
            _ => true,
        }
    }
}
