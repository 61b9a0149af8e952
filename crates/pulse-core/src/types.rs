use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Current schema version for reports and compiled queries.
pub const SCHEMA_VERSION: u32 = 1;

/// Project identifier (a non-owning lookup key into the external store).
pub type ProjectId = String;

/// A raw status-change event as delivered by the external document store.
pub type RawEvent = serde_json::Map<String, serde_json::Value>;

/// Bucket key used when a record carries no value for a grouping dimension.
pub const UNSPECIFIED: &str = "unspecified";

/// Lifecycle status of a project. Unknown upstream values are preserved
/// as `Unrecognized` rather than rejected, so the pipeline degrades
/// gracefully as the upstream schema evolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Backlog,
    WaitingForDev,
    Development,
    Qa,
    WaitingRelease,
    ReleasePool,
    Live,
    Paused,
    Blocked,
    Suspended,
    Rejected,
    Archive,
    Unrecognized(String),
}

impl Status {
    /// Canonical upstream spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Status::Backlog => "BACKLOG",
            Status::WaitingForDev => "WAITING FOR DEV",
            Status::Development => "DEVELOPMENT",
            Status::Qa => "QA",
            Status::WaitingRelease => "WAITING RELEASE",
            Status::ReleasePool => "RELEASE POOL",
            Status::Live => "LIVE",
            Status::Paused => "PAUSED",
            Status::Blocked => "BLOCKED",
            Status::Suspended => "SUSPENDED",
            Status::Rejected => "REJECTED",
            Status::Archive => "ARCHIVE",
            Status::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Status::Unrecognized(_))
    }

    /// Coarse pipeline stage, used by status-distribution summaries.
    /// `None` for unrecognized values.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Status::Backlog => Some(Stage::ToDo),
            Status::WaitingForDev
            | Status::Development
            | Status::Qa
            | Status::WaitingRelease
            | Status::ReleasePool => Some(Stage::InProgress),
            Status::Live
            | Status::Paused
            | Status::Blocked
            | Status::Suspended
            | Status::Rejected
            | Status::Archive => Some(Stage::Complete),
            Status::Unrecognized(_) => None,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BACKLOG" => Status::Backlog,
            "WAITING FOR DEV" => Status::WaitingForDev,
            "DEVELOPMENT" => Status::Development,
            "QA" => Status::Qa,
            "WAITING RELEASE" => Status::WaitingRelease,
            "RELEASE POOL" => Status::ReleasePool,
            "LIVE" => Status::Live,
            "PAUSED" => Status::Paused,
            "BLOCKED" => Status::Blocked,
            "SUSPENDED" => Status::Suspended,
            "REJECTED" => Status::Rejected,
            "ARCHIVE" => Status::Archive,
            _ => Status::Unrecognized(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Status::from(s.to_string())
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse status grouping for distribution summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ToDo,
    InProgress,
    Complete,
}

/// Distribution platform. Alias spellings from free-form upstream input
/// ("google play", "amazon") are folded into the canonical variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Gp,
    Ios,
    Amz,
    FireTv,
    Unrecognized(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Gp => "GP",
            Platform::Ios => "iOS",
            Platform::Amz => "AMZ",
            Platform::FireTv => "Fire TV",
            Platform::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Platform::Unrecognized(_))
    }
}

impl From<String> for Platform {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "gp" | "google play" => Platform::Gp,
            "ios" => Platform::Ios,
            "amz" | "amazon" => Platform::Amz,
            "fire tv" | "firetv" => Platform::FireTv,
            _ => Platform::Unrecognized(s),
        }
    }
}

impl From<&str> for Platform {
    fn from(s: &str) -> Self {
        Platform::from(s.to_string())
    }
}

impl From<Platform> for String {
    fn from(p: Platform) -> Self {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized status-change event. Immutable once produced by
/// the normalizer; ordering by `occurred_at` is the primary invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    /// External store identifier, used to key archival. Absent for
    /// records that never touched the store (e.g. fixtures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub project_id: ProjectId,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,
    pub previous_status: Status,
    pub new_status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl StatusChangeRecord {
    /// A no-op transition: status unchanged, typically a metadata-only
    /// update such as a version bump. Accepted but surfaced in report
    /// metadata; must not break path deduplication downstream.
    pub fn is_noop_transition(&self) -> bool {
        self.previous_status == self.new_status
    }
}
