use crate::types::{Platform, RawEvent, Status, StatusChangeRecord};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// A single raw event failed validation. Policy is skip-and-count per
/// batch; the caller decides whether one bad record aborts anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed record: missing or invalid field `{field}`")]
    MalformedRecord { field: &'static str },
}

impl NormalizeError {
    pub fn field(&self) -> &'static str {
        match self {
            NormalizeError::MalformedRecord { field } => field,
        }
    }
}

/// Result of normalizing a batch of raw events with skip-and-count policy.
#[derive(Debug, Default, Serialize)]
pub struct NormalizedBatch {
    pub records: Vec<StatusChangeRecord>,
    #[serde(skip)]
    pub rejects: Vec<NormalizeError>,
}

impl NormalizedBatch {
    /// Count of records skipped during normalization, surfaced in
    /// report metadata.
    pub fn skipped(&self) -> usize {
        self.rejects.len()
    }

    pub fn noop_transitions(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.is_noop_transition())
            .count()
    }
}

/// Validate and canonicalize one raw event into a `StatusChangeRecord`.
/// Pure function: no I/O, deterministic, total over any JSON mapping.
pub fn normalize(raw: &RawEvent) -> Result<StatusChangeRecord, NormalizeError> {
    let project_name = require_str(raw, "project_name")?;
    let project_id = opt_str(raw, "project_id").unwrap_or_else(|| project_name.clone());
    let previous_status = Status::from(require_str(raw, "previous_status")?);
    let new_status = Status::from(require_str(raw, "new_status")?);
    let occurred_at = parse_timestamp(&require_str(raw, "date")?)
        .ok_or(NormalizeError::MalformedRecord { field: "date" })?;

    Ok(StatusChangeRecord {
        record_id: opt_str(raw, "id"),
        project_id,
        project_name,
        team: opt_str(raw, "team"),
        sub_team: opt_str(raw, "sub_team"),
        platform: opt_str(raw, "platform").map(Platform::from),
        version: opt_str(raw, "version"),
        release_type: opt_str(raw, "release_type"),
        previous_status,
        new_status,
        changed_by: str_array(raw, "changed_by"),
        note: opt_str(raw, "whats_new"),
        occurred_at,
        source: opt_str(raw, "automation_source"),
    })
}

/// Normalize a batch, skipping malformed events and keeping the rejects
/// so their count can be surfaced alongside the report.
pub fn normalize_batch<'a, I>(raws: I) -> NormalizedBatch
where
    I: IntoIterator<Item = &'a RawEvent>,
{
    let mut batch = NormalizedBatch::default();
    for raw in raws {
        match normalize(raw) {
            Ok(record) => batch.records.push(record),
            Err(err) => batch.rejects.push(err),
        }
    }
    batch
}

fn require_str(raw: &RawEvent, field: &'static str) -> Result<String, NormalizeError> {
    opt_str(raw, field).ok_or(NormalizeError::MalformedRecord { field })
}

fn opt_str(raw: &RawEvent, field: &str) -> Option<String> {
    raw.get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn str_array(raw: &RawEvent, field: &str) -> Vec<String> {
    raw.get(field)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (read as midnight UTC).
fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    let date = Date::parse(s, format_description!("[year]-[month]-[day]")).ok()?;
    Some(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc())
}
