use crate::types::{StatusChangeRecord, UNSPECIFIED};
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

/// Rolling retention window, in whole calendar months. Fixed at one
/// month by requirement but modeled as a parameter so the cutoff
/// calculator stays pure and testable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub retention_months: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention_months: 1,
        }
    }
}

/// First day of the month `retention_months` before the reference
/// month. Depends only on the reference's year and month, never its
/// day-of-month, so short months cannot shift the boundary.
pub fn cutoff(reference: Date, policy: &RetentionPolicy) -> Date {
    let months = reference.year() * 12 + i32::from(reference.month() as u8) - 1;
    let target = months - policy.retention_months as i32;
    let year = target.div_euclid(12);
    let month = target.rem_euclid(12) as u8 + 1;
    Date::from_calendar_date(
        year,
        Month::try_from(month).expect("rem_euclid(12)+1 is always 1..=12"),
        1,
    )
    .expect("day 1 exists in every month")
}

/// A record is eligible for archival iff it occurred strictly before
/// the cutoff date.
pub fn is_expired(record: &StatusChangeRecord, cutoff: Date) -> bool {
    record.occurred_at.date() < cutoff
}

/// Dry-run summary of what an archival pass would remove. Produced
/// without performing any deletion; the archive I/O belongs to the
/// caller.
#[derive(Debug, Serialize)]
pub struct CleanupPlan {
    pub cutoff: Date,
    pub expired: usize,
    pub by_team: Vec<(String, usize)>,
    pub by_platform: Vec<(String, usize)>,
    pub by_month: Vec<(String, usize)>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub oldest: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub newest: Option<OffsetDateTime>,
}

impl CleanupPlan {
    pub fn from_records(records: &[StatusChangeRecord], cutoff: Date) -> Self {
        let expired: Vec<&StatusChangeRecord> =
            records.iter().filter(|r| is_expired(r, cutoff)).collect();

        let mut by_team = std::collections::BTreeMap::new();
        let mut by_platform = std::collections::BTreeMap::new();
        let mut by_month = std::collections::BTreeMap::new();
        for r in &expired {
            let team = r.team.clone().unwrap_or_else(|| UNSPECIFIED.to_string());
            *by_team.entry(team).or_insert(0) += 1;
            let platform = r
                .platform
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| UNSPECIFIED.to_string());
            *by_platform.entry(platform).or_insert(0) += 1;
            let month = format!(
                "{:04}-{:02}",
                r.occurred_at.year(),
                r.occurred_at.month() as u8
            );
            *by_month.entry(month).or_insert(0) += 1;
        }

        CleanupPlan {
            cutoff,
            expired: expired.len(),
            by_team: by_team.into_iter().collect(),
            by_platform: by_platform.into_iter().collect(),
            by_month: by_month.into_iter().collect(),
            oldest: expired.iter().map(|r| r.occurred_at).min(),
            newest: expired.iter().map(|r| r.occurred_at).max(),
        }
    }
}
