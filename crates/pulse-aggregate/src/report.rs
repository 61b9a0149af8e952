use crate::breakdown::{breakdown, breakdown_with_durations, Breakdown, Dimension};
use crate::path::{paths_for_all, StatusPath};
use pulse_core::normalize::NormalizedBatch;
use pulse_core::{Stage, Status, StatusChangeRecord, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Weekly,
    Monthly,
    Custom,
}

/// Inclusive reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub kind: PeriodKind,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl Period {
    /// Trailing window of `weeks_back` weeks ending at `reference`.
    pub fn weekly(reference: OffsetDateTime, weeks_back: u32) -> Period {
        Period {
            kind: PeriodKind::Weekly,
            start: reference - Duration::weeks(i64::from(weeks_back)),
            end: reference,
        }
    }

    /// Calendar month, ending on the month's last second.
    pub fn monthly(year: i32, month: u8) -> anyhow::Result<Period> {
        let month = Month::try_from(month)?;
        let start = Date::from_calendar_date(year, month, 1)?;
        let next = match month {
            Month::December => Date::from_calendar_date(year + 1, Month::January, 1)?,
            _ => Date::from_calendar_date(year, month.next(), 1)?,
        };
        Ok(Period {
            kind: PeriodKind::Monthly,
            start: PrimitiveDateTime::new(start, Time::MIDNIGHT).assume_utc(),
            end: PrimitiveDateTime::new(next, Time::MIDNIGHT).assume_utc()
                - Duration::seconds(1),
        })
    }

    pub fn custom(start: OffsetDateTime, end: OffsetDateTime) -> Period {
        Period {
            kind: PeriodKind::Custom,
            start,
            end,
        }
    }
}

/// How many changes landed a project in each coarse lifecycle stage,
/// keyed by every record's new status. Unrecognized statuses fall
/// outside all three buckets, so the sum can be less than
/// `total_changes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDistribution {
    pub to_do: usize,
    pub in_progress: usize,
    pub complete: usize,
}

fn stage_distribution(records: &[StatusChangeRecord]) -> StageDistribution {
    let mut dist = StageDistribution::default();
    for record in records {
        match record.new_status.stage() {
            Some(Stage::ToDo) => dist.to_do += 1,
            Some(Stage::InProgress) => dist.in_progress += 1,
            Some(Stage::Complete) => dist.complete += 1,
            None => {}
        }
    }
    dist
}

/// Tally of one observed transition shape across the record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCount {
    pub from: Status,
    pub to: Status,
    pub count: usize,
}

/// The period report both executors render from. A fresh value per
/// invocation; never persisted here. All collections are ordered so the
/// serialized form is byte-stable for parity comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: u32,
    pub period: Period,
    pub total_changes: usize,
    pub skipped_records: usize,
    pub noop_transitions: usize,
    pub unique_projects: usize,
    pub active_teams: usize,
    pub stage_distribution: StageDistribution,
    pub transition_counts: Vec<TransitionCount>,
    pub paths: Vec<StatusPath>,
    pub breakdowns: Vec<Breakdown>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

/// Default report dimensions, in render order.
pub const DEFAULT_DIMENSIONS: [Dimension; 4] = [
    Dimension::Team,
    Dimension::SubTeam,
    Dimension::Platform,
    Dimension::NewStatus,
];

/// Assemble a report for one period from an already-normalized batch.
/// `total_changes` counts exactly the records that survived
/// normalization; rejects appear only as `skipped_records`.
pub fn compose_report(period: Period, batch: &NormalizedBatch) -> Report {
    compose_report_with(period, batch, &DEFAULT_DIMENSIONS)
}

pub fn compose_report_with(
    period: Period,
    batch: &NormalizedBatch,
    dimensions: &[Dimension],
) -> Report {
    let records = &batch.records;

    let unique_projects = records
        .iter()
        .map(|r| r.project_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let active_teams = records
        .iter()
        .filter_map(|r| r.team.as_deref())
        .collect::<BTreeSet<_>>()
        .len();

    let breakdowns = dimensions
        .iter()
        .map(|&dim| match dim {
            Dimension::NewStatus => breakdown_with_durations(records, dim),
            _ => breakdown(records, dim),
        })
        .collect();

    Report {
        schema_version: SCHEMA_VERSION,
        period,
        total_changes: records.len(),
        skipped_records: batch.skipped(),
        noop_transitions: batch.noop_transitions(),
        unique_projects,
        active_teams,
        stage_distribution: stage_distribution(records),
        transition_counts: transition_counts(records),
        paths: paths_for_all(records),
        breakdowns,
        generated_at: OffsetDateTime::now_utc(),
    }
}

fn transition_counts(records: &[StatusChangeRecord]) -> Vec<TransitionCount> {
    let mut tally: BTreeMap<(String, String), usize> = BTreeMap::new();
    for record in records {
        let key = (
            record.previous_status.as_str().to_string(),
            record.new_status.as_str().to_string(),
        );
        *tally.entry(key).or_insert(0) += 1;
    }
    let mut counts: Vec<TransitionCount> = tally
        .into_iter()
        .map(|((from, to), count)| TransitionCount {
            from: Status::from(from),
            to: Status::from(to),
            count,
        })
        .collect();
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.from.as_str().cmp(b.from.as_str()))
            .then_with(|| a.to.as_str().cmp(b.to.as_str()))
    });
    counts
}
