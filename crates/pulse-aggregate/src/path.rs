use pulse_core::{ProjectId, Status, StatusChangeRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// One node of a status path. The timestamp is the moment of the record
/// that first introduced this status; later duplicate writes never
/// advance it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
}

/// Ordered, deduplicated sequence of statuses a project passed through
/// in a period. Invariants: no two consecutive equal statuses, and
/// timestamps are non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPath {
    pub project_id: ProjectId,
    pub project_name: String,
    pub steps: Vec<PathStep>,
}

impl StatusPath {
    /// Render as "QA → LIVE" style arrows, the shape both report
    /// executors format from.
    pub fn arrows(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.status.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// Build one project's status path from its records in a period.
///
/// Records are stably sorted by `occurred_at` (insertion order breaks
/// ties, keeping the walk deterministic). A `seed` is the project's
/// known status at period start and becomes the path's first node when
/// supplied, so a path continues cleanly across period boundaries.
///
/// The dedup rule: a status is appended only when it differs from the
/// path's current last entry. Oscillation (A→B→A→B) is meaningful and
/// preserved; redundant repetition (B→B) collapses.
///
/// Zero records yield `None` — the project is absent from the report,
/// not present with an empty path.
pub fn aggregate_path(
    project_id: &str,
    project_name: &str,
    records: &[&StatusChangeRecord],
    seed: Option<Status>,
) -> Option<StatusPath> {
    if records.is_empty() {
        return None;
    }

    let mut sorted: Vec<&StatusChangeRecord> = records.to_vec();
    sorted.sort_by_key(|r| r.occurred_at);

    let first = sorted[0];
    let mut steps: Vec<PathStep> = Vec::new();
    if let Some(status) = seed {
        push_step(&mut steps, status, first.occurred_at);
    }
    push_step(&mut steps, first.previous_status.clone(), first.occurred_at);
    for record in &sorted {
        push_step(&mut steps, record.new_status.clone(), record.occurred_at);
    }

    Some(StatusPath {
        project_id: project_id.to_string(),
        project_name: project_name.to_string(),
        steps,
    })
}

fn push_step(steps: &mut Vec<PathStep>, status: Status, occurred_at: OffsetDateTime) {
    if steps.last().map(|s| &s.status) == Some(&status) {
        return;
    }
    steps.push(PathStep {
        status,
        occurred_at,
    });
}

/// Build paths for every distinct project in the record set, ordered by
/// project name (then id) for deterministic report output.
pub fn paths_for_all(records: &[StatusChangeRecord]) -> Vec<StatusPath> {
    let mut by_project: BTreeMap<(String, String), Vec<&StatusChangeRecord>> = BTreeMap::new();
    for record in records {
        by_project
            .entry((record.project_name.clone(), record.project_id.clone()))
            .or_default()
            .push(record);
    }

    by_project
        .into_iter()
        .filter_map(|((name, id), group)| aggregate_path(&id, &name, &group, None))
        .collect()
}

/// Merge independently fetched batches into one time-sorted sequence.
///
/// Aggregation is associative per project, but path dedup is not
/// associative across arbitrary batch splits — callers must re-run
/// `aggregate_path` over the merged sequence rather than concatenating
/// per-batch paths.
pub fn merge_sorted(batches: Vec<Vec<StatusChangeRecord>>) -> Vec<StatusChangeRecord> {
    let mut merged: Vec<StatusChangeRecord> = batches.into_iter().flatten().collect();
    merged.sort_by_key(|r| r.occurred_at);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(project: &str, prev: &str, new: &str, at: OffsetDateTime) -> StatusChangeRecord {
        StatusChangeRecord {
            record_id: None,
            project_id: project.to_string(),
            project_name: project.to_string(),
            team: None,
            sub_team: None,
            platform: None,
            version: None,
            release_type: None,
            previous_status: Status::from(prev),
            new_status: Status::from(new),
            changed_by: vec![],
            note: None,
            occurred_at: at,
            source: None,
        }
    }

    fn statuses(path: &StatusPath) -> Vec<&str> {
        path.steps.iter().map(|s| s.status.as_str()).collect()
    }

    #[test]
    fn no_records_no_path() {
        assert_eq!(aggregate_path("p", "p", &[], None), None);
    }

    #[test]
    fn single_record_yields_two_nodes() {
        let r = record("p", "QA", "LIVE", datetime!(2025-08-05 10:00 UTC));
        let path = aggregate_path("p", "p", &[&r], None).unwrap();
        assert_eq!(statuses(&path), vec!["QA", "LIVE"]);
    }

    #[test]
    fn single_noop_record_yields_one_node() {
        let r = record("p", "LIVE", "LIVE", datetime!(2025-08-05 10:00 UTC));
        let path = aggregate_path("p", "p", &[&r], None).unwrap();
        assert_eq!(statuses(&path), vec!["LIVE"]);
    }

    #[test]
    fn redundant_repetition_collapses() {
        let rs = vec![
            record("p", "BACKLOG", "DEVELOPMENT", datetime!(2025-08-01 10:00 UTC)),
            record("p", "DEVELOPMENT", "DEVELOPMENT", datetime!(2025-08-02 10:00 UTC)),
            record("p", "DEVELOPMENT", "QA", datetime!(2025-08-03 10:00 UTC)),
        ];
        let refs: Vec<&StatusChangeRecord> = rs.iter().collect();
        let path = aggregate_path("p", "p", &refs, None).unwrap();
        assert_eq!(statuses(&path), vec!["BACKLOG", "DEVELOPMENT", "QA"]);
    }

    #[test]
    fn oscillation_preserved() {
        let rs = vec![
            record("p", "BACKLOG", "DEVELOPMENT", datetime!(2025-08-01 10:00 UTC)),
            record("p", "DEVELOPMENT", "QA", datetime!(2025-08-02 10:00 UTC)),
            record("p", "QA", "DEVELOPMENT", datetime!(2025-08-03 10:00 UTC)),
        ];
        let refs: Vec<&StatusChangeRecord> = rs.iter().collect();
        let path = aggregate_path("p", "p", &refs, None).unwrap();
        assert_eq!(
            statuses(&path),
            vec!["BACKLOG", "DEVELOPMENT", "QA", "DEVELOPMENT"]
        );
    }

    #[test]
    fn step_keeps_timestamp_of_first_occurrence() {
        let rs = vec![
            record("p", "DEVELOPMENT", "QA", datetime!(2025-08-01 10:00 UTC)),
            record("p", "QA", "QA", datetime!(2025-08-04 10:00 UTC)),
        ];
        let refs: Vec<&StatusChangeRecord> = rs.iter().collect();
        let path = aggregate_path("p", "p", &refs, None).unwrap();
        assert_eq!(statuses(&path), vec!["DEVELOPMENT", "QA"]);
        assert_eq!(path.steps[1].occurred_at, datetime!(2025-08-01 10:00 UTC));
    }

    #[test]
    fn seed_continues_across_period_boundary() {
        let rs = vec![record("p", "QA", "LIVE", datetime!(2025-08-05 10:00 UTC))];
        let refs: Vec<&StatusChangeRecord> = rs.iter().collect();
        let path = aggregate_path("p", "p", &refs, Some(Status::Development)).unwrap();
        assert_eq!(statuses(&path), vec!["DEVELOPMENT", "QA", "LIVE"]);

        // Seed equal to the first previous status does not duplicate.
        let path = aggregate_path("p", "p", &refs, Some(Status::Qa)).unwrap();
        assert_eq!(statuses(&path), vec!["QA", "LIVE"]);
    }

    #[test]
    fn dedup_is_idempotent_on_replay() {
        let rs = vec![
            record("p", "BACKLOG", "DEVELOPMENT", datetime!(2025-08-01 10:00 UTC)),
            record("p", "DEVELOPMENT", "DEVELOPMENT", datetime!(2025-08-02 10:00 UTC)),
            record("p", "DEVELOPMENT", "QA", datetime!(2025-08-03 10:00 UTC)),
        ];
        let refs: Vec<&StatusChangeRecord> = rs.iter().collect();
        let path = aggregate_path("p", "p", &refs, None).unwrap();

        // Replay the deduplicated path as adjacent transitions.
        let replay: Vec<StatusChangeRecord> = path
            .steps
            .windows(2)
            .map(|w| {
                record(
                    "p",
                    w[0].status.as_str(),
                    w[1].status.as_str(),
                    w[1].occurred_at,
                )
            })
            .collect();
        let replay_refs: Vec<&StatusChangeRecord> = replay.iter().collect();
        let again = aggregate_path("p", "p", &replay_refs, None).unwrap();
        assert_eq!(statuses(&again), statuses(&path));
    }

    #[test]
    fn stable_sort_keeps_insertion_order_on_ties() {
        let at = datetime!(2025-08-01 10:00 UTC);
        let rs = vec![
            record("p", "BACKLOG", "DEVELOPMENT", at),
            record("p", "DEVELOPMENT", "QA", at),
        ];
        let refs: Vec<&StatusChangeRecord> = rs.iter().collect();
        let path = aggregate_path("p", "p", &refs, None).unwrap();
        assert_eq!(statuses(&path), vec!["BACKLOG", "DEVELOPMENT", "QA"]);
    }

    #[test]
    fn paths_for_all_orders_by_project_name() {
        let rs = vec![
            record("zebra", "QA", "LIVE", datetime!(2025-08-02 10:00 UTC)),
            record("apple", "QA", "LIVE", datetime!(2025-08-01 10:00 UTC)),
        ];
        let paths = paths_for_all(&rs);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].project_name, "apple");
        assert_eq!(paths[1].project_name, "zebra");
    }

    #[test]
    fn split_batches_merge_to_same_path() {
        let a = vec![
            record("p", "BACKLOG", "DEVELOPMENT", datetime!(2025-08-01 10:00 UTC)),
            record("p", "DEVELOPMENT", "DEVELOPMENT", datetime!(2025-08-02 10:00 UTC)),
        ];
        let b = vec![record("p", "DEVELOPMENT", "QA", datetime!(2025-08-03 10:00 UTC))];

        let whole: Vec<StatusChangeRecord> =
            a.iter().cloned().chain(b.iter().cloned()).collect();
        let whole_refs: Vec<&StatusChangeRecord> = whole.iter().collect();
        let expected = aggregate_path("p", "p", &whole_refs, None).unwrap();

        let merged = merge_sorted(vec![b, a]);
        let merged_refs: Vec<&StatusChangeRecord> = merged.iter().collect();
        let got = aggregate_path("p", "p", &merged_refs, None).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn arrows_render_in_order() {
        let rs = vec![record("p", "QA", "LIVE", datetime!(2025-08-05 10:00 UTC))];
        let refs: Vec<&StatusChangeRecord> = rs.iter().collect();
        let path = aggregate_path("p", "p", &refs, None).unwrap();
        assert_eq!(path.arrows(), "QA → LIVE");
    }
}
