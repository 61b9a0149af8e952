use pulse_core::{Status, StatusChangeRecord, UNSPECIFIED};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grouping dimension for a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Team,
    SubTeam,
    Platform,
    NewStatus,
}

/// One bucket of a breakdown: the dimension value, how many records
/// fell into it, and which distinct projects they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownBucket {
    pub key: String,
    pub count: usize,
    pub projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_days_in_status: Option<f64>,
}

/// Grouped aggregate over one dimension. Buckets are sorted by count
/// descending, then key, for deterministic report output. Records with
/// no value for the dimension land in an explicit `unspecified` bucket,
/// so the sum of bucket counts always equals the input record count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub dimension: Dimension,
    pub buckets: Vec<BreakdownBucket>,
}

impl Breakdown {
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

fn dimension_key(record: &StatusChangeRecord, dimension: Dimension) -> String {
    let value = match dimension {
        Dimension::Team => record.team.clone(),
        Dimension::SubTeam => record.sub_team.clone(),
        Dimension::Platform => record.platform.as_ref().map(|p| p.as_str().to_string()),
        Dimension::NewStatus => Some(record.new_status.as_str().to_string()),
    };
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNSPECIFIED.to_string())
}

/// Pure aggregation of a record set along one dimension.
pub fn breakdown(records: &[StatusChangeRecord], dimension: Dimension) -> Breakdown {
    let mut groups: BTreeMap<String, (usize, Vec<String>)> = BTreeMap::new();
    for record in records {
        let key = dimension_key(record, dimension);
        let entry = groups.entry(key).or_default();
        entry.0 += 1;
        if !entry.1.contains(&record.project_id) {
            entry.1.push(record.project_id.clone());
        }
    }

    let mut buckets: Vec<BreakdownBucket> = groups
        .into_iter()
        .map(|(key, (count, mut projects))| {
            projects.sort();
            BreakdownBucket {
                key,
                count,
                projects,
                mean_days_in_status: None,
            }
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

    Breakdown {
        dimension,
        buckets,
    }
}

/// Like `breakdown`, but with duration analysis: for status-valued keys
/// the bucket carries the mean elapsed days between a project entering
/// that status and its next transition out of it. Used for bottleneck
/// detection ("average days in QA").
pub fn breakdown_with_durations(
    records: &[StatusChangeRecord],
    dimension: Dimension,
) -> Breakdown {
    let mut result = breakdown(records, dimension);
    if dimension != Dimension::NewStatus {
        return result;
    }
    for bucket in &mut result.buckets {
        if bucket.key == UNSPECIFIED {
            continue;
        }
        bucket.mean_days_in_status = mean_days_in_status(records, &Status::from(bucket.key.as_str()));
    }
    result
}

/// Mean days a project spends in `status`: for each same-project pair of
/// a transition into `status` and the next transition away from it, take
/// the elapsed time; average over all such completed stays. `None` when
/// no stay in the record set ever completed.
pub fn mean_days_in_status(records: &[StatusChangeRecord], status: &Status) -> Option<f64> {
    let mut by_project: BTreeMap<&str, Vec<&StatusChangeRecord>> = BTreeMap::new();
    for record in records {
        by_project
            .entry(record.project_id.as_str())
            .or_default()
            .push(record);
    }

    let mut stays: Vec<f64> = Vec::new();
    for group in by_project.values_mut() {
        group.sort_by_key(|r| r.occurred_at);
        let mut entered_at = None;
        for record in group.iter() {
            match entered_at {
                None if record.new_status == *status => {
                    entered_at = Some(record.occurred_at);
                }
                Some(start) if record.new_status != *status => {
                    let elapsed = record.occurred_at - start;
                    stays.push(elapsed.as_seconds_f64() / 86_400.0);
                    entered_at = None;
                }
                _ => {}
            }
        }
    }

    if stays.is_empty() {
        None
    } else {
        Some(stays.iter().sum::<f64>() / stays.len() as f64)
    }
}
