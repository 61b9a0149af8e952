pub mod breakdown;
pub mod path;
pub mod report;

pub use breakdown::{breakdown, breakdown_with_durations, Breakdown, BreakdownBucket, Dimension};
pub use path::{aggregate_path, merge_sorted, paths_for_all, PathStep, StatusPath};
pub use report::{
    compose_report, compose_report_with, Period, PeriodKind, Report, StageDistribution,
    TransitionCount,
};
