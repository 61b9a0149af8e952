use crate::config::PulseConfig;
use crate::input;
use pulse_aggregate::{compose_report, Dimension, Period, Report};
use pulse_core::normalize::normalize_batch;
use std::path::Path;
use time::{OffsetDateTime, PrimitiveDateTime, Time};

pub struct ReportParams<'a> {
    pub input: &'a Path,
    pub weeks: Option<u32>,
    pub month: Option<u8>,
    pub year: Option<i32>,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub json: bool,
    pub config: &'a PulseConfig,
}

pub fn run(params: &ReportParams<'_>) -> anyhow::Result<()> {
    let period = resolve_period(params)?;

    let source = input::open_source(params.input)?;
    let policy = params.config.batch_policy();
    let after = period.start.date().to_string();
    let before = period.end.date().to_string();
    let raws = input::fetch_window(&source, Some(&after), Some(&before), &policy)?;

    let batch = normalize_batch(&raws);
    let report = compose_report(period, &batch);

    if params.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn resolve_period(params: &ReportParams<'_>) -> anyhow::Result<Period> {
    if let (Some(month), Some(year)) = (params.month, params.year) {
        return Period::monthly(year, month);
    }
    if let (Some(from), Some(to)) = (params.from, params.to) {
        let start = PrimitiveDateTime::new(input::parse_date(from)?, Time::MIDNIGHT).assume_utc();
        let end = PrimitiveDateTime::new(
            input::parse_date(to)?,
            Time::from_hms(23, 59, 59).expect("23:59:59 is a valid time"),
        )
        .assume_utc();
        return Ok(Period::custom(start, end));
    }
    Ok(Period::weekly(
        OffsetDateTime::now_utc(),
        params.weeks.unwrap_or(1),
    ))
}

fn print_report(report: &Report) {
    println!(
        "Status report {} — {}",
        report.period.start.date(),
        report.period.end.date()
    );
    println!(
        "  {} changes, {} projects, {} teams ({} no-op, {} skipped)",
        report.total_changes,
        report.unique_projects,
        report.active_teams,
        report.noop_transitions,
        report.skipped_records
    );
    println!(
        "  stages: {} to do, {} in progress, {} complete",
        report.stage_distribution.to_do,
        report.stage_distribution.in_progress,
        report.stage_distribution.complete
    );

    if report.paths.is_empty() {
        println!("\nNo status changes in this period.");
        return;
    }

    println!("\nStatus paths:");
    for path in &report.paths {
        println!("  {:<30} {}", path.project_name, path.arrows());
    }

    for breakdown in &report.breakdowns {
        let label = match breakdown.dimension {
            Dimension::Team => "By team",
            Dimension::SubTeam => "By sub-team",
            Dimension::Platform => "By platform",
            Dimension::NewStatus => "By new status",
        };
        println!("\n{label}:");
        for bucket in &breakdown.buckets {
            match bucket.mean_days_in_status {
                Some(days) => println!(
                    "  {:<24} {:>4}  ({} projects, avg {:.1}d in status)",
                    bucket.key,
                    bucket.count,
                    bucket.projects.len(),
                    days
                ),
                None => println!(
                    "  {:<24} {:>4}  ({} projects)",
                    bucket.key,
                    bucket.count,
                    bucket.projects.len()
                ),
            }
        }
    }

    if !report.transition_counts.is_empty() {
        println!("\nTop transitions:");
        for t in report.transition_counts.iter().take(5) {
            println!("  {} → {}  ×{}", t.from, t.to, t.count);
        }
    }
}
