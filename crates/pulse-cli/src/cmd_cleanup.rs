use crate::config::PulseConfig;
use crate::input;
use pulse_core::normalize::normalize_batch;
use pulse_core::retention::{cutoff, is_expired, CleanupPlan};
use pulse_store::EventSource;
use std::path::Path;
use time::OffsetDateTime;

pub fn run(
    input_path: &Path,
    date: Option<&str>,
    execute: bool,
    config: &PulseConfig,
) -> anyhow::Result<()> {
    let reference = match date {
        Some(s) => input::parse_date(s)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let boundary = cutoff(reference, &config.retention_policy());

    let source = input::open_source(input_path)?;
    let policy = config.batch_policy();
    let raws = input::fetch_window(&source, None, None, &policy)?;
    let batch = normalize_batch(&raws);

    let plan = CleanupPlan::from_records(&batch.records, boundary);
    println!("{}", serde_json::to_string_pretty(&plan)?);

    if !execute {
        println!("\nDry run: {} records would be archived.", plan.expired);
        return Ok(());
    }

    let mut archived = 0usize;
    let mut failed = 0usize;
    for (i, record) in batch
        .records
        .iter()
        .filter(|r| is_expired(r, boundary))
        .enumerate()
    {
        // Pace archive calls the same way fetches are paced.
        if i > 0 && i % policy.batch_size == 0 {
            std::thread::sleep(policy.delay);
        }
        match &record.record_id {
            Some(id) => match source.archive(id) {
                Ok(()) => archived += 1,
                Err(err) => {
                    eprintln!("failed to archive {id}: {err}");
                    failed += 1;
                }
            },
            None => failed += 1,
        }
    }
    println!("\nArchived {archived} records ({failed} failed).");
    Ok(())
}
