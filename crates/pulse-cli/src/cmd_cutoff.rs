use crate::config::PulseConfig;
use crate::input;
use pulse_core::retention::{cutoff, RetentionPolicy};
use time::OffsetDateTime;

pub fn run(date: Option<&str>, months: Option<u32>, config: &PulseConfig) -> anyhow::Result<()> {
    let reference = match date {
        Some(s) => input::parse_date(s)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let policy = RetentionPolicy {
        retention_months: months.unwrap_or(config.retention_months),
    };
    let boundary = cutoff(reference, &policy);
    println!("{boundary}");
    Ok(())
}
