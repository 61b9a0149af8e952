use crate::config::PulseConfig;
use crate::input;
use pulse_core::normalize::normalize_batch;
use std::path::Path;

pub fn run(input_path: Option<&Path>, config: &PulseConfig) -> anyhow::Result<()> {
    println!("pulse {}", env!("CARGO_PKG_VERSION"));
    println!("  retention_months:      {}", config.retention_months);
    println!("  rate_limit_batch_size: {}", config.rate_limit_batch_size);
    println!("  rate_limit_delay_ms:   {}", config.rate_limit_delay_ms);
    println!("  context_ttl_seconds:   {}", config.context_ttl_seconds);

    if let Some(path) = input_path {
        let source = input::open_source(path)?;
        let raws = input::fetch_window(&source, None, None, &config.batch_policy())?;
        let batch = normalize_batch(&raws);
        println!(
            "  input:                 {} ({} records, {} rejected)",
            path.display(),
            batch.records.len(),
            batch.rejects.len()
        );
    }

    println!("ok");
    Ok(())
}
