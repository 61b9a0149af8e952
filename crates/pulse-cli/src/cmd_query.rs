use crate::config::PulseConfig;
use crate::input;
use anyhow::Context;
use pulse_core::normalize::normalize_batch;
use pulse_query::{compile, evaluate, summarize, ContextStore, ConversationContext, Intent};
use std::path::Path;

pub fn run(
    input_path: &Path,
    intent_json: &str,
    conversation: &str,
    context_path: Option<&Path>,
    json: bool,
    config: &PulseConfig,
) -> anyhow::Result<()> {
    let intent: Intent =
        serde_json::from_str(intent_json).context("intent must be valid intent JSON")?;

    // Restore prior conversation state, if any. The context file is how
    // a short-lived CLI process keeps follow-up questions working.
    let store = ContextStore::new();
    if let Some(path) = context_path {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let prior: ConversationContext =
                serde_json::from_str(&content).context("corrupt conversation context file")?;
            store.restore(prior);
        }
    }
    let prior = store.get(conversation, config.context_ttl());

    let compiled = compile(&intent, prior.as_ref());
    if compiled.needs_clarification {
        println!("I could not map that question to a filter. Try a team, platform, status, transition, or time range.");
        return Ok(());
    }
    compiled.predicate.validate()?;

    let source = input::open_source(input_path)?;
    let raws = input::fetch_window(&source, None, None, &config.batch_policy())?;
    let batch = normalize_batch(&raws);
    let hits = evaluate(&compiled.predicate, &batch.records);
    let summary = summarize(&hits);

    if json {
        for record in &hits {
            println!("{}", serde_json::to_string(record)?);
        }
    } else {
        if compiled.refined {
            println!("(refining previous question)");
        }
        for record in &hits {
            println!(
                "[{}] {:<30} {} → {}",
                record.occurred_at.date(),
                record.project_name,
                record.previous_status,
                record.new_status
            );
        }
        println!("\n{summary}");
    }

    store.update(conversation, Some(compiled.predicate), &summary);
    if let Some(path) = context_path {
        let updated = store
            .get(conversation, config.context_ttl())
            .context("context disappeared between update and save")?;
        std::fs::write(path, serde_json::to_string_pretty(&updated)?)?;
    }
    Ok(())
}
