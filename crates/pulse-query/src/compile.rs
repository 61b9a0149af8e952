use crate::context::ConversationContext;
use crate::filter::{Field, FilterPredicate};
use crate::intent::Intent;
use pulse_core::StatusChangeRecord;
use serde::Serialize;

/// Output of the filter compiler: the predicate to evaluate, plus the
/// flag the caller turns into a clarification prompt instead of running
/// a query that matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compiled {
    pub predicate: FilterPredicate,
    pub needs_clarification: bool,
    /// True when the predicate was merged with the prior conversation
    /// filter rather than replacing it.
    pub refined: bool,
}

/// Map a structured intent to a filter predicate, deterministically, one
/// shape per intent kind.
///
/// Follow-up handling: an intent with no explicit time range is treated
/// as a refinement when a prior context filter exists, and is `And`ed
/// onto it — that is what makes "and what about iOS?" work after an
/// initial team question. An unrecognized intent compiles to the
/// no-match sentinel with `needs_clarification` set; the compiler never
/// guesses.
pub fn compile(intent: &Intent, prior: Option<&ConversationContext>) -> Compiled {
    if !intent.is_recognized() {
        return Compiled {
            predicate: FilterPredicate::Nothing,
            needs_clarification: true,
            refined: false,
        };
    }

    let fresh = predicate_for(intent);

    let prior_filter = prior.and_then(|ctx| ctx.last_filter.as_ref());
    match prior_filter {
        Some(last) if !intent.has_time_range() => Compiled {
            predicate: and_merge(last.clone(), fresh),
            needs_clarification: false,
            refined: true,
        },
        _ => Compiled {
            predicate: fresh,
            needs_clarification: false,
            refined: false,
        },
    }
}

fn predicate_for(intent: &Intent) -> FilterPredicate {
    match intent {
        Intent::TimeRange { from, to } => FilterPredicate::Range {
            field: Field::OccurredAt,
            from: *from,
            to: *to,
        },
        // A status question covers both sides of a transition: projects
        // that entered the status and projects that just left it.
        Intent::StatusIs { status } => FilterPredicate::Or {
            children: vec![
                FilterPredicate::equals(Field::NewStatus, status.clone()),
                FilterPredicate::equals(Field::PreviousStatus, status.clone()),
            ],
        },
        Intent::TeamIs { team } => FilterPredicate::equals(Field::Team, team.clone()),
        Intent::PlatformIs { platform } => {
            FilterPredicate::equals(Field::Platform, platform.clone())
        }
        Intent::Transition { from, to } => FilterPredicate::And {
            children: vec![
                FilterPredicate::equals(Field::PreviousStatus, from.clone()),
                FilterPredicate::equals(Field::NewStatus, to.clone()),
            ],
        },
        Intent::All { intents } => FilterPredicate::And {
            children: intents.iter().map(predicate_for).collect(),
        },
        Intent::Unrecognized => FilterPredicate::Nothing,
    }
}

/// Merge a refinement onto the prior filter. An existing top-level `And`
/// gains a child instead of nesting, keeping merged predicates flat
/// across repeated follow-ups.
fn and_merge(prior: FilterPredicate, fresh: FilterPredicate) -> FilterPredicate {
    match prior {
        FilterPredicate::And { mut children } => {
            children.push(fresh);
            FilterPredicate::And { children }
        }
        other => FilterPredicate::And {
            children: vec![other, fresh],
        },
    }
}

/// Compact result summary stored into the conversation context after a
/// successful query.
pub fn summarize(records: &[&StatusChangeRecord]) -> String {
    if records.is_empty() {
        return "no matching status changes".to_string();
    }
    let mut projects: Vec<&str> = records.iter().map(|r| r.project_name.as_str()).collect();
    projects.sort_unstable();
    projects.dedup();
    let earliest = records.iter().map(|r| r.occurred_at).min();
    let latest = records.iter().map(|r| r.occurred_at).max();
    match (earliest, latest) {
        (Some(a), Some(b)) => format!(
            "{} changes across {} projects between {} and {}",
            records.len(),
            projects.len(),
            a.date(),
            b.date()
        ),
        _ => format!("{} changes across {} projects", records.len(), projects.len()),
    }
}
