use pulse_core::{Platform, Status, StatusChangeRecord};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Record schema members a predicate leaf may address. A closed enum, so
/// a deserialized predicate can never reference a field outside the
/// schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProjectId,
    ProjectName,
    Team,
    SubTeam,
    Platform,
    Version,
    ReleaseType,
    PreviousStatus,
    NewStatus,
    ChangedBy,
    Source,
    OccurredAt,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    #[error("range filter only applies to `occurred_at`, got `{0:?}`")]
    RangeOnNonDateField(Field),
    #[error("range has from > to")]
    InvertedRange,
    #[error("equality filter cannot target `occurred_at`; use a range")]
    EqualsOnDateField,
}

/// Composable, serializable filter tree evaluated against the in-memory
/// record set. `Nothing` is the no-match sentinel the compiler returns
/// for unrecognized intents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterPredicate {
    Equals {
        field: Field,
        value: String,
    },
    Range {
        field: Field,
        #[serde(default, with = "time::serde::rfc3339::option")]
        from: Option<OffsetDateTime>,
        #[serde(default, with = "time::serde::rfc3339::option")]
        to: Option<OffsetDateTime>,
    },
    And {
        children: Vec<FilterPredicate>,
    },
    Or {
        children: Vec<FilterPredicate>,
    },
    Nothing,
}

impl FilterPredicate {
    pub fn equals(field: Field, value: impl Into<String>) -> FilterPredicate {
        FilterPredicate::Equals {
            field,
            value: value.into(),
        }
    }

    /// Structural validation: ranges only on the date field and ordered
    /// when both bounds are present.
    pub fn validate(&self) -> Result<(), PredicateError> {
        match self {
            FilterPredicate::Equals { field, .. } => {
                if *field == Field::OccurredAt {
                    return Err(PredicateError::EqualsOnDateField);
                }
                Ok(())
            }
            FilterPredicate::Range { field, from, to } => {
                if *field != Field::OccurredAt {
                    return Err(PredicateError::RangeOnNonDateField(*field));
                }
                if let (Some(from), Some(to)) = (from, to) {
                    if from > to {
                        return Err(PredicateError::InvertedRange);
                    }
                }
                Ok(())
            }
            FilterPredicate::And { children } | FilterPredicate::Or { children } => {
                children.iter().try_for_each(FilterPredicate::validate)
            }
            FilterPredicate::Nothing => Ok(()),
        }
    }

    /// Recursive matcher. `Equals` is exact (statuses and platforms are
    /// compared through their parsed form, so alias spellings agree),
    /// `Range` is inclusive with open absent bounds, `And`/`Or`
    /// short-circuit, `Nothing` matches nothing.
    pub fn matches(&self, record: &StatusChangeRecord) -> bool {
        match self {
            FilterPredicate::Equals { field, value } => equals_match(record, *field, value),
            // A range on anything but the date field is invalid; match
            // nothing rather than quietly filtering by date.
            FilterPredicate::Range { field, from, to } => {
                *field == Field::OccurredAt
                    && from.map_or(true, |f| record.occurred_at >= f)
                    && to.map_or(true, |t| record.occurred_at <= t)
            }
            FilterPredicate::And { children } => children.iter().all(|c| c.matches(record)),
            FilterPredicate::Or { children } => children.iter().any(|c| c.matches(record)),
            FilterPredicate::Nothing => false,
        }
    }
}

fn equals_match(record: &StatusChangeRecord, field: Field, value: &str) -> bool {
    match field {
        Field::ProjectId => record.project_id == value,
        Field::ProjectName => record.project_name == value,
        Field::Team => record.team.as_deref() == Some(value),
        Field::SubTeam => record.sub_team.as_deref() == Some(value),
        Field::Platform => record.platform.as_ref() == Some(&Platform::from(value)),
        Field::Version => record.version.as_deref() == Some(value),
        Field::ReleaseType => record.release_type.as_deref() == Some(value),
        Field::PreviousStatus => record.previous_status == Status::from(value),
        Field::NewStatus => record.new_status == Status::from(value),
        Field::ChangedBy => record.changed_by.iter().any(|u| u == value),
        Field::Source => record.source.as_deref() == Some(value),
        // Day-granular equality on a timestamp is a range concern.
        Field::OccurredAt => false,
    }
}

/// Evaluate a predicate over the record set. An empty result is a valid
/// answer, distinguished from failure by construction.
pub fn evaluate<'a>(
    predicate: &FilterPredicate,
    records: &'a [StatusChangeRecord],
) -> Vec<&'a StatusChangeRecord> {
    records.iter().filter(|r| predicate.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(project: &str, prev: &str, new: &str) -> StatusChangeRecord {
        StatusChangeRecord {
            record_id: None,
            project_id: project.to_string(),
            project_name: project.to_string(),
            team: Some("AMZ Growth Team".to_string()),
            sub_team: None,
            platform: Some(Platform::Ios),
            version: None,
            release_type: None,
            previous_status: Status::from(prev),
            new_status: Status::from(new),
            changed_by: vec!["maria".to_string()],
            note: None,
            occurred_at: datetime!(2025-08-05 10:00 UTC),
            source: None,
        }
    }

    #[test]
    fn equals_matches_exactly() {
        let r = record("x", "QA", "LIVE");
        assert!(FilterPredicate::equals(Field::Team, "AMZ Growth Team").matches(&r));
        assert!(!FilterPredicate::equals(Field::Team, "Tools Team").matches(&r));
    }

    #[test]
    fn platform_equality_accepts_aliases() {
        let r = record("x", "QA", "LIVE");
        assert!(FilterPredicate::equals(Field::Platform, "ios").matches(&r));
        assert!(FilterPredicate::equals(Field::Platform, "iOS").matches(&r));
        assert!(!FilterPredicate::equals(Field::Platform, "amazon").matches(&r));
    }

    #[test]
    fn range_is_inclusive_and_open_when_bound_absent() {
        let r = record("x", "QA", "LIVE");
        let inclusive = FilterPredicate::Range {
            field: Field::OccurredAt,
            from: Some(datetime!(2025-08-05 10:00 UTC)),
            to: Some(datetime!(2025-08-05 10:00 UTC)),
        };
        assert!(inclusive.matches(&r));

        let open_end = FilterPredicate::Range {
            field: Field::OccurredAt,
            from: Some(datetime!(2025-08-01 00:00 UTC)),
            to: None,
        };
        assert!(open_end.matches(&r));

        let before = FilterPredicate::Range {
            field: Field::OccurredAt,
            from: None,
            to: Some(datetime!(2025-08-04 00:00 UTC)),
        };
        assert!(!before.matches(&r));
    }

    #[test]
    fn and_or_compose() {
        let r = record("x", "QA", "LIVE");
        let and = FilterPredicate::And {
            children: vec![
                FilterPredicate::equals(Field::PreviousStatus, "QA"),
                FilterPredicate::equals(Field::NewStatus, "LIVE"),
            ],
        };
        assert!(and.matches(&r));

        let or = FilterPredicate::Or {
            children: vec![
                FilterPredicate::equals(Field::NewStatus, "BLOCKED"),
                FilterPredicate::equals(Field::NewStatus, "LIVE"),
            ],
        };
        assert!(or.matches(&r));
    }

    #[test]
    fn nothing_matches_nothing() {
        let r = record("x", "QA", "LIVE");
        assert!(!FilterPredicate::Nothing.matches(&r));
    }

    #[test]
    fn changed_by_matches_any_member() {
        let r = record("x", "QA", "LIVE");
        assert!(FilterPredicate::equals(Field::ChangedBy, "maria").matches(&r));
        assert!(!FilterPredicate::equals(Field::ChangedBy, "alex").matches(&r));
    }

    #[test]
    fn validate_rejects_range_on_non_date_field() {
        let bad = FilterPredicate::Range {
            field: Field::Team,
            from: None,
            to: None,
        };
        assert_eq!(
            bad.validate(),
            Err(PredicateError::RangeOnNonDateField(Field::Team))
        );
    }

    #[test]
    fn range_on_non_date_field_matches_nothing() {
        let r = record("x", "QA", "LIVE");
        let bad = FilterPredicate::Range {
            field: Field::Team,
            from: Some(datetime!(2025-08-01 00:00 UTC)),
            to: Some(datetime!(2025-08-31 00:00 UTC)),
        };
        assert!(!bad.matches(&r));
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let bad = FilterPredicate::Range {
            field: Field::OccurredAt,
            from: Some(datetime!(2025-08-05 00:00 UTC)),
            to: Some(datetime!(2025-08-01 00:00 UTC)),
        };
        assert_eq!(bad.validate(), Err(PredicateError::InvertedRange));
    }

    #[test]
    fn validate_recurses_into_children() {
        let bad = FilterPredicate::And {
            children: vec![
                FilterPredicate::equals(Field::Team, "Tools Team"),
                FilterPredicate::Range {
                    field: Field::Platform,
                    from: None,
                    to: None,
                },
            ],
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn evaluate_returns_empty_for_no_matches() {
        let records = vec![record("x", "QA", "LIVE")];
        let hits = evaluate(
            &FilterPredicate::equals(Field::NewStatus, "BLOCKED"),
            &records,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn predicate_serde_round_trips() {
        let p = FilterPredicate::And {
            children: vec![
                FilterPredicate::equals(Field::Team, "AMZ Growth Team"),
                FilterPredicate::equals(Field::Platform, "iOS"),
            ],
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: FilterPredicate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
