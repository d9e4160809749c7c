use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::models::{Category, CompetitionSession, LiftType, Lifter};
use crate::{CompetitionError, Result};

/// The lifters of one session, as handed over by the registration desk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub session: CompetitionSession,
    /// Bodyweight categories used to place weighed-in lifters without one.
    #[serde(default)]
    pub categories: Vec<Category>,
    pub lifters: Vec<Lifter>,
}

impl Roster {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut roster: Roster = serde_json::from_str(json)?;
        for lifter in roster.lifters.iter_mut() {
            if lifter.session.is_none() {
                lifter.session = Some(roster.session.clone());
            }
            if lifter.category.is_none() {
                lifter.category = lifter
                    .body_weight
                    .and_then(|bw| Category::for_body_weight(&roster.categories, lifter.gender, bw))
                    .cloned();
            }
        }
        Ok(roster)
    }
}

pub struct RosterValidator;

impl RosterValidator {
    pub fn validate(roster: &Roster) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        if roster.session.name.is_empty() {
            report.errors.push("Session name is required".to_string());
        }
        if roster.lifters.is_empty() {
            report
                .warnings
                .push(format!("Session '{}' has no lifters", roster.session.name));
        }

        let mut ids = HashSet::new();
        let mut lots = HashSet::new();
        for (idx, lifter) in roster.lifters.iter().enumerate() {
            let label = format!("{}. {} {}", idx + 1, lifter.first_name, lifter.last_name);

            if lifter.first_name.is_empty() || lifter.last_name.is_empty() {
                report
                    .errors
                    .push(format!("Lifter #{} has an empty name", idx + 1));
            }
            if !ids.insert(lifter.id) {
                report
                    .errors
                    .push(format!("Lifter '{}' has a duplicate id {}", label, lifter.id));
            }
            match lifter.lot_number {
                Some(lot) if !lots.insert(lot) => {
                    report
                        .errors
                        .push(format!("Lifter '{}' has duplicate lot number {}", label, lot));
                }
                Some(_) => {}
                None => report
                    .warnings
                    .push(format!("Lifter '{}' has no lot number", label)),
            }

            if lifter.body_weight.is_none() {
                report
                    .warnings
                    .push(format!("Lifter '{}' is missing body weight", label));
            }
            if lifter.category.is_none() && lifter.registration_category.is_none() {
                report
                    .warnings
                    .push(format!("Lifter '{}' has no category", label));
            }

            for (lift, opening) in [(LiftType::Snatch, 1), (LiftType::CleanJerk, 4)] {
                if lifter.attempt(opening).and_then(|s| s.requested_weight()).is_none() {
                    report.warnings.push(format!(
                        "Lifter '{}' has no opening {} declaration",
                        label,
                        lift.as_str()
                    ));
                }
            }

            for n in 1..=crate::models::TOTAL_ATTEMPTS {
                let Some(slot) = lifter.attempt(n) else {
                    continue;
                };
                let requests = [slot.declaration, slot.change1, slot.change2];
                if requests.iter().flatten().any(|w| *w <= 0) {
                    report.errors.push(format!(
                        "Lifter '{}', attempt {}: requested weight must be positive",
                        label, n
                    ));
                }
            }
        }

        if !report.errors.is_empty() {
            Err(CompetitionError::Validation(format!(
                "Validation failed with {} error(s): {}",
                report.errors.len(),
                report.errors.join("; ")
            )))
        } else {
            Ok(report)
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"{
        "session": { "name": "M1", "weigh_in_time": "2025-05-01T08:00:00", "platform": "A" },
        "lifters": [
            {
                "first_name": "Ana", "last_name": "Silva", "gender": "F",
                "body_weight": "63.45", "lot_number": 2,
                "snatch": [{ "declaration": 70 }, {}, {}],
                "clean_jerk": [{ "declaration": 90 }, {}, {}]
            },
            {
                "first_name": "Bea", "last_name": "Lund", "gender": "F",
                "lot_number": 1
            }
        ]
    }"#;

    #[test]
    fn test_parse_fills_session() {
        let roster = Roster::from_json(ROSTER).unwrap();
        assert_eq!(roster.lifters.len(), 2);
        assert_eq!(roster.lifters[0].next_attempt_requested_weight(), Some(70));
        assert_eq!(
            roster.lifters[1].session.as_ref().map(|s| s.name.as_str()),
            Some("M1")
        );
        assert_ne!(roster.lifters[0].id, roster.lifters[1].id);
    }

    #[test]
    fn test_warnings_for_missing_data() {
        let roster = Roster::from_json(ROSTER).unwrap();
        let report = RosterValidator::validate(&roster).unwrap();
        assert!(report.errors.is_empty());
        assert!(report.warnings.iter().any(|w| w.contains("Bea Lund' is missing body weight")));
    }

    #[test]
    fn test_missing_opening_declaration_is_reported() {
        let roster = Roster::from_json(ROSTER).unwrap();
        let report = RosterValidator::validate(&roster).unwrap();
        assert!(report
            .warnings
            .iter()
            .any(|w| w == "Lifter '2. Bea Lund' has no opening Clean & Jerk declaration"));
        assert!(!report.warnings.iter().any(|w| w.contains("Ana Silva' has no opening")));
    }

    #[test]
    fn test_category_filled_from_body_weight() {
        let json = r#"{
            "session": { "name": "W2", "weigh_in_time": null, "platform": null },
            "categories": [
                { "code": "W64", "gender": "F", "maximum_weight": "64" },
                { "code": "W59", "gender": "F", "maximum_weight": "59" },
                { "code": "M61", "gender": "M", "maximum_weight": "61" }
            ],
            "lifters": [
                { "first_name": "Ana", "last_name": "Silva", "gender": "female", "body_weight": "58.7" },
                { "first_name": "Bea", "last_name": "Lund", "gender": "F", "body_weight": "63.1",
                  "category": { "code": "W71", "gender": "F", "maximum_weight": "71" } },
                { "first_name": "Cy", "last_name": "Moe", "gender": "F" }
            ]
        }"#;
        let roster = Roster::from_json(json).unwrap();
        let codes: Vec<_> = roster
            .lifters
            .iter()
            .map(|l| l.category.as_ref().map(|c| c.code.as_str()))
            .collect();
        assert_eq!(codes, vec![Some("W59"), Some("W71"), None]);
        assert_eq!(roster.lifters[0].gender, crate::models::Gender::F);
    }

    #[test]
    fn test_duplicate_lot_is_an_error() {
        let mut roster = Roster::from_json(ROSTER).unwrap();
        roster.lifters[1].lot_number = Some(2);
        let err = RosterValidator::validate(&roster).unwrap_err();
        assert!(err.to_string().contains("duplicate lot number 2"));
    }
}
