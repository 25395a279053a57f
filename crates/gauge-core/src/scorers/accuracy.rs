//! Factual/condition accuracy. Declarative checks take precedence when they
//! produce an opinion; otherwise the rule family is picked by agent type.

use crate::model::{AgentType, MetricScore, Transcript};
use crate::pathquery::evaluate_checks;
use crate::scorers::derive::{DerivedItem, MappingGrade};
use crate::similarity::{numeric_pair_state, NumericState};
use serde_json::Value;

pub fn score_accuracy(t: &Transcript, d: &DerivedItem, tolerance_pct: f64) -> MetricScore {
    if !t.expected.checks.is_empty() {
        let payload = t
            .first_response()
            .and_then(|r| r.raw_payload.as_ref())
            .cloned()
            .unwrap_or(Value::Null);
        let report = evaluate_checks(&payload, &t.expected.checks);
        if let Some(score) = report.score {
            let reason = if report.failed.is_empty() {
                format!("all checks passed (ratio {:.2})", report.pass_ratio)
            } else {
                let failed: Vec<String> = report
                    .failed
                    .iter()
                    .map(|f| format!("{} {}", f.path, f.op.as_str()))
                    .collect();
                format!(
                    "checks pass ratio {:.2}; failed: {}",
                    report.pass_ratio,
                    failed.join(", ")
                )
            };
            return MetricScore::rule(score as f64, reason);
        }
    }

    match t.agent_type {
        AgentType::ApplicantManagement => score_applicant(t, d, tolerance_pct),
        _ => score_datakeys(t, d),
    }
}

/// Expected datakeys vs the set detected in the response URL/raw JSON.
fn score_datakeys(t: &Transcript, d: &DerivedItem) -> MetricScore {
    if t.expected.datakeys.is_empty() {
        return MetricScore::rule(0.0, "no expected datakeys known");
    }
    match d.mapping_grade {
        MappingGrade::Exact => MetricScore::rule(
            5.0,
            format!("datakeys exact match: {}", t.expected.datakeys.join(", ")),
        ),
        MappingGrade::FullWithExtra => MetricScore::rule(
            3.0,
            format!(
                "all expected datakeys present with extras (detected {})",
                d.detected_datakeys.join(", ")
            ),
        ),
        _ => {
            let missing: Vec<&str> = t
                .expected
                .datakeys
                .iter()
                .filter(|k| {
                    !d.detected_datakeys
                        .iter()
                        .any(|x| x.eq_ignore_ascii_case(k))
                })
                .map(|s| s.as_str())
                .collect();
            MetricScore::rule(0.0, format!("missing datakeys: {}", missing.join(", ")))
        }
    }
}

/// Filter-match grade combined with numeric ground-truth comparison against
/// the first response.
fn score_applicant(t: &Transcript, d: &DerivedItem, tolerance_pct: f64) -> MetricScore {
    let grade = d.mapping_grade;
    let first_text = t
        .first_response()
        .map(|r| r.assistant_text.as_str())
        .unwrap_or("");

    let Some(truth) = t.expected.ground_truth.as_deref().filter(|s| !s.trim().is_empty()) else {
        // No ground truth: the filter grade alone decides.
        let (value, label) = match grade {
            MappingGrade::Exact => (4.0, "filters exact"),
            MappingGrade::FullWithExtra => (3.0, "filters matched with extras"),
            MappingGrade::Partial => (1.0, "filters partially matched"),
            _ => (0.0, "filters unmatched"),
        };
        return MetricScore::rule(value, format!("{} (no ground truth)", label));
    };

    let state = numeric_pair_state(truth, first_text, tolerance_pct);
    let strong = matches!(grade, MappingGrade::Exact | MappingGrade::FullWithExtra);

    let value = match (grade, state) {
        (_, NumericState::Exact) if strong => 5.0,
        (_, NumericState::WithinTol) if strong => 4.0,
        (MappingGrade::Partial | MappingGrade::None, NumericState::Exact)
        | (MappingGrade::Partial | MappingGrade::None, NumericState::WithinTol) => 3.0,
        (_, NumericState::Mismatch) if strong => 2.0,
        (MappingGrade::Partial, NumericState::Mismatch) => 1.0,
        (_, NumericState::NoNumbers) if strong => {
            // Ground truth holds no numbers; fall back to the grade alone.
            if grade == MappingGrade::Exact {
                4.0
            } else {
                3.0
            }
        }
        _ => 0.0,
    };

    MetricScore::rule(
        value,
        format!("filter grade {}, numbers {}", grade.as_str(), state.as_str()),
    )
}
