//! Pre-execution feasibility report. Inspects a batch before any scoring
//! and separates blocking data problems from quality degradations.

use crate::model::Transcript;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Blocking,
    Quality,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecheckFinding {
    pub check: String,
    pub status: CheckStatus,
    pub detail: String,
    pub impact: Impact,
}

impl PrecheckFinding {
    fn new(check: &str, status: CheckStatus, detail: String, impact: Impact) -> Self {
        PrecheckFinding {
            check: check.to_string(),
            status,
            detail,
            impact,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecheckSummary {
    pub generated_at: String,
    pub total_items: usize,
    /// True when any blocking finding failed. Callers must refuse to score
    /// unless explicitly forced.
    pub hard_fail: bool,
    pub response_coverage_pct: f64,
    pub consistency_ready_pct: f64,
    pub speed_ready_pct: f64,
    pub condition_ready_pct: f64,
    pub ttft_ready_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecheckReport {
    pub summary: PrecheckSummary,
    pub findings: Vec<PrecheckFinding>,
}

fn pct(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (hits as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

pub fn run_precheck(items: &[Transcript], consistency_min_runs: usize) -> PrecheckReport {
    let mut findings = Vec::new();
    let total = items.len();

    if total == 0 {
        findings.push(PrecheckFinding::new(
            "input_rows",
            CheckStatus::Fail,
            "input batch is empty".into(),
            Impact::Blocking,
        ));
        return PrecheckReport {
            summary: PrecheckSummary {
                generated_at: Utc::now().to_rfc3339(),
                total_items: 0,
                hard_fail: true,
                response_coverage_pct: 0.0,
                consistency_ready_pct: 0.0,
                speed_ready_pct: 0.0,
                condition_ready_pct: 0.0,
                ttft_ready_pct: 0.0,
            },
            findings,
        };
    }
    findings.push(PrecheckFinding::new(
        "input_rows",
        CheckStatus::Pass,
        format!("{} item(s)", total),
        Impact::Blocking,
    ));

    // Query identity: every scoreable row needs a query text.
    let with_text = items.iter().filter(|t| !t.query_text.trim().is_empty()).count();
    let with_id = items.iter().filter(|t| !t.query_id.trim().is_empty()).count();
    if with_text == 0 {
        findings.push(PrecheckFinding::new(
            "query_text",
            CheckStatus::Fail,
            "no item carries a query text".into(),
            Impact::Blocking,
        ));
    } else if with_text < total || with_id < total {
        findings.push(PrecheckFinding::new(
            "query_text",
            CheckStatus::Warn,
            format!(
                "{}/{} items have query text, {}/{} have an identifier",
                with_text, total, with_id, total
            ),
            Impact::Quality,
        ));
    } else {
        findings.push(PrecheckFinding::new(
            "query_text",
            CheckStatus::Pass,
            "query id and text present on all items".into(),
            Impact::Blocking,
        ));
    }

    // Response shape: at least one item must carry a response at all.
    let with_any_response = items.iter().filter(|t| !t.responses.is_empty()).count();
    if with_any_response == 0 {
        findings.push(PrecheckFinding::new(
            "response_shape",
            CheckStatus::Fail,
            "no item carries any recorded response".into(),
            Impact::Blocking,
        ));
    } else {
        findings.push(PrecheckFinding::new(
            "response_shape",
            CheckStatus::Pass,
            format!("{}/{} items carry responses", with_any_response, total),
            Impact::Blocking,
        ));
    }

    // Response coverage: rows with at least one non-blank response.
    let covered = items
        .iter()
        .filter(|t| {
            t.responses.iter().any(|r| {
                !r.assistant_text.trim().is_empty() || r.raw_payload.is_some()
            })
        })
        .count();
    let coverage = pct(covered, total);
    findings.push(PrecheckFinding::new(
        "response_coverage",
        if coverage >= 95.0 {
            CheckStatus::Pass
        } else if coverage >= 70.0 {
            CheckStatus::Warn
        } else {
            CheckStatus::Fail
        },
        format!("{:.1}% of items have a non-blank response", coverage),
        Impact::Quality,
    ));

    // Consistency readiness: enough repeated runs per item. Never blocking;
    // scoring degrades through the two-run proxy.
    let ready = items
        .iter()
        .filter(|t| t.responses.len() >= consistency_min_runs)
        .count();
    let consistency = pct(ready, total);
    findings.push(PrecheckFinding::new(
        "consistency_runs",
        if consistency >= 80.0 {
            CheckStatus::Pass
        } else {
            CheckStatus::Warn
        },
        format!(
            "{:.1}% of items have >= {} repeated responses",
            consistency, consistency_min_runs
        ),
        Impact::Quality,
    ));

    // Speed data readiness.
    let timed = items
        .iter()
        .filter(|t| t.responses.iter().any(|r| r.response_time_sec.is_some()))
        .count();
    let speed = pct(timed, total);
    findings.push(PrecheckFinding::new(
        "speed_data",
        if speed >= 90.0 { CheckStatus::Pass } else { CheckStatus::Warn },
        format!("{:.1}% of items carry response timings", speed),
        Impact::Quality,
    ));

    // Condition/ground-truth readiness.
    let conditioned = items
        .iter()
        .filter(|t| {
            !t.expected.filters.is_empty()
                || !t.expected.datakeys.is_empty()
                || t.expected.ground_truth.is_some()
                || !t.expected.checks.is_empty()
        })
        .count();
    let conditions = pct(conditioned, total);
    findings.push(PrecheckFinding::new(
        "expected_conditions",
        if conditions >= 90.0 { CheckStatus::Pass } else { CheckStatus::Warn },
        format!("{:.1}% of items carry expected conditions", conditions),
        Impact::Quality,
    ));

    // TTFT measurement readiness. Informational only.
    let ttft = pct(items.iter().filter(|t| t.ttft_sec.is_some()).count(), total);
    findings.push(PrecheckFinding::new(
        "ttft_measured",
        if ttft >= 90.0 { CheckStatus::Pass } else { CheckStatus::Warn },
        format!("{:.1}% of items carry a TTFT measurement", ttft),
        Impact::Info,
    ));

    let hard_fail = findings
        .iter()
        .any(|f| f.impact == Impact::Blocking && f.status == CheckStatus::Fail);

    PrecheckReport {
        summary: PrecheckSummary {
            generated_at: Utc::now().to_rfc3339(),
            total_items: total,
            hard_fail,
            response_coverage_pct: coverage,
            consistency_ready_pct: consistency,
            speed_ready_pct: speed,
            condition_ready_pct: conditions,
            ttft_ready_pct: ttft,
        },
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResponseRecord;
    use serde_json::json;

    fn item(text: &str, responses: usize) -> Transcript {
        Transcript {
            query_id: "q".into(),
            query_text: text.into(),
            responses: (0..responses)
                .map(|_| ResponseRecord {
                    raw_payload: Some(json!({})),
                    assistant_text: "ok".into(),
                    response_time_sec: Some(2.0),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_batch_hard_fails() {
        let report = run_precheck(&[], 3);
        assert!(report.summary.hard_fail);
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn missing_query_text_everywhere_blocks() {
        let report = run_precheck(&[item("", 3), item("", 3)], 3);
        assert!(report.summary.hard_fail);
        let f = report.findings.iter().find(|f| f.check == "query_text").unwrap();
        assert_eq!(f.status, CheckStatus::Fail);
        assert_eq!(f.impact, Impact::Blocking);
    }

    #[test]
    fn no_responses_anywhere_blocks() {
        let report = run_precheck(&[item("질문", 0)], 3);
        assert!(report.summary.hard_fail);
    }

    #[test]
    fn healthy_batch_passes() {
        let report = run_precheck(&[item("질문1", 3), item("질문2", 3)], 3);
        assert!(!report.summary.hard_fail);
        assert_eq!(report.summary.response_coverage_pct, 100.0);
        assert_eq!(report.summary.consistency_ready_pct, 100.0);
    }

    #[test]
    fn thin_consistency_warns_but_never_blocks() {
        let report = run_precheck(&[item("질문", 1)], 3);
        assert!(!report.summary.hard_fail);
        let f = report
            .findings
            .iter()
            .find(|f| f.check == "consistency_runs")
            .unwrap();
        assert_eq!(f.status, CheckStatus::Warn);
    }

    #[test]
    fn low_coverage_fails_without_blocking() {
        let mut items: Vec<Transcript> = (0..10).map(|_| item("질문", 1)).collect();
        for t in items.iter_mut().take(6) {
            t.responses = vec![ResponseRecord::default()];
        }
        let report = run_precheck(&items, 3);
        let f = report
            .findings
            .iter()
            .find(|f| f.check == "response_coverage")
            .unwrap();
        assert_eq!(f.status, CheckStatus::Fail);
        assert_eq!(f.impact, Impact::Quality);
        assert!(!report.summary.hard_fail);
    }
}
