//! Declarative check language over an untyped JSON response payload.
//!
//! Paths are dot-separated segments; each segment may carry bracket tokens,
//! either a non-negative index (`[2]`) or the wildcard (`[*]`). Traversal is
//! breadth-preserving: a wildcard flattens every list element across all
//! current candidates, an index selects per candidate, and an out-of-range
//! index silently drops that branch.

use crate::model::{AccuracyCheck, CheckOp};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct FailedCheck {
    pub path: String,
    pub op: CheckOp,
    pub expected: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    /// `None` when no valid checks were supplied; the caller decides a
    /// fallback.
    pub score: Option<u8>,
    pub pass_ratio: f64,
    pub failed: Vec<FailedCheck>,
}

enum BracketToken {
    Index(usize),
    Wildcard,
}

fn parse_segment(seg: &str) -> Option<(&str, Vec<BracketToken>)> {
    let name_end = seg.find('[').unwrap_or(seg.len());
    let name = &seg[..name_end];
    let mut tokens = Vec::new();
    let mut rest = &seg[name_end..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = rest.find(']')?;
        let inner = &rest[1..close];
        if inner == "*" {
            tokens.push(BracketToken::Wildcard);
        } else {
            tokens.push(BracketToken::Index(inner.parse().ok()?));
        }
        rest = &rest[close + 1..];
    }
    Some((name, tokens))
}

/// Extracts every value the path reaches. Missing segments never error;
/// they just drop candidates.
pub fn extract_path_values<'a>(payload: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut candidates: Vec<&Value> = vec![payload];
    for seg in path.split('.') {
        let Some((name, tokens)) = parse_segment(seg) else {
            return Vec::new();
        };
        if !name.is_empty() {
            candidates = candidates
                .iter()
                .filter_map(|v| v.as_object().and_then(|o| o.get(name)))
                .collect();
        }
        for token in tokens {
            match token {
                BracketToken::Wildcard => {
                    candidates = candidates
                        .iter()
                        .filter_map(|v| v.as_array())
                        .flatten()
                        .collect();
                }
                BracketToken::Index(n) => {
                    candidates = candidates
                        .iter()
                        .filter_map(|v| v.as_array().and_then(|a| a.get(n)))
                        .collect();
                }
            }
        }
        if candidates.is_empty() {
            break;
        }
    }
    candidates
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Numeric-aware, then boolean-aware, then trimmed-string equality.
fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return (x - y).abs() < 1e-9;
    }
    if let (Some(x), Some(y)) = (a.as_bool(), b.as_bool()) {
        return x == y;
    }
    stringify(a).trim() == stringify(b).trim()
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

fn satisfies(value: &Value, op: CheckOp, expected: Option<&Value>) -> bool {
    match op {
        CheckOp::Exists => is_present(value),
        CheckOp::Eq => expected.is_some_and(|e| loose_eq(value, e)),
        CheckOp::Contains => {
            let Some(e) = expected else { return false };
            if let Some(list) = value.as_array() {
                list.iter().any(|item| loose_eq(item, e))
            } else {
                stringify(value).contains(&stringify(e))
            }
        }
        CheckOp::In => expected
            .and_then(|e| e.as_array())
            .is_some_and(|list| list.iter().any(|item| loose_eq(value, item))),
        CheckOp::Regex => {
            let Some(pattern) = expected.and_then(|e| e.as_str()) else {
                return false;
            };
            // A malformed pattern is a failed check, never an error.
            match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(&stringify(value)),
                Err(_) => false,
            }
        }
    }
}

/// Evaluates all valid checks, accumulating weighted partial credit.
pub fn evaluate_checks(payload: &Value, checks: &[AccuracyCheck]) -> CheckReport {
    let valid: Vec<&AccuracyCheck> = checks
        .iter()
        .filter(|c| !c.path.trim().is_empty())
        .collect();
    if valid.is_empty() {
        return CheckReport {
            score: None,
            pass_ratio: 0.0,
            failed: Vec::new(),
        };
    }

    let mut total_weight = 0.0;
    let mut passed_weight = 0.0;
    let mut failed = Vec::new();

    for check in valid {
        let weight = if check.weight > 0.0 { check.weight } else { 1.0 };
        total_weight += weight;

        let values = extract_path_values(payload, &check.path);
        let passed = values
            .iter()
            .any(|v| satisfies(v, check.op, check.value.as_ref()));
        if passed {
            passed_weight += weight;
        } else {
            failed.push(FailedCheck {
                path: check.path.clone(),
                op: check.op,
                expected: check.value.clone(),
            });
        }
    }

    let pass_ratio = passed_weight / total_weight;
    CheckReport {
        score: Some(ratio_to_score(pass_ratio)),
        pass_ratio,
        failed,
    }
}

pub fn ratio_to_score(ratio: f64) -> u8 {
    if ratio >= 1.0 {
        5
    } else if ratio >= 0.75 {
        4
    } else if ratio >= 0.5 {
        3
    } else if ratio >= 0.25 {
        2
    } else if ratio > 0.0 {
        1
    } else {
        0
    }
}
