//! Per-item derivation shared by the scorers: execution-mode detection,
//! datakey/filter extraction from the raw payload, and the mapping grade.

use crate::model::{AgentType, ExecutionMode, Transcript};
use crate::similarity::contains_error_marker;
use serde_json::Value;
use std::collections::BTreeSet;

/// How well detected filters/datakeys match the expected ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingGrade {
    Exact,
    FullWithExtra,
    Partial,
    None,
    Unknown,
}

impl MappingGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingGrade::Exact => "exact",
            MappingGrade::FullWithExtra => "full_with_extra",
            MappingGrade::Partial => "partial",
            MappingGrade::None => "none",
            MappingGrade::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DerivedItem {
    pub execution_mode: ExecutionMode,
    pub process_count: usize,
    pub response_error_or_blank: bool,
    pub avg_response_sec: Option<f64>,
    pub detected_datakeys: Vec<String>,
    pub detected_filters: Vec<String>,
    pub mapping_grade: MappingGrade,
}

const PROCESS_KEYS: &[&str] = &["processes", "process_list", "workers", "executions"];
const DATAKEY_KEYS: &[&str] = &["dataKeys", "datakeys", "data_keys", "dataKey", "datakey"];
const URL_KEYS: &[&str] = &["url", "linkUrl", "link_url"];
const FILTER_KEYS: &[&str] = &["filters", "filterList", "filter_list"];
const LIST_KEYS: &[&str] = &["list", "items", "cards", "results"];

pub fn derive_item(t: &Transcript) -> DerivedItem {
    let first = t.first_response();
    let payload = first.and_then(|r| r.raw_payload.as_ref());

    let process_count = payload.map(count_processes).unwrap_or(0);
    let execution_mode = if process_count >= 2 {
        ExecutionMode::Multi
    } else {
        ExecutionMode::Single
    };

    let response_error_or_blank = t.error_text.as_deref().is_some_and(|e| !e.trim().is_empty())
        || t.responses.is_empty()
        || first.is_some_and(|r| {
            r.assistant_text.trim().is_empty() && r.raw_payload.is_none()
        })
        || first
            .and_then(|r| r.status_text.as_deref())
            .is_some_and(contains_error_marker);

    let timed: Vec<f64> = t
        .responses
        .iter()
        .filter_map(|r| r.response_time_sec)
        .collect();
    let avg_response_sec = if timed.is_empty() {
        None
    } else {
        Some(timed.iter().sum::<f64>() / timed.len() as f64)
    };

    let detected_datakeys = payload.map(collect_datakeys).unwrap_or_default();
    let detected_filters = payload.map(collect_filters).unwrap_or_default();

    let mapping_grade = match t.agent_type {
        AgentType::ApplicantManagement => {
            grade_sets(&t.expected.filters, &detected_filters)
        }
        _ => grade_sets(&t.expected.datakeys, &detected_datakeys),
    };

    DerivedItem {
        execution_mode,
        process_count,
        response_error_or_blank,
        avg_response_sec,
        detected_datakeys,
        detected_filters,
        mapping_grade,
    }
}

/// Set comparison of expected vs detected tokens, case-insensitive.
pub fn grade_sets(expected: &[String], detected: &[String]) -> MappingGrade {
    let exp: BTreeSet<String> = expected
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if exp.is_empty() {
        return MappingGrade::Unknown;
    }
    let det: BTreeSet<String> = detected
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if exp == det {
        MappingGrade::Exact
    } else if exp.is_subset(&det) {
        MappingGrade::FullWithExtra
    } else if exp.intersection(&det).next().is_some() {
        MappingGrade::Partial
    } else {
        MappingGrade::None
    }
}

/// Counts worker/execution-process entries anywhere in the payload.
fn count_processes(payload: &Value) -> usize {
    let mut count = 0;
    walk(payload, &mut |key, value| {
        if PROCESS_KEYS.contains(&key) {
            if let Some(arr) = value.as_array() {
                count += arr.len();
            }
        }
    });
    count
}

/// Datakeys live either in dedicated fields or as query parameters of a
/// link URL in the payload.
pub fn collect_datakeys(payload: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    walk(payload, &mut |key, value| {
        if DATAKEY_KEYS.contains(&key) {
            push_string_values(value, &mut keys);
        } else if URL_KEYS.contains(&key) {
            if let Some(url) = value.as_str() {
                keys.extend(datakeys_from_url(url));
            }
        }
    });
    dedup(keys)
}

pub fn collect_filters(payload: &Value) -> Vec<String> {
    let mut out = Vec::new();
    walk(payload, &mut |key, value| {
        if FILTER_KEYS.contains(&key) {
            if let Some(arr) = value.as_array() {
                for item in arr {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        Value::Object(o) => {
                            for name_key in ["name", "key", "label"] {
                                if let Some(s) = o.get(name_key).and_then(|v| v.as_str()) {
                                    out.push(s.to_string());
                                    break;
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    });
    dedup(out)
}

/// True when the payload carries a non-empty displayable list, which counts
/// as a delivered response even without an assistant message.
pub fn has_ui_list(payload: &Value) -> bool {
    let mut found = false;
    walk(payload, &mut |key, value| {
        if LIST_KEYS.contains(&key) && value.as_array().is_some_and(|a| !a.is_empty()) {
            found = true;
        }
    });
    found
}

fn datakeys_from_url(url: &str) -> Vec<String> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(k, _)| DATAKEY_KEYS.iter().any(|d| d.eq_ignore_ascii_case(k)))
        .flat_map(|(_, v)| v.split(',').map(str::to_string))
        .filter(|s| !s.is_empty())
        .collect()
}

fn push_string_values(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(arr) => {
            for item in arr {
                push_string_values(item, out);
            }
        }
        _ => {}
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(s.trim().to_lowercase()))
        .collect()
}

fn walk(value: &Value, visit: &mut impl FnMut(&str, &Value)) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                visit(k.as_str(), v);
                walk(v, visit);
            }
        }
        Value::Array(arr) => {
            for v in arr {
                walk(v, visit);
            }
        }
        _ => {}
    }
}
