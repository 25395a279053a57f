//! Numeric extraction/tolerance comparison and token-set text similarity.

use regex::Regex;
use std::sync::OnceLock;

const ERROR_MARKERS: &[&str] = &["error", "timeout", "실패", "오류", "http"];

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Integers/decimals, optional thousands separators, optional trailing %.
        Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?%?|\d+(?:\.\d+)?%?").unwrap()
    })
}

/// Scans text for numeric tokens. The percent sign is stripped, not
/// converted to a fraction.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    number_re()
        .find_iter(text)
        .filter_map(|m| {
            m.as_str()
                .replace(',', "")
                .trim_end_matches('%')
                .parse()
                .ok()
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericState {
    Exact,
    WithinTol,
    Mismatch,
    NoNumbers,
}

impl NumericState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericState::Exact => "exact",
            NumericState::WithinTol => "within_tol",
            NumericState::Mismatch => "mismatch",
            NumericState::NoNumbers => "no_numbers",
        }
    }
}

/// Compares numbers from both texts positionally (index 0..min(len)).
/// One side carrying numbers while the other has none is a mismatch.
pub fn numeric_pair_state(a: &str, b: &str, tolerance_pct: f64) -> NumericState {
    let na = extract_numbers(a);
    let nb = extract_numbers(b);

    if na.is_empty() && nb.is_empty() {
        return NumericState::NoNumbers;
    }
    if na.is_empty() || nb.is_empty() {
        return NumericState::Mismatch;
    }

    let pairs: Vec<(f64, f64)> = na.into_iter().zip(nb).collect();
    if pairs.iter().all(|(x, y)| x.to_bits() == y.to_bits()) {
        return NumericState::Exact;
    }

    let tol = tolerance_pct / 100.0;
    let within = pairs.iter().all(|(x, y)| {
        let denom = x.abs().max(y.abs()).max(f64::EPSILON);
        (x - y).abs() / denom <= tol
    });
    if within {
        NumericState::WithinTol
    } else {
        NumericState::Mismatch
    }
}

fn tokenize(text: &str) -> std::collections::HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Jaccard index over token sets. Both empty means identical (1.0); one
/// empty means nothing shared (0.0).
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    intersection as f64 / union as f64
}

pub fn contains_error_marker(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ERROR_MARKERS.iter().any(|m| lowered.contains(m))
}
