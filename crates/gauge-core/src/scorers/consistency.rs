//! Cross-run consistency over repeated responses to the same query.

use crate::config::UnderMinPolicy;
use crate::model::{MetricScore, Transcript};
use crate::similarity::{numeric_pair_state, text_similarity, NumericState};
use crate::thresholds::RuleTables;

#[derive(Debug, Clone, Copy)]
struct PairVerdict {
    same_conclusion: bool,
    numbers: NumericState,
}

fn compare_pair(a: &str, b: &str, tables: &RuleTables, tolerance_pct: f64) -> PairVerdict {
    PairVerdict {
        same_conclusion: text_similarity(a, b) >= tables.same_conclusion_sim,
        numbers: numeric_pair_state(a, b, tolerance_pct),
    }
}

pub fn score_consistency(
    t: &Transcript,
    tables: &RuleTables,
    tolerance_pct: f64,
    min_runs: usize,
    policy: UnderMinPolicy,
) -> MetricScore {
    let texts: Vec<&str> = t.responses.iter().map(|r| r.assistant_text.as_str()).collect();

    if texts.len() >= 3 {
        return score_three_runs(&texts, tables, tolerance_pct);
    }

    if texts.len() == 2 && policy == UnderMinPolicy::TwoRunProxy {
        let v = compare_pair(texts[0], texts[1], tables, tolerance_pct);
        let (value, label) = if v.same_conclusion {
            match v.numbers {
                NumericState::Exact => (3.0, "two-run proxy: same conclusion, numbers exact"),
                NumericState::WithinTol | NumericState::NoNumbers => {
                    (2.0, "two-run proxy: same conclusion, numbers close or absent")
                }
                NumericState::Mismatch => (1.0, "two-run proxy: same conclusion, numbers differ"),
            }
        } else {
            (0.0, "two-run proxy: conclusions differ")
        };
        return MetricScore::rule(value, label);
    }

    MetricScore::rule(
        0.0,
        format!(
            "only {} response(s) recorded; {} repeated runs required",
            texts.len(),
            min_runs
        ),
    )
}

fn score_three_runs(texts: &[&str], tables: &RuleTables, tolerance_pct: f64) -> MetricScore {
    let pairs = [
        compare_pair(texts[0], texts[1], tables, tolerance_pct),
        compare_pair(texts[0], texts[2], tables, tolerance_pct),
        compare_pair(texts[1], texts[2], tables, tolerance_pct),
    ];

    let all_same = pairs.iter().all(|p| p.same_conclusion);
    let all_exact = pairs.iter().all(|p| p.numbers == NumericState::Exact);
    let all_close = pairs
        .iter()
        .all(|p| matches!(p.numbers, NumericState::Exact | NumericState::WithinTol));
    let any_exact_agree = pairs
        .iter()
        .any(|p| p.same_conclusion && p.numbers == NumericState::Exact);
    let any_agree_mismatch = pairs
        .iter()
        .any(|p| p.same_conclusion && p.numbers == NumericState::Mismatch);

    let (value, label) = if all_same && all_exact {
        (5.0, "all 3 pairs agree with identical numbers")
    } else if all_same && all_close {
        (4.0, "all 3 pairs agree within numeric tolerance")
    } else if any_exact_agree {
        (3.0, "at least one pair agrees with identical numbers")
    } else if any_agree_mismatch {
        (2.0, "conclusions agree but numbers diverge")
    } else if all_same {
        (1.0, "conclusions agree without numeric support")
    } else {
        (0.0, "responses disagree across runs")
    };
    MetricScore::rule(value, label)
}
