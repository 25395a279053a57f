//! Weighted aggregation, manual-review escalation, and the two roll-up
//! summaries (per round, then per agent type across rounds).

use crate::model::{
    clamp_score, AgentType, AgentSummaryRow, MetricScore, RoundSummaryRow, ScoredItem, TtftStatus,
};
use crate::thresholds::RuleTables;
use std::collections::BTreeMap;

pub fn weighted_total(
    semantic: f64,
    consistency: f64,
    accuracy: f64,
    speed: f64,
    stability: f64,
    tables: &RuleTables,
) -> f64 {
    let w = &tables.weights;
    let total = clamp_score(semantic) * w.semantic
        + clamp_score(consistency) * w.consistency
        + clamp_score(accuracy) * w.accuracy
        + clamp_score(speed) * w.speed
        + clamp_score(stability) * w.stability;
    round2(total)
}

/// Pure OR of independent triggers; any one is sufficient.
pub fn flag_manual_review(
    semantic: &MetricScore,
    accuracy: &MetricScore,
    stability: &MetricScore,
    weighted_total: f64,
    response_error_or_blank: bool,
    tables: &RuleTables,
) -> bool {
    semantic.value <= tables.review_metric_floor
        || accuracy.value <= tables.review_metric_floor
        || stability.value <= tables.review_metric_floor
        || weighted_total <= tables.review_total_floor
        || response_error_or_blank
}

/// Side channel only; never enters the weighted total.
pub fn ttft_status(ttft_sec: Option<f64>, tables: &RuleTables) -> TtftStatus {
    match ttft_sec {
        Some(t) if t <= tables.ttft_limit_sec => TtftStatus::Pass,
        Some(_) => TtftStatus::Fail,
        None => TtftStatus::NotMeasured,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

struct Acc {
    items: u32,
    semantic: f64,
    consistency: f64,
    accuracy: f64,
    speed: f64,
    stability: f64,
    total: f64,
    reviews: u32,
}

impl Acc {
    fn new() -> Self {
        Acc {
            items: 0,
            semantic: 0.0,
            consistency: 0.0,
            accuracy: 0.0,
            speed: 0.0,
            stability: 0.0,
            total: 0.0,
            reviews: 0,
        }
    }

    fn push(&mut self, item: &ScoredItem) {
        self.items += 1;
        self.semantic += item.semantic.value;
        self.consistency += item.consistency.value;
        self.accuracy += item.accuracy.value;
        self.speed += item.speed.value;
        self.stability += item.stability.value;
        self.total += item.weighted_total;
        if item.flag_manual_review {
            self.reviews += 1;
        }
    }
}

/// Groups scored items by (run, agent type) and averages each metric.
pub fn build_round_summary(items: &[ScoredItem]) -> Vec<RoundSummaryRow> {
    let mut groups: BTreeMap<(String, AgentType), Acc> = BTreeMap::new();
    for item in items {
        groups
            .entry((item.run_id.clone(), item.agent_type))
            .or_insert_with(Acc::new)
            .push(item);
    }

    groups
        .into_iter()
        .map(|((run_id, agent_type), acc)| {
            let n = acc.items as f64;
            RoundSummaryRow {
                run_id,
                agent_type,
                items: acc.items,
                avg_semantic: round2(acc.semantic / n),
                avg_consistency: round2(acc.consistency / n),
                avg_accuracy: round2(acc.accuracy / n),
                avg_speed: round2(acc.speed / n),
                avg_stability: round2(acc.stability / n),
                avg_weighted_total: round2(acc.total / n),
                manual_review_rate: round2(acc.reviews as f64 / n),
            }
        })
        .collect()
}

/// Averages round summaries per agent type. Mean of means: a round with few
/// items counts the same as a round with many, matching "per-round score,
/// then per-agent score across rounds".
pub fn build_agent_summary(rounds: &[RoundSummaryRow]) -> Vec<AgentSummaryRow> {
    let mut groups: BTreeMap<AgentType, Vec<&RoundSummaryRow>> = BTreeMap::new();
    for row in rounds {
        groups.entry(row.agent_type).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(agent_type, rows)| {
            let n = rows.len() as f64;
            let mean = |f: fn(&RoundSummaryRow) -> f64| {
                round2(rows.iter().map(|r| f(r)).sum::<f64>() / n)
            };
            AgentSummaryRow {
                agent_type,
                rounds: rows.len() as u32,
                avg_semantic: mean(|r| r.avg_semantic),
                avg_consistency: mean(|r| r.avg_consistency),
                avg_accuracy: mean(|r| r.avg_accuracy),
                avg_speed: mean(|r| r.avg_speed),
                avg_stability: mean(|r| r.avg_stability),
                avg_weighted_total: mean(|r| r.avg_weighted_total),
                manual_review_rate: mean(|r| r.manual_review_rate),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalcMethod, ExecutionMode};

    fn item(run: &str, agent: AgentType, scores: [f64; 5], review: bool) -> ScoredItem {
        let m = |v: f64| MetricScore {
            value: v,
            reason: String::new(),
            calc_method: CalcMethod::RuleBased,
        };
        let tables = RuleTables::default();
        let total = weighted_total(scores[0], scores[1], scores[2], scores[3], scores[4], &tables);
        ScoredItem {
            run_id: run.into(),
            query_id: "q".into(),
            agent_type: agent,
            semantic: m(scores[0]),
            consistency: m(scores[1]),
            accuracy: m(scores[2]),
            speed: m(scores[3]),
            stability: m(scores[4]),
            weighted_total: total,
            flag_manual_review: review,
            ttft: TtftStatus::NotMeasured,
            execution_mode: ExecutionMode::Single,
            speed_single_score: scores[3],
            speed_multi_score: 0.0,
            response_time_avg_sec: None,
            additional_tool_calls: 0,
            response_error_or_blank: false,
        }
    }

    #[test]
    fn weighted_total_formula() {
        let t = RuleTables::default();
        // 5*0.2 + 5*0.1 + 5*0.3 + 5*0.2 + 5*0.2 = 5.0
        assert_eq!(weighted_total(5.0, 5.0, 5.0, 5.0, 5.0, &t), 5.0);
        assert_eq!(weighted_total(0.0, 0.0, 0.0, 0.0, 0.0, &t), 0.0);
        // 4*0.2 + 3*0.1 + 5*0.3 + 2*0.2 + 5*0.2 = 4.0
        assert_eq!(weighted_total(4.0, 3.0, 5.0, 2.0, 5.0, &t), 4.0);
    }

    #[test]
    fn weighted_total_in_range_and_clamped() {
        let t = RuleTables::default();
        for combo in [[9.0, 9.0, 9.0, 9.0, 9.0], [-1.0, 0.0, 2.5, 5.0, 3.0]] {
            let total = weighted_total(combo[0], combo[1], combo[2], combo[3], combo[4], &t);
            assert!((0.0..=5.0).contains(&total));
        }
    }

    #[test]
    fn error_or_blank_always_flags_review() {
        let t = RuleTables::default();
        let high = MetricScore::rule(5.0, "");
        assert!(flag_manual_review(&high, &high, &high, 5.0, true, &t));
        assert!(!flag_manual_review(&high, &high, &high, 5.0, false, &t));
    }

    #[test]
    fn low_metric_triggers_review() {
        let t = RuleTables::default();
        let high = MetricScore::rule(5.0, "");
        let low = MetricScore::rule(2.0, "");
        assert!(flag_manual_review(&low, &high, &high, 4.0, false, &t));
        assert!(flag_manual_review(&high, &low, &high, 4.0, false, &t));
        assert!(flag_manual_review(&high, &high, &low, 4.0, false, &t));
        assert!(flag_manual_review(&high, &high, &high, 2.5, false, &t));
    }

    #[test]
    fn ttft_side_channel() {
        let t = RuleTables::default();
        assert_eq!(ttft_status(Some(0.8), &t), TtftStatus::Pass);
        assert_eq!(ttft_status(Some(1.2), &t), TtftStatus::Fail);
        assert_eq!(ttft_status(None, &t), TtftStatus::NotMeasured);
    }

    #[test]
    fn round_summary_groups_by_run_and_agent() {
        let items = vec![
            item("r1", AgentType::Navigation, [5.0, 5.0, 5.0, 5.0, 5.0], false),
            item("r1", AgentType::Navigation, [3.0, 3.0, 3.0, 3.0, 3.0], true),
            item("r1", AgentType::Execution, [1.0, 1.0, 1.0, 1.0, 1.0], true),
        ];
        let rounds = build_round_summary(&items);
        assert_eq!(rounds.len(), 2);
        let nav = rounds
            .iter()
            .find(|r| r.agent_type == AgentType::Navigation)
            .unwrap();
        assert_eq!(nav.items, 2);
        assert_eq!(nav.avg_semantic, 4.0);
        assert_eq!(nav.manual_review_rate, 0.5);
    }

    #[test]
    fn mean_of_means_degenerates_with_equal_counts() {
        // Two rounds, one item each: agent average must equal the straight
        // per-round average.
        let items = vec![
            item("r1", AgentType::Navigation, [4.0, 4.0, 4.0, 4.0, 4.0], false),
            item("r2", AgentType::Navigation, [2.0, 2.0, 2.0, 2.0, 2.0], false),
        ];
        let rounds = build_round_summary(&items);
        let agents = build_agent_summary(&rounds);
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].rounds, 2);
        assert_eq!(agents[0].avg_semantic, 3.0);
        assert_eq!(agents[0].avg_weighted_total, 3.0);
    }
}
