//! Latency-bucket classifier. Both bucket tables are always computed and
//! kept as diagnostics; the reported score follows the detected mode.

use crate::model::{ExecutionMode, MetricScore, Transcript};
use crate::scorers::derive::DerivedItem;
use crate::thresholds::RuleTables;

#[derive(Debug, Clone)]
pub struct SpeedOutcome {
    pub score: MetricScore,
    pub single_score: f64,
    pub multi_score: f64,
}

pub fn score_speed(t: &Transcript, d: &DerivedItem, tables: &RuleTables) -> SpeedOutcome {
    if d.response_error_or_blank {
        return SpeedOutcome {
            score: MetricScore::rule(0.0, "error or blank response; speed not credited"),
            single_score: 0.0,
            multi_score: 0.0,
        };
    }
    let Some(avg) = d.avg_response_sec else {
        return SpeedOutcome {
            score: MetricScore::rule(0.0, "no response timing data"),
            single_score: 0.0,
            multi_score: 0.0,
        };
    };

    let single = tables.speed_single.score(avg);
    let multi = tables.speed_multi(t.agent_type).score(avg);
    let (value, mode) = match d.execution_mode {
        ExecutionMode::Single => (single, "single"),
        ExecutionMode::Multi => (multi, "multi"),
    };

    SpeedOutcome {
        score: MetricScore::rule(
            value,
            format!("avg {:.1}s over {} call(s), {}-tool mode", avg, t.responses.len(), mode),
        ),
        single_score: single,
        multi_score: multi,
    }
}
