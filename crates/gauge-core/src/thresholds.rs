//! Immutable rule tables. Constructed once per invocation and passed
//! explicitly into the scorers; there is no package-level mutable state.

use crate::model::AgentType;
use crate::scorers::derive::MappingGrade;
use serde::{Deserialize, Serialize};

/// Weights applied to the five metric scores when computing the total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricWeights {
    pub semantic: f64,
    pub consistency: f64,
    pub accuracy: f64,
    pub speed: f64,
    pub stability: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        MetricWeights {
            semantic: 0.2,
            consistency: 0.1,
            accuracy: 0.3,
            speed: 0.2,
            stability: 0.2,
        }
    }
}

/// Latency bucket table: five upper bounds (seconds) mapping to scores
/// 5 down to 1; anything slower scores 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpeedBuckets {
    pub bounds_sec: [f64; 5],
}

impl SpeedBuckets {
    pub fn score(&self, avg_sec: f64) -> f64 {
        for (i, bound) in self.bounds_sec.iter().enumerate() {
            if avg_sec <= *bound {
                return (5 - i) as f64;
            }
        }
        0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleTables {
    pub weights: MetricWeights,
    pub speed_single: SpeedBuckets,
    pub speed_multi_applicant: SpeedBuckets,
    pub speed_multi_other: SpeedBuckets,
    /// Jaccard similarity at or above which two responses are considered to
    /// reach the same conclusion.
    pub same_conclusion_sim: f64,
    /// TTFT pass bound, seconds.
    pub ttft_limit_sec: f64,
    /// Manual review fires when semantic/accuracy/stability fall to this or
    /// below, or the weighted total falls to `review_total_floor` or below.
    pub review_metric_floor: f64,
    pub review_total_floor: f64,
}

impl Default for RuleTables {
    fn default() -> Self {
        RuleTables {
            weights: MetricWeights::default(),
            speed_single: SpeedBuckets {
                bounds_sec: [5.0, 8.0, 10.0, 15.0, 20.0],
            },
            speed_multi_applicant: SpeedBuckets {
                bounds_sec: [20.0, 30.0, 40.0, 50.0, 60.0],
            },
            speed_multi_other: SpeedBuckets {
                bounds_sec: [10.0, 15.0, 20.0, 30.0, 45.0],
            },
            same_conclusion_sim: 0.45,
            ttft_limit_sec: 1.0,
            review_metric_floor: 2.0,
            review_total_floor: 2.5,
        }
    }
}

impl RuleTables {
    pub fn speed_multi(&self, agent: AgentType) -> &SpeedBuckets {
        if agent == AgentType::ApplicantManagement {
            &self.speed_multi_applicant
        } else {
            &self.speed_multi_other
        }
    }

    /// Upper bound a judge-produced semantic score may reach, given the
    /// rule-derived mapping grade. A judge never overrides a hard rule
    /// failure.
    pub fn semantic_llm_cap(&self, grade: MappingGrade) -> f64 {
        match grade {
            MappingGrade::None => 1.0,
            MappingGrade::Partial | MappingGrade::FullWithExtra => 3.0,
            MappingGrade::Exact | MappingGrade::Unknown => 5.0,
        }
    }
}
