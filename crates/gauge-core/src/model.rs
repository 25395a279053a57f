use serde::{Deserialize, Serialize};

/// Which assistant persona handled the query. Drives the accuracy rule
/// family and the multi-tool speed bucket table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    ApplicantManagement,
    #[default]
    Navigation,
    Execution,
    ExecutionOrNavigation,
}

impl AgentType {
    pub fn parse(s: &str) -> Self {
        match s {
            "applicant_management" => AgentType::ApplicantManagement,
            "navigation" => AgentType::Navigation,
            "execution" => AgentType::Execution,
            "execution_or_navigation" => AgentType::ExecutionOrNavigation,
            _ => AgentType::Navigation, // Default fallback
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::ApplicantManagement => "applicant_management",
            AgentType::Navigation => "navigation",
            AgentType::Execution => "execution",
            AgentType::ExecutionOrNavigation => "execution_or_navigation",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Single,
    Multi,
}

/// One recorded assistant turn. `raw_payload` is `None` when the response
/// body could not be parsed as JSON, which counts as a stability failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(default)]
    pub raw_payload: Option<serde_json::Value>,
    #[serde(default)]
    pub assistant_text: String,
    #[serde(default)]
    pub response_time_sec: Option<f64>,
    #[serde(default)]
    pub status_text: Option<String>,
}

/// Ground-truth expectations attached to a query item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedConditions {
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub datakeys: Vec<String>,
    #[serde(default)]
    pub ground_truth: Option<String>,
    #[serde(default)]
    pub checks: Vec<AccuracyCheck>,
}

/// All recorded turns for one logical test query. Immutable once scoring
/// starts; repeated calls are ordered by call index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub run_id: String,
    pub query_id: String,
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub responses: Vec<ResponseRecord>,
    #[serde(default)]
    pub expected: ExpectedConditions,
    #[serde(default)]
    pub agent_type: AgentType,
    #[serde(default)]
    pub error_text: Option<String>,
    /// Time-to-first-token, measured out of band. Side channel only.
    #[serde(default)]
    pub ttft_sec: Option<f64>,
}

impl Transcript {
    pub fn first_response(&self) -> Option<&ResponseRecord> {
        self.responses.first()
    }
}

/// One declarative assertion against the raw response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyCheck {
    pub path: String,
    pub op: CheckOp,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOp {
    Exists,
    Eq,
    Contains,
    In,
    Regex,
}

impl CheckOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOp::Exists => "exists",
            CheckOp::Eq => "eq",
            CheckOp::Contains => "contains",
            CheckOp::In => "in",
            CheckOp::Regex => "regex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Semantic,
    Consistency,
    Accuracy,
    Speed,
    Stability,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Semantic => "semantic",
            MetricKind::Consistency => "consistency",
            MetricKind::Accuracy => "accuracy",
            MetricKind::Speed => "speed",
            MetricKind::Stability => "stability",
        }
    }
}

/// Provenance of a metric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMethod {
    RuleBased,
    LlmBased,
    RuleFallbackFromLlm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricScore {
    pub value: f64,
    pub reason: String,
    pub calc_method: CalcMethod,
}

impl MetricScore {
    pub fn rule(value: f64, reason: impl Into<String>) -> Self {
        MetricScore {
            value: clamp_score(value),
            reason: reason.into(),
            calc_method: CalcMethod::RuleBased,
        }
    }

    pub fn llm(value: f64, reason: impl Into<String>) -> Self {
        MetricScore {
            value: clamp_score(value),
            reason: reason.into(),
            calc_method: CalcMethod::LlmBased,
        }
    }

    /// Marks an existing rule score as the fallback for a failed judge call.
    pub fn into_fallback(mut self) -> Self {
        self.calc_method = CalcMethod::RuleFallbackFromLlm;
        self
    }
}

pub fn clamp_score(v: f64) -> f64 {
    v.clamp(0.0, 5.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtftStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "N/A")]
    NotMeasured,
}

/// Final per-item record. A re-score produces a new ScoredItem; existing
/// ones are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem {
    pub run_id: String,
    pub query_id: String,
    pub agent_type: AgentType,

    pub semantic: MetricScore,
    pub consistency: MetricScore,
    pub accuracy: MetricScore,
    pub speed: MetricScore,
    pub stability: MetricScore,

    pub weighted_total: f64,
    pub flag_manual_review: bool,
    pub ttft: TtftStatus,

    // Derived diagnostics.
    pub execution_mode: ExecutionMode,
    pub speed_single_score: f64,
    pub speed_multi_score: f64,
    pub response_time_avg_sec: Option<f64>,
    pub additional_tool_calls: u32,
    pub response_error_or_blank: bool,
}

impl ScoredItem {
    pub fn metric(&self, kind: MetricKind) -> &MetricScore {
        match kind {
            MetricKind::Semantic => &self.semantic,
            MetricKind::Consistency => &self.consistency,
            MetricKind::Accuracy => &self.accuracy,
            MetricKind::Speed => &self.speed,
            MetricKind::Stability => &self.stability,
        }
    }
}

/// Per (run, agent type) averages over scored items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSummaryRow {
    pub run_id: String,
    pub agent_type: AgentType,
    pub items: u32,
    pub avg_semantic: f64,
    pub avg_consistency: f64,
    pub avg_accuracy: f64,
    pub avg_speed: f64,
    pub avg_stability: f64,
    pub avg_weighted_total: f64,
    pub manual_review_rate: f64,
}

/// Per agent type averages over round summaries (mean of means).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummaryRow {
    pub agent_type: AgentType,
    pub rounds: u32,
    pub avg_semantic: f64,
    pub avg_consistency: f64,
    pub avg_accuracy: f64,
    pub avg_speed: f64,
    pub avg_stability: f64,
    pub avg_weighted_total: f64,
    pub manual_review_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_type_parse_roundtrip() {
        for s in [
            "applicant_management",
            "navigation",
            "execution",
            "execution_or_navigation",
        ] {
            assert_eq!(AgentType::parse(s).as_str(), s);
        }
        assert_eq!(AgentType::parse("garbage"), AgentType::Navigation);
    }

    #[test]
    fn transcript_deserializes_with_defaults() {
        let t: Transcript = serde_json::from_str(r#"{"query_id":"q1"}"#).unwrap();
        assert_eq!(t.query_id, "q1");
        assert!(t.responses.is_empty());
        assert_eq!(t.agent_type, AgentType::Navigation);
    }

    #[test]
    fn ttft_status_serializes_upper() {
        assert_eq!(
            serde_json::to_string(&TtftStatus::NotMeasured).unwrap(),
            "\"N/A\""
        );
        assert_eq!(serde_json::to_string(&TtftStatus::Pass).unwrap(), "\"PASS\"");
    }
}
