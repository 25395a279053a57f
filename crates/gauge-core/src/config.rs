use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Policy for consistency scoring when fewer than three repeated responses
/// are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderMinPolicy {
    /// Score 0 unconditionally, with a reason noting the run-count shortfall.
    Zero,
    /// Compare the first two responses on a coarser ladder.
    #[default]
    TwoRunProxy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeSettings {
    #[serde(default = "default_judge_model")]
    pub model: String,
    /// Environment variable holding the judge API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        JudgeSettings {
            model: default_judge_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
        }
    }
}

/// Per-invocation scoring configuration. Nothing here is global state; the
/// pipeline takes it by value and never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Numeric tolerance, in percent of the larger magnitude.
    #[serde(default = "default_tolerance_pct")]
    pub tolerance_pct: f64,
    #[serde(default)]
    pub use_semantic_llm: bool,
    #[serde(default)]
    pub use_consistency_llm: bool,
    #[serde(default = "default_min_runs")]
    pub consistency_min_runs: usize,
    #[serde(default)]
    pub consistency_under_min_policy: UnderMinPolicy,
    #[serde(default = "default_parallel")]
    pub max_parallel_judge_calls: usize,
    #[serde(default = "default_judge_timeout_secs")]
    pub judge_timeout_secs: u64,
    #[serde(default)]
    pub judge: JudgeSettings,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            tolerance_pct: default_tolerance_pct(),
            use_semantic_llm: false,
            use_consistency_llm: false,
            consistency_min_runs: default_min_runs(),
            consistency_under_min_policy: UnderMinPolicy::default(),
            max_parallel_judge_calls: default_parallel(),
            judge_timeout_secs: default_judge_timeout_secs(),
            judge: JudgeSettings::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tolerance_pct < 0.0 {
            anyhow::bail!("tolerance_pct must be >= 0 (got {})", self.tolerance_pct);
        }
        if self.max_parallel_judge_calls == 0 {
            anyhow::bail!("max_parallel_judge_calls must be >= 1");
        }
        if self.consistency_min_runs == 0 {
            anyhow::bail!("consistency_min_runs must be >= 1");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<ScoringConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: ScoringConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse YAML config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> anyhow::Result<()> {
    std::fs::write(
        path,
        r#"tolerance_pct: 5.0
use_semantic_llm: false
use_consistency_llm: false
consistency_min_runs: 3
consistency_under_min_policy: two_run_proxy
max_parallel_judge_calls: 3
judge_timeout_secs: 120
judge:
  model: gpt-4o-mini
  api_key_env: GAUGE_JUDGE_API_KEY
"#,
    )
    .with_context(|| format!("failed to write sample config {}", path.display()))?;
    Ok(())
}

fn default_tolerance_pct() -> f64 {
    5.0
}

fn default_min_runs() -> usize {
    3
}

fn default_parallel() -> usize {
    3
}

fn default_judge_timeout_secs() -> u64 {
    120
}

fn default_judge_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "GAUGE_JUDGE_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
