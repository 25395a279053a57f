//! Canned judge transports for tests.

use crate::judge::JudgeClient;
use async_trait::async_trait;
use serde_json::json;

/// Returns the same verdict for every prompt.
pub struct FakeJudge {
    verdict: serde_json::Value,
}

impl FakeJudge {
    pub fn new(verdict: serde_json::Value) -> Self {
        FakeJudge { verdict }
    }

    pub fn scoring(score: f64, reason: &str) -> Self {
        FakeJudge::new(json!({"score": score, "reason": reason}))
    }
}

#[async_trait]
impl JudgeClient for FakeJudge {
    async fn judge(&self, _prompt: &str) -> anyhow::Result<serde_json::Value> {
        Ok(self.verdict.clone())
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

/// Fails every call; exercises the rule-fallback path.
pub struct FailingJudge;

#[async_trait]
impl JudgeClient for FailingJudge {
    async fn judge(&self, _prompt: &str) -> anyhow::Result<serde_json::Value> {
        anyhow::bail!("judge transport unavailable")
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}
