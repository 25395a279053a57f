//! OpenAI-compatible chat-completions judge transport.

use crate::judge::JudgeClient;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tokio::time::Duration;

const SYSTEM_PROMPT: &str =
    "You are a strict evaluation judge. Always answer with a single JSON object.";
const MAX_RETRIES: u32 = 2;

pub struct OpenAiJudge {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiJudge {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        OpenAiJudge {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn call_once(&self, prompt: &str) -> anyhow::Result<serde_json::Value> {
        let body = json!({
            "model": self.model,
            "temperature": 0.0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("judge request failed")?
            .error_for_status()
            .context("judge returned an error status")?;

        let v: serde_json::Value = resp.json().await.context("judge response not JSON")?;
        let content = v
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .context("judge response missing message content")?;
        serde_json::from_str(content).context("judge message content is not a JSON object")
    }
}

#[async_trait]
impl JudgeClient for OpenAiJudge {
    async fn judge(&self, prompt: &str) -> anyhow::Result<serde_json::Value> {
        let mut last_err = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s.
                tokio::time::sleep(Duration::from_secs(1 << (attempt - 1))).await;
            }
            match self.call_once(prompt).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "judge attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("judge call failed")))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
