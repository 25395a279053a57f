//! LLM judge boundary: the transport trait, verdict parsing for both
//! accepted output shapes, and the bounded-concurrency orchestrator.

pub mod providers;
pub mod prompt;

use crate::model::MetricKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{timeout, Duration};

/// Transport for a single judge call. Implementations own retry/backoff;
/// the orchestrator only bounds concurrency and applies a wall-clock
/// timeout per call.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn judge(&self, prompt: &str) -> anyhow::Result<serde_json::Value>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct JudgeTask {
    pub item_index: usize,
    pub kind: MetricKind,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct JudgeVerdict {
    pub score: f64,
    pub reason: String,
}

/// Accepts shape A (`score`/`reason`) first; shape B
/// (`metric_scores`/`total_score`/`comment`) only when A is absent.
pub fn parse_verdict(v: &serde_json::Value) -> Option<JudgeVerdict> {
    if let Some(score) = v.get("score").and_then(|s| s.as_f64()) {
        let reason = v
            .get("reason")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string();
        return Some(JudgeVerdict {
            score: score.clamp(0.0, 5.0),
            reason,
        });
    }

    let total = v.get("total_score").and_then(|s| s.as_f64()).or_else(|| {
        let scores = v.get("metric_scores")?.as_object()?;
        let values: Vec<f64> = scores.values().filter_map(|x| x.as_f64()).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    })?;
    let reason = v
        .get("comment")
        .and_then(|r| r.as_str())
        .unwrap_or("")
        .to_string();
    Some(JudgeVerdict {
        score: total.clamp(0.0, 5.0),
        reason,
    })
}

pub struct JudgeOrchestrator {
    client: Arc<dyn JudgeClient>,
    max_parallel: usize,
    call_timeout: Duration,
}

impl JudgeOrchestrator {
    pub fn new(client: Arc<dyn JudgeClient>, max_parallel: usize, call_timeout: Duration) -> Self {
        JudgeOrchestrator {
            client,
            max_parallel: max_parallel.max(1),
            call_timeout,
        }
    }

    /// Runs all tasks with bounded concurrency. A failed or timed-out call
    /// leaves its key absent from the result map; callers fall back to the
    /// rule score. Completion order never affects the merge because results
    /// are keyed by `(item_index, kind)`.
    pub async fn run(
        &self,
        tasks: Vec<JudgeTask>,
    ) -> HashMap<(usize, MetricKind), JudgeVerdict> {
        let sem = Arc::new(Semaphore::new(self.max_parallel));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let Ok(permit) = sem.clone().acquire_owned().await else {
                break;
            };
            let client = self.client.clone();
            let call_timeout = self.call_timeout;
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let key = (task.item_index, task.kind);
                match timeout(call_timeout, client.judge(&task.prompt)).await {
                    Ok(Ok(raw)) => match parse_verdict(&raw) {
                        Some(verdict) => Some((key, verdict)),
                        None => {
                            tracing::warn!(
                                item = task.item_index,
                                metric = task.kind.as_str(),
                                "judge returned an unrecognized shape"
                            );
                            None
                        }
                    },
                    Ok(Err(e)) => {
                        tracing::warn!(
                            item = task.item_index,
                            metric = task.kind.as_str(),
                            error = %e,
                            "judge call failed"
                        );
                        None
                    }
                    Err(_) => {
                        tracing::warn!(
                            item = task.item_index,
                            metric = task.kind.as_str(),
                            "judge call timed out"
                        );
                        None
                    }
                }
            }));
        }

        let mut results = HashMap::new();
        for h in handles {
            match h.await {
                Ok(Some((key, verdict))) => {
                    results.insert(key, verdict);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "judge task join error"),
            }
        }
        results
    }
}
