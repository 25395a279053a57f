//! Top-level orchestration: rule scoring per item, judge fan-out for the
//! LLM-augmentable metrics, guardrailed merge, aggregation.

use crate::aggregate::{flag_manual_review, ttft_status, weighted_total};
use crate::config::ScoringConfig;
use crate::judge::prompt::{consistency_prompt, semantic_prompt};
use crate::judge::{JudgeClient, JudgeOrchestrator, JudgeTask, JudgeVerdict};
use crate::model::{MetricKind, MetricScore, ScoredItem, Transcript};
use crate::precheck::{run_precheck, PrecheckReport};
use crate::scorers::accuracy::score_accuracy;
use crate::scorers::consistency::score_consistency;
use crate::scorers::derive::DerivedItem;
use crate::scorers::semantic::score_semantic;
use crate::scorers::speed::{score_speed, SpeedOutcome};
use crate::scorers::stability::score_stability;
use crate::scorers::derive_item;
use crate::thresholds::RuleTables;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::Duration;

pub struct ScoringPipeline {
    config: ScoringConfig,
    tables: RuleTables,
    judge: Option<Arc<dyn JudgeClient>>,
}

struct RuleScored {
    derived: DerivedItem,
    stability: MetricScore,
    semantic: MetricScore,
    accuracy: MetricScore,
    speed: SpeedOutcome,
    consistency: MetricScore,
}

impl ScoringPipeline {
    pub fn new(config: ScoringConfig) -> Self {
        ScoringPipeline {
            config,
            tables: RuleTables::default(),
            judge: None,
        }
    }

    pub fn with_tables(mut self, tables: RuleTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_judge(mut self, judge: Arc<dyn JudgeClient>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Data-readiness gate. The caller decides whether a hard fail blocks
    /// scoring; forcing past it is deliberately not this engine's call.
    pub fn precheck(&self, items: &[Transcript]) -> PrecheckReport {
        run_precheck(items, self.config.consistency_min_runs)
    }

    pub async fn run(&self, items: &[Transcript]) -> anyhow::Result<Vec<ScoredItem>> {
        self.config.validate()?;

        let rule_scored: Vec<RuleScored> = items.iter().map(|t| self.score_rules(t)).collect();

        let (tasks, dispatched) = self.collect_judge_tasks(items, &rule_scored);
        let verdicts = match &self.judge {
            Some(judge) if !tasks.is_empty() => {
                tracing::info!(calls = tasks.len(), "dispatching judge calls");
                JudgeOrchestrator::new(
                    judge.clone(),
                    self.config.max_parallel_judge_calls,
                    Duration::from_secs(self.config.judge_timeout_secs),
                )
                .run(tasks)
                .await
            }
            _ => HashMap::new(),
        };

        let scored = items
            .iter()
            .zip(rule_scored)
            .enumerate()
            .map(|(idx, (t, rs))| self.finalize(idx, t, rs, &verdicts, &dispatched))
            .collect();
        Ok(scored)
    }

    fn score_rules(&self, t: &Transcript) -> RuleScored {
        let derived = derive_item(t);
        let stability = score_stability(t);
        let stability_failed = stability.value <= 0.0;
        RuleScored {
            semantic: score_semantic(t, &derived, stability_failed),
            accuracy: score_accuracy(t, &derived, self.config.tolerance_pct),
            speed: score_speed(t, &derived, &self.tables),
            consistency: score_consistency(
                t,
                &self.tables,
                self.config.tolerance_pct,
                self.config.consistency_min_runs,
                self.config.consistency_under_min_policy,
            ),
            stability,
            derived,
        }
    }

    fn collect_judge_tasks(
        &self,
        items: &[Transcript],
        rule_scored: &[RuleScored],
    ) -> (Vec<JudgeTask>, HashSet<(usize, MetricKind)>) {
        let mut tasks = Vec::new();
        let mut dispatched = HashSet::new();
        if self.judge.is_none() {
            return (tasks, dispatched);
        }

        for (idx, (t, rs)) in items.iter().zip(rule_scored).enumerate() {
            if rs.stability.value <= 0.0 {
                continue;
            }
            if self.config.use_semantic_llm {
                dispatched.insert((idx, MetricKind::Semantic));
                tasks.push(JudgeTask {
                    item_index: idx,
                    kind: MetricKind::Semantic,
                    prompt: semantic_prompt(t),
                });
            }
            if self.config.use_consistency_llm
                && t.responses.len() >= self.config.consistency_min_runs
            {
                dispatched.insert((idx, MetricKind::Consistency));
                tasks.push(JudgeTask {
                    item_index: idx,
                    kind: MetricKind::Consistency,
                    prompt: consistency_prompt(t),
                });
            }
        }
        (tasks, dispatched)
    }

    fn finalize(
        &self,
        idx: usize,
        t: &Transcript,
        rs: RuleScored,
        verdicts: &HashMap<(usize, MetricKind), JudgeVerdict>,
        dispatched: &HashSet<(usize, MetricKind)>,
    ) -> ScoredItem {
        let semantic = merge_semantic(
            rs.semantic,
            &rs.derived,
            verdicts.get(&(idx, MetricKind::Semantic)),
            dispatched.contains(&(idx, MetricKind::Semantic)),
            &self.tables,
        );
        let consistency = merge_consistency(
            rs.consistency,
            verdicts.get(&(idx, MetricKind::Consistency)),
            dispatched.contains(&(idx, MetricKind::Consistency)),
        );

        let total = weighted_total(
            semantic.value,
            consistency.value,
            rs.accuracy.value,
            rs.speed.score.value,
            rs.stability.value,
            &self.tables,
        );
        let review = flag_manual_review(
            &semantic,
            &rs.accuracy,
            &rs.stability,
            total,
            rs.derived.response_error_or_blank,
            &self.tables,
        );

        ScoredItem {
            run_id: t.run_id.clone(),
            query_id: t.query_id.clone(),
            agent_type: t.agent_type,
            semantic,
            consistency,
            accuracy: rs.accuracy,
            stability: rs.stability,
            weighted_total: total,
            flag_manual_review: review,
            ttft: ttft_status(t.ttft_sec, &self.tables),
            execution_mode: rs.derived.execution_mode,
            speed_single_score: rs.speed.single_score,
            speed_multi_score: rs.speed.multi_score,
            response_time_avg_sec: rs.derived.avg_response_sec,
            additional_tool_calls: rs.derived.process_count.saturating_sub(1) as u32,
            response_error_or_blank: rs.derived.response_error_or_blank,
            speed: rs.speed.score,
        }
    }
}

/// The judge refines, never overrides: its score is capped by the
/// rule-derived mapping grade before it replaces the rule score.
fn merge_semantic(
    rule: MetricScore,
    derived: &DerivedItem,
    verdict: Option<&JudgeVerdict>,
    was_dispatched: bool,
    tables: &RuleTables,
) -> MetricScore {
    match verdict {
        Some(v) => {
            let cap = tables.semantic_llm_cap(derived.mapping_grade);
            let value = v.score.min(cap).round();
            tracing::debug!(
                llm = v.score,
                cap,
                grade = derived.mapping_grade.as_str(),
                "merged semantic judge score"
            );
            MetricScore::llm(value, v.reason.clone())
        }
        None if was_dispatched => rule.into_fallback(),
        None => rule,
    }
}

fn merge_consistency(
    rule: MetricScore,
    verdict: Option<&JudgeVerdict>,
    was_dispatched: bool,
) -> MetricScore {
    match verdict {
        Some(v) => MetricScore::llm(v.score.round(), v.reason.clone()),
        None if was_dispatched => rule.into_fallback(),
        None => rule,
    }
}
