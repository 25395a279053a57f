//! End-to-end scoring over a small mixed batch, with and without a judge.

use gauge_core::aggregate::{build_agent_summary, build_round_summary};
use gauge_core::config::ScoringConfig;
use gauge_core::judge::providers::fake::{FailingJudge, FakeJudge};
use gauge_core::model::{
    AgentType, CalcMethod, ExpectedConditions, ResponseRecord, Transcript, TtftStatus,
};
use gauge_core::pipeline::ScoringPipeline;
use serde_json::json;
use std::sync::Arc;

fn response(text: &str, time: f64, payload: serde_json::Value) -> ResponseRecord {
    ResponseRecord {
        raw_payload: Some(payload),
        assistant_text: text.into(),
        response_time_sec: Some(time),
        status_text: None,
    }
}

fn nav_item() -> Transcript {
    Transcript {
        run_id: "run-1".into(),
        query_id: "nav-1".into(),
        query_text: "지원자 목록으로 이동".into(),
        agent_type: AgentType::Navigation,
        expected: ExpectedConditions {
            datakeys: vec!["A".into(), "B".into()],
            ..Default::default()
        },
        responses: vec![
            response("이동했습니다", 3.0, json!({"dataKeys": ["A", "B"]})),
            response("이동했습니다", 3.5, json!({"dataKeys": ["A", "B"]})),
            response("이동했습니다", 2.5, json!({"dataKeys": ["A", "B"]})),
        ],
        error_text: None,
        ttft_sec: Some(0.6),
    }
}

fn broken_item() -> Transcript {
    Transcript {
        run_id: "run-1".into(),
        query_id: "broken-1".into(),
        query_text: "채용 공고 생성".into(),
        agent_type: AgentType::Execution,
        error_text: Some("upstream 502".into()),
        responses: vec![ResponseRecord::default()],
        ..Default::default()
    }
}

#[tokio::test]
async fn rule_only_batch_scores_deterministically() {
    let pipeline = ScoringPipeline::new(ScoringConfig::default());
    let items = vec![nav_item(), broken_item()];

    let report = pipeline.precheck(&items);
    assert!(!report.summary.hard_fail);

    let scored = pipeline.run(&items).await.unwrap();
    assert_eq!(scored.len(), 2);

    let nav = &scored[0];
    assert_eq!(nav.stability.value, 5.0);
    assert_eq!(nav.accuracy.value, 5.0);
    assert_eq!(nav.semantic.value, 5.0);
    assert_eq!(nav.speed.value, 5.0);
    // Same text, no numbers: conclusions agree without numeric support.
    assert_eq!(nav.consistency.value, 1.0);
    assert_eq!(nav.ttft, TtftStatus::Pass);
    assert!(!nav.flag_manual_review);
    assert!((nav.weighted_total - 4.6).abs() < 1e-9);

    let broken = &scored[1];
    assert_eq!(broken.stability.value, 0.0);
    assert_eq!(broken.speed.value, 0.0);
    assert!(broken.response_error_or_blank);
    assert!(broken.flag_manual_review);
    assert_eq!(broken.ttft, TtftStatus::NotMeasured);
}

#[tokio::test]
async fn judge_augments_eligible_items_only() {
    let config = ScoringConfig {
        use_semantic_llm: true,
        use_consistency_llm: true,
        ..Default::default()
    };
    let pipeline = ScoringPipeline::new(config)
        .with_judge(Arc::new(FakeJudge::scoring(4.0, "clear and correct")));

    let scored = pipeline.run(&[nav_item(), broken_item()]).await.unwrap();

    let nav = &scored[0];
    assert_eq!(nav.semantic.calc_method, CalcMethod::LlmBased);
    assert_eq!(nav.semantic.value, 4.0);
    assert_eq!(nav.semantic.reason, "clear and correct");
    assert_eq!(nav.consistency.calc_method, CalcMethod::LlmBased);

    // Stability already failed: never sent to the judge.
    let broken = &scored[1];
    assert_eq!(broken.semantic.calc_method, CalcMethod::RuleBased);
    assert_eq!(broken.semantic.value, 0.0);
}

#[tokio::test]
async fn judge_failure_degrades_to_rule_fallback() {
    let config = ScoringConfig {
        use_semantic_llm: true,
        use_consistency_llm: true,
        ..Default::default()
    };
    let pipeline = ScoringPipeline::new(config).with_judge(Arc::new(FailingJudge));

    let scored = pipeline.run(&[nav_item()]).await.unwrap();
    let nav = &scored[0];
    assert_eq!(nav.semantic.calc_method, CalcMethod::RuleFallbackFromLlm);
    assert_eq!(nav.semantic.value, 5.0);
    assert_eq!(nav.consistency.calc_method, CalcMethod::RuleFallbackFromLlm);
    // The batch still produced a complete deterministic baseline.
    assert!(nav.weighted_total > 0.0);
}

#[tokio::test]
async fn judge_cannot_rescue_unmapped_intent() {
    let mut item = nav_item();
    item.responses = vec![
        response("다른 화면입니다", 3.0, json!({"dataKeys": ["Z"]})),
        response("다른 화면입니다", 3.0, json!({"dataKeys": ["Z"]})),
        response("다른 화면입니다", 3.0, json!({"dataKeys": ["Z"]})),
    ];
    let config = ScoringConfig {
        use_semantic_llm: true,
        ..Default::default()
    };
    let pipeline =
        ScoringPipeline::new(config).with_judge(Arc::new(FakeJudge::scoring(5.0, "fine")));

    let scored = pipeline.run(&[item]).await.unwrap();
    // Mapping grade is none: judge output is clamped to <= 1.
    assert_eq!(scored[0].semantic.value, 1.0);
    assert_eq!(scored[0].semantic.calc_method, CalcMethod::LlmBased);
}

#[tokio::test]
async fn summaries_roll_up_by_round_then_agent() {
    let pipeline = ScoringPipeline::new(ScoringConfig::default());
    let mut second_round = nav_item();
    second_round.run_id = "run-2".into();
    let scored = pipeline
        .run(&[nav_item(), broken_item(), second_round])
        .await
        .unwrap();

    let rounds = build_round_summary(&scored);
    assert_eq!(rounds.len(), 3); // (run-1, nav), (run-1, exec), (run-2, nav)

    let agents = build_agent_summary(&rounds);
    assert_eq!(agents.len(), 2);
    let nav = agents
        .iter()
        .find(|a| a.agent_type == AgentType::Navigation)
        .unwrap();
    assert_eq!(nav.rounds, 2);
}
