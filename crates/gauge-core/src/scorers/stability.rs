//! Stability is binary: the call either delivered a usable response or it
//! did not. Operational availability, not quality.

use crate::model::{MetricScore, Transcript};
use crate::scorers::derive::has_ui_list;

pub fn score_stability(t: &Transcript) -> MetricScore {
    if let Some(err) = t.error_text.as_deref() {
        if !err.trim().is_empty() {
            return MetricScore::rule(0.0, format!("execution error: {}", err.trim()));
        }
    }

    let Some(first) = t.first_response() else {
        return MetricScore::rule(0.0, "no response recorded");
    };

    let Some(payload) = first.raw_payload.as_ref() else {
        return MetricScore::rule(0.0, "response body did not parse as JSON");
    };

    if first.assistant_text.trim().is_empty() && !has_ui_list(payload) {
        return MetricScore::rule(0.0, "response has neither assistant message nor result list");
    }

    MetricScore::rule(5.0, "response delivered")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResponseRecord;
    use serde_json::json;

    fn with_response(r: ResponseRecord) -> Transcript {
        Transcript {
            query_id: "q".into(),
            responses: vec![r],
            ..Default::default()
        }
    }

    #[test]
    fn error_text_forces_zero() {
        let mut t = with_response(ResponseRecord {
            raw_payload: Some(json!({})),
            assistant_text: "ok".into(),
            ..Default::default()
        });
        t.error_text = Some("connection reset".into());
        assert_eq!(score_stability(&t).value, 0.0);
    }

    #[test]
    fn unparsed_payload_forces_zero() {
        let t = with_response(ResponseRecord {
            raw_payload: None,
            assistant_text: "ok".into(),
            ..Default::default()
        });
        assert_eq!(score_stability(&t).value, 0.0);
    }

    #[test]
    fn ui_list_without_message_is_stable() {
        let t = with_response(ResponseRecord {
            raw_payload: Some(json!({"list": [1, 2]})),
            assistant_text: "".into(),
            ..Default::default()
        });
        assert_eq!(score_stability(&t).value, 5.0);
    }

    #[test]
    fn empty_response_is_unstable() {
        let t = with_response(ResponseRecord {
            raw_payload: Some(json!({"list": []})),
            assistant_text: "  ".into(),
            ..Default::default()
        });
        assert_eq!(score_stability(&t).value, 0.0);
    }

    #[test]
    fn normal_response_scores_five() {
        let t = with_response(ResponseRecord {
            raw_payload: Some(json!({})),
            assistant_text: "지원자 3명이 있습니다".into(),
            ..Default::default()
        });
        let s = score_stability(&t);
        assert_eq!(s.value, 5.0);
        assert_eq!(s.calc_method, crate::model::CalcMethod::RuleBased);
    }
}
