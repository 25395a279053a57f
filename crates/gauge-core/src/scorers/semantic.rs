//! Rule baseline for semantic/intent correctness. The mapping grade that
//! drives accuracy also decides whether the response understood the query;
//! an LLM judge may refine this score under the guardrail cap.

use crate::model::{MetricScore, Transcript};
use crate::scorers::derive::{DerivedItem, MappingGrade};

pub fn score_semantic(t: &Transcript, d: &DerivedItem, stability_failed: bool) -> MetricScore {
    if stability_failed {
        return MetricScore::rule(0.0, "stability failed; intent cannot be assessed");
    }
    let blank = t
        .first_response()
        .map(|r| r.assistant_text.trim().is_empty())
        .unwrap_or(true);
    if blank {
        return MetricScore::rule(0.0, "first response is blank");
    }

    let (value, label) = match d.mapping_grade {
        MappingGrade::Exact => (5.0, "intent mapped exactly"),
        MappingGrade::FullWithExtra | MappingGrade::Partial => {
            (3.0, "intent mapped with deviations")
        }
        MappingGrade::None => (1.0, "intent not mapped"),
        MappingGrade::Unknown => (2.0, "no expectations to grade against"),
    };
    MetricScore::rule(
        value,
        format!("{} (grade {})", label, d.mapping_grade.as_str()),
    )
}
