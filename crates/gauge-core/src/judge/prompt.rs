//! Prompt construction for the judge calls. Every prompt requests a JSON
//! object with an integer `score` (0-5) and a one-sentence `reason`.

use crate::model::Transcript;

const OUTPUT_CONTRACT: &str =
    "Reply with a JSON object only: {\"score\": <integer 0-5>, \"reason\": \"<one sentence>\"}";

pub fn semantic_prompt(t: &Transcript) -> String {
    let response = t
        .first_response()
        .map(|r| r.assistant_text.as_str())
        .unwrap_or("");
    let mut expectations = String::new();
    if !t.expected.filters.is_empty() {
        expectations.push_str(&format!("Expected filters: {}\n", t.expected.filters.join(", ")));
    }
    if !t.expected.datakeys.is_empty() {
        expectations.push_str(&format!(
            "Expected datakeys: {}\n",
            t.expected.datakeys.join(", ")
        ));
    }
    if let Some(truth) = t.expected.ground_truth.as_deref() {
        expectations.push_str(&format!("Ground truth: {}\n", truth));
    }

    format!(
        "You grade whether an assistant response correctly understood and \
         addressed the user's intent.\n\n\
         User query: {query}\n\
         Agent type: {agent}\n\
         {expectations}\
         Assistant response: {response}\n\n\
         Score 5 when the response fully addresses the intent, 0 when it \
         misses it entirely. {contract}",
        query = t.query_text,
        agent = t.agent_type.as_str(),
        expectations = expectations,
        response = response,
        contract = OUTPUT_CONTRACT,
    )
}

pub fn consistency_prompt(t: &Transcript) -> String {
    let mut runs = String::new();
    for (i, r) in t.responses.iter().enumerate() {
        runs.push_str(&format!("Run {}: {}\n", i + 1, r.assistant_text));
    }
    format!(
        "You grade whether repeated assistant responses to the same query \
         reach the same conclusion with the same facts and figures.\n\n\
         User query: {query}\n\
         {runs}\n\
         Score 5 when all runs agree in conclusion and numbers, 0 when they \
         contradict each other. {contract}",
        query = t.query_text,
        runs = runs,
        contract = OUTPUT_CONTRACT,
    )
}
