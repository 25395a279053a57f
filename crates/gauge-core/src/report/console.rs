use crate::model::{AgentSummaryRow, RoundSummaryRow, ScoredItem};
use crate::precheck::{CheckStatus, PrecheckReport};

pub fn print_precheck(report: &PrecheckReport) {
    eprintln!("\nPrecheck over {} item(s):", report.summary.total_items);
    for f in &report.findings {
        let icon = match f.status {
            CheckStatus::Pass => "✅",
            CheckStatus::Warn => "⚠️ ",
            CheckStatus::Fail => "❌",
        };
        eprintln!("{} {:<20} {}", icon, f.check, f.detail);
    }
    if report.summary.hard_fail {
        eprintln!("RESULT: hard fail, scoring blocked");
    } else {
        eprintln!("RESULT: ready");
    }
}

pub fn print_scored(items: &[ScoredItem]) {
    eprintln!("\nScored {} item(s):", items.len());
    let mut reviews = 0;
    for item in items {
        let flag = if item.flag_manual_review {
            reviews += 1;
            "REVIEW"
        } else {
            "      "
        };
        eprintln!(
            "{:<24} {:<22} total {:>4.2}  sem {} con {} acc {} spd {} stb {}  {}",
            item.query_id,
            item.agent_type.as_str(),
            item.weighted_total,
            item.semantic.value,
            item.consistency.value,
            item.accuracy.value,
            item.speed.value,
            item.stability.value,
            flag,
        );
    }
    eprintln!("manual review: {}/{}", reviews, items.len());
}

pub fn print_round_summary(rounds: &[RoundSummaryRow]) {
    eprintln!("\nPer-round averages:");
    for r in rounds {
        eprintln!(
            "run {:<16} {:<22} items {:>3}  total {:>4.2}  review rate {:.2}",
            r.run_id, r.agent_type.as_str(), r.items, r.avg_weighted_total, r.manual_review_rate
        );
    }
}

pub fn print_agent_summary(agents: &[AgentSummaryRow]) {
    eprintln!("\nPer-agent averages (across rounds):");
    for a in agents {
        eprintln!(
            "{:<22} rounds {:>3}  total {:>4.2}  review rate {:.2}",
            a.agent_type.as_str(), a.rounds, a.avg_weighted_total, a.manual_review_rate
        );
    }
}
