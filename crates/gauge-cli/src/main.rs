use anyhow::Context;
use clap::{Parser, Subcommand};
use gauge_core::aggregate::{build_agent_summary, build_round_summary};
use gauge_core::config::{load_config, write_sample_config, ScoringConfig};
use gauge_core::judge::providers::openai::OpenAiJudge;
use gauge_core::model::Transcript;
use gauge_core::pipeline::ScoringPipeline;
use gauge_core::report::console;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "gauge",
    version,
    about = "Quality scoring for conversational assistant transcripts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report batch readiness without scoring anything.
    Precheck(PrecheckArgs),
    /// Run the full scoring pipeline over a transcript batch.
    Score(ScoreArgs),
    /// Write a starter scoring.yaml.
    Init(InitArgs),
}

#[derive(Parser, Clone)]
struct PrecheckArgs {
    /// Transcript batch: JSONL (one transcript per line) or a JSON array.
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value_t = 3)]
    min_runs: usize,
}

#[derive(Parser, Clone)]
struct ScoreArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "scoring.yaml")]
    config: PathBuf,
    /// Score even when precheck reports a blocking failure.
    #[arg(long)]
    force: bool,
    /// Write scored items and roll-ups as JSON.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Clone)]
struct InitArgs {
    #[arg(long, default_value = "scoring.yaml")]
    config: PathBuf,
}

fn load_transcripts(path: &Path) -> anyhow::Result<Vec<Transcript>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input {}", path.display()))?;
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON array {}", path.display()));
    }
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid transcript", path.display(), i + 1))
        })
        .collect()
}

fn build_judge(cfg: &ScoringConfig) -> anyhow::Result<Option<Arc<OpenAiJudge>>> {
    if !cfg.use_semantic_llm && !cfg.use_consistency_llm {
        return Ok(None);
    }
    let api_key = std::env::var(&cfg.judge.api_key_env).with_context(|| {
        format!(
            "LLM judging enabled but {} is not set; disable use_semantic_llm/use_consistency_llm or export the key",
            cfg.judge.api_key_env
        )
    })?;
    Ok(Some(Arc::new(OpenAiJudge::new(
        api_key,
        cfg.judge.model.clone(),
        cfg.judge.base_url.clone(),
    ))))
}

async fn cmd_score(args: ScoreArgs) -> anyhow::Result<i32> {
    let cfg = load_config(&args.config)?;
    let items = load_transcripts(&args.input)?;

    let mut pipeline = ScoringPipeline::new(cfg.clone());
    if let Some(judge) = build_judge(&cfg)? {
        pipeline = pipeline.with_judge(judge);
    }

    let precheck = pipeline.precheck(&items);
    console::print_precheck(&precheck);
    if precheck.summary.hard_fail {
        if !args.force {
            anyhow::bail!("precheck reported a blocking failure; re-run with --force to override");
        }
        tracing::warn!("precheck hard fail overridden by --force");
    }

    let scored = pipeline.run(&items).await?;
    let rounds = build_round_summary(&scored);
    let agents = build_agent_summary(&rounds);

    console::print_scored(&scored);
    console::print_round_summary(&rounds);
    console::print_agent_summary(&agents);

    if let Some(out) = &args.out {
        let doc = serde_json::json!({
            "items": scored,
            "rounds": rounds,
            "agents": agents,
        });
        std::fs::write(out, serde_json::to_string_pretty(&doc)?)
            .with_context(|| format!("failed to write {}", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    Ok(0)
}

fn cmd_precheck(args: PrecheckArgs) -> anyhow::Result<i32> {
    let items = load_transcripts(&args.input)?;
    let report = gauge_core::precheck::run_precheck(&items, args.min_runs);
    console::print_precheck(&report);
    Ok(if report.summary.hard_fail { 1 } else { 0 })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Precheck(args) => cmd_precheck(args),
        Command::Score(args) => cmd_score(args).await,
        Command::Init(args) => write_sample_config(&args.config).map(|_| {
            eprintln!("wrote {}", args.config.display());
            0
        }),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(2);
        }
    }
}
