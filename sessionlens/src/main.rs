// sessionlens/src/main.rs
//
// Sessionlens — weblog sessionization, engagement ranking and request-load
// forecasting over a static access log.
//
// Usage:
//   sessionlens --path 2015_07_22_mktplace_shop_web_log_sample.log
//   sessionlens --path hits.jsonl --format jsonl --threshold-secs 600
//   sessionlens --path access.log --predict 123.242.248.130 --json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sessionlens::{parse, pipeline, report, AnalysisConfig, GapFill};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "sessionlens",
    about   = "Weblog sessionization, engagement ranking and load forecasting",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long, help = "Access log to analyze")]
    path: PathBuf,

    #[arg(long, value_enum, default_value = "elb", help = "Input line format")]
    format: InputFormat,

    #[arg(long, default_value = "900",
          help = "Inactivity gap (seconds) that closes a session")]
    threshold_secs: i64,

    #[arg(long, default_value = "10", help = "Rows per engagement ranking")]
    top: usize,

    #[arg(long, default_value = "60", help = "Load bucket width in seconds")]
    bucket_secs: i64,

    #[arg(long, value_delimiter = ',', default_value = "5,15,30,60",
          help = "Candidate moving-average windows, in buckets")]
    windows: Vec<usize>,

    #[arg(long, value_enum, default_value = "zeros",
          help = "Gap handling ahead of the moving average")]
    gap_fill: GapFillArg,

    #[arg(long, help = "Client address(es) to predict; repeatable")]
    predict: Vec<String>,

    #[arg(long, help = "Emit the report as JSON instead of markdown")]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// AWS ELB access-log lines
    Elb,
    /// One HitRecord JSON object per line
    Jsonl,
}

#[derive(Clone, Copy, ValueEnum)]
enum GapFillArg {
    Zeros,
    ForwardFill,
}

impl From<GapFillArg> for GapFill {
    fn from(arg: GapFillArg) -> Self {
        match arg {
            GapFillArg::Zeros       => GapFill::Zeros,
            GapFillArg::ForwardFill => GapFill::ForwardFill,
        }
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!("\x1b[1msessionlens\x1b[0m — weblog sessionization & load forecasting");
    println!("\x1b[90mgithub.com/m0rs3c0d3/sessionlens\x1b[0m\n");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("sessionlens=info".parse()?),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    if !cli.json {
        print_banner();
    }

    let content = tokio::fs::read_to_string(&cli.path)
        .await
        .with_context(|| format!("reading {}", cli.path.display()))?;

    let hits = match cli.format {
        InputFormat::Elb   => parse::parse_elb_log(&content),
        InputFormat::Jsonl => parse::parse_jsonl(&content),
    };
    info!("parsed {} record(s) from {}", hits.len(), cli.path.display());

    let cfg = AnalysisConfig {
        inactivity_threshold_secs: cli.threshold_secs,
        top_n:                     cli.top,
        bucket_width_secs:         cli.bucket_secs,
        moving_average_windows:    cli.windows.clone(),
        gap_fill:                  cli.gap_fill.into(),
        ..AnalysisConfig::default()
    };

    let analysis = pipeline::run_analysis(&hits, &cfg)
        .context("analysis failed")?;

    if cli.json {
        println!("{}", report::to_json(&analysis));
    } else {
        report::print_markdown(&analysis);
    }

    if !cli.predict.is_empty() {
        println!("### Predictions\n");
        println!("| Client          | Duration (s) | Unique URLs | Source          |");
        println!("|-----------------|--------------|-------------|-----------------|");
        for client in &cli.predict {
            let duration = analysis.predictor.predict_duration(client);
            let unique = analysis.predictor.predict_unique_urls(client);
            println!(
                "| {:15} | {:12.1} | {:11.1} | {:15} |",
                client, duration.value, unique.value, duration.source
            );
        }
        println!();
    }

    Ok(())
}
