//! blogeval - quality evaluation for generated blog posts
//!
//! ## Commands
//!
//! - `content`: score a post's title, HTML body and tags
//! - `run`: score an agent run from its telemetry snapshot
//! - `evaluate`: both of the above, export the record and run metrics, apply
//!   the quality gate
//! - `show`: reload and render a previously exported record

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use blogeval_core::obs::EvaluationSpan;
use blogeval_core::observer::DEFAULT_METRICS_FILE;
use blogeval_core::reporter::DEFAULT_REPORT_FILE;
use blogeval_core::{
    read_evaluation_record, AgentEvaluator, AgentPerformanceScore, ContentAxes,
    ContentEvaluator, ContentQualityScore, EvaluationConfig, EvaluationReporter, GateVerdict,
    QualityGate, TelemetrySnapshot, METRICS,
};

#[derive(Parser)]
#[command(name = "blogeval")]
#[command(author = "Blogeval Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rule-based quality evaluation for generated blog posts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a post along readability, structure, SEO and completeness
    Content {
        /// Post title
        #[arg(long)]
        title: String,

        /// Path to the HTML body
        #[arg(long)]
        content: PathBuf,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,

        /// Show the per-axis breakdown, including fallbacks
        #[arg(long)]
        axes: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Score an agent run from a telemetry snapshot (JSON)
    Run {
        /// Path to the telemetry snapshot
        #[arg(long)]
        telemetry: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Score content and run together, export the record and apply the gate
    Evaluate {
        #[arg(long)]
        title: String,

        #[arg(long)]
        content: PathBuf,

        #[arg(long, default_value = "")]
        tags: String,

        #[arg(long)]
        telemetry: PathBuf,

        /// Record path (default: <report dir>/evaluation_report.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for exported records
        #[arg(long, env = "EVALUATION_REPORT_DIR")]
        report_dir: Option<PathBuf>,

        /// Gate threshold, overriding MIN_QUALITY_SCORE
        #[arg(long)]
        min_quality: Option<f64>,

        /// Exit non-zero when content is below the threshold
        #[arg(long)]
        fail_below: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Render a previously exported record after verifying its digest
    Show {
        /// Path to the record
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Everything `evaluate` produced, for JSON output.
#[derive(Debug, Serialize)]
struct EvaluationOutcome {
    content_quality: ContentQualityScore,
    agent_performance: AgentPerformanceScore,
    gate: GateVerdict,
    record_path: Option<PathBuf>,
    metrics_path: Option<PathBuf>,
}

/// Rendered output of `evaluate` plus what the gate decided.
struct EvaluateReport {
    rendered: String,
    verdict: Option<GateVerdict>,
    fail_below: bool,
}

impl EvaluateReport {
    /// Error out when the gate blocked and `--fail-below` was given.
    fn enforce_gate(self) -> Result<()> {
        match self.verdict {
            Some(verdict) if !verdict.passed && self.fail_below => bail!(verdict
                .reason
                .unwrap_or_else(|| "content quality below threshold".to_string())),
            _ => Ok(()),
        }
    }
}

struct EvaluateArgs {
    title: String,
    content: PathBuf,
    tags: String,
    telemetry: PathBuf,
    output: Option<PathBuf>,
    report_dir: Option<PathBuf>,
    min_quality: Option<f64>,
    fail_below: bool,
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    blogeval_core::telemetry::init_tracing(cli.json, level);

    let config = EvaluationConfig::from_env().context("Invalid evaluation configuration")?;

    let result = match cli.command {
        Commands::Content {
            title,
            content,
            tags,
            axes,
            format,
        } => cmd_content(&title, &content, &tags, axes, format),
        Commands::Run { telemetry, format } => cmd_run(&telemetry, format),
        Commands::Evaluate {
            title,
            content,
            tags,
            telemetry,
            output,
            report_dir,
            min_quality,
            fail_below,
            format,
        } => {
            let args = EvaluateArgs {
                title,
                content,
                tags,
                telemetry,
                output,
                report_dir,
                min_quality,
                fail_below,
                format,
            };
            match cmd_evaluate(&config, args).await {
                Ok(report) => {
                    print!("{}", report.rendered);
                    report.enforce_gate()
                }
                Err(err) => Err(err),
            }
        }
        Commands::Show { path, format } => cmd_show(&path, format),
    };

    METRICS.flush();
    result
}

fn cmd_content(title: &str, path: &Path, tags: &str, axes: bool, format: OutputFormat) -> Result<()> {
    let html = read_text_file(path)?;
    let evaluator = ContentEvaluator::new();

    if axes {
        let breakdown = evaluator.evaluate_axes(title, &html, tags);
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&breakdown)?),
            OutputFormat::Text => print!("{}", render_axes(&breakdown)),
        }
        return Ok(());
    }

    let score = evaluator.evaluate_content(title, &html, tags);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&score)?),
        OutputFormat::Text => print!("{}", EvaluationReporter.render_content(&score)),
    }
    Ok(())
}

fn cmd_run(path: &Path, format: OutputFormat) -> Result<()> {
    let snapshot: TelemetrySnapshot = read_json_file(path)?;
    let score = AgentEvaluator::new().evaluate_snapshot(&snapshot);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&score)?),
        OutputFormat::Text => print!("{}", EvaluationReporter.render_agent(&score)),
    }
    Ok(())
}

/// Runs both evaluators on the blocking pool and returns the rendered output.
async fn cmd_evaluate(config: &EvaluationConfig, args: EvaluateArgs) -> Result<EvaluateReport> {
    if !config.enable_evaluation {
        info!("evaluation disabled by ENABLE_EVALUATION");
        return Ok(EvaluateReport {
            rendered: String::new(),
            verdict: None,
            fail_below: args.fail_below,
        });
    }

    let html = read_text_file(&args.content)?;
    let snapshot: TelemetrySnapshot = read_json_file(&args.telemetry)?;
    let threshold = args.min_quality.unwrap_or(config.min_quality_score);
    let gate = QualityGate::new(threshold).context("Invalid --min-quality")?;
    let report_dir = args
        .report_dir
        .unwrap_or_else(|| config.report_dir.clone());

    let metrics_path = if config.export_metrics {
        let path = report_dir.join(DEFAULT_METRICS_FILE);
        write_json_file(&path, &snapshot)?;
        info!(path = %path.display(), "run metrics exported");
        Some(path)
    } else {
        None
    };

    let (title, tags) = (args.title, args.tags);
    let content_task = tokio::task::spawn_blocking(move || {
        ContentEvaluator::new().evaluate_content(&title, &html, &tags)
    });
    let agent_task =
        tokio::task::spawn_blocking(move || AgentEvaluator::new().evaluate_snapshot(&snapshot));
    let (content_score, agent_score) =
        tokio::try_join!(content_task, agent_task).context("Evaluator task failed")?;

    let evaluation_id = uuid::Uuid::new_v4().to_string();
    let _span = EvaluationSpan::enter(&evaluation_id);

    let record_path = if config.export_evaluation {
        let path = args
            .output
            .unwrap_or_else(|| report_dir.join(DEFAULT_REPORT_FILE));
        let written = EvaluationReporter
            .export_evaluation(&content_score, &agent_score, &path)
            .with_context(|| format!("Failed to export evaluation to {:?}", path))?;
        Some(written)
    } else {
        None
    };

    let verdict = gate.evaluate(&content_score);
    if let Some(reason) = &verdict.reason {
        warn!(evaluation_id = %evaluation_id, "{}", reason);
    }

    let rendered = match args.format {
        OutputFormat::Json => {
            let outcome = EvaluationOutcome {
                content_quality: content_score,
                agent_performance: agent_score,
                gate: verdict.clone(),
                record_path: record_path.clone(),
                metrics_path: metrics_path.clone(),
            };
            format!("{}\n", serde_json::to_string_pretty(&outcome)?)
        }
        OutputFormat::Text => {
            let mut text = EvaluationReporter.render_content(&content_score);
            text.push('\n');
            text.push_str(&EvaluationReporter.render_agent(&agent_score));
            if let Some(path) = &record_path {
                text.push_str(&format!("Evaluation report exported to {}\n", path.display()));
            }
            if let Some(path) = &metrics_path {
                text.push_str(&format!("Run metrics exported to {}\n", path.display()));
            }
            text
        }
    };

    Ok(EvaluateReport {
        rendered,
        verdict: Some(verdict),
        fail_below: args.fail_below,
    })
}

fn cmd_show(path: &Path, format: OutputFormat) -> Result<()> {
    let record = read_evaluation_record(path)
        .with_context(|| format!("Failed to load evaluation record {:?}", path))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => print!("{}", EvaluationReporter.render_record(&record)),
    }
    Ok(())
}

fn render_axes(axes: &ContentAxes) -> String {
    let mut out = String::new();
    for report in axes.iter() {
        out.push_str(&format!("{:<13} {:>6.1}", report.axis.title(), report.score()));
        if let blogeval_core::AxisOutcome::Fallback { reason, .. } = &report.outcome {
            out.push_str(&format!("  (fallback: {})", reason));
        }
        out.push('\n');
        for issue in &report.issues {
            out.push_str(&format!("  ! {}\n", issue));
        }
        for rec in &report.recommendations {
            out.push_str(&format!("  > {}\n", rec));
        }
    }
    out
}

fn read_text_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_text_file(path)?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let content = dir.join("post.html");
        std::fs::write(&content, "<h2>Intro</h2><p>Short post about testing.</p>").unwrap();

        let telemetry = dir.join("telemetry.json");
        let snapshot = json!({
            "agents": { "writer": { "agent_name": "writer", "tool_calls": 4 } },
            "tasks": [
                { "task_id": "t1", "agent_name": "writer", "status": "completed", "duration": 8.0, "output_length": 700 }
            ],
            "total_duration": 8.0
        });
        std::fs::write(&telemetry, serde_json::to_vec(&snapshot).unwrap()).unwrap();
        (content, telemetry)
    }

    fn args(content: PathBuf, telemetry: PathBuf, output: Option<PathBuf>) -> EvaluateArgs {
        EvaluateArgs {
            title: "Testing small changes".to_string(),
            content,
            tags: "testing".to_string(),
            telemetry,
            output,
            report_dir: None,
            min_quality: None,
            fail_below: false,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn cli_parses_evaluate_flags() {
        let cli = Cli::try_parse_from([
            "blogeval",
            "--verbose",
            "evaluate",
            "--title",
            "A title",
            "--content",
            "post.html",
            "--telemetry",
            "run.json",
            "--min-quality",
            "65",
            "--fail-below",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Evaluate {
                min_quality,
                fail_below,
                format,
                ..
            } => {
                assert_eq!(min_quality, Some(65.0));
                assert!(fail_below);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[tokio::test]
    async fn evaluate_renders_content_then_agent_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let (content, telemetry) = write_inputs(dir.path());
        let output = dir.path().join("out").join("record.json");

        let config = EvaluationConfig {
            export_metrics: false,
            ..EvaluationConfig::default()
        };
        let report = cmd_evaluate(&config, args(content, telemetry, Some(output.clone())))
            .await
            .unwrap();
        let rendered = &report.rendered;

        let content_at = rendered.find("CONTENT QUALITY EVALUATION").unwrap();
        let agent_at = rendered.find("AGENT PERFORMANCE EVALUATION").unwrap();
        assert!(content_at < agent_at);
        assert!(rendered.contains("Evaluation report exported to"));

        let record = read_evaluation_record(&output).unwrap();
        assert!(record.content_quality.overall_score() < 70.0);
        assert!(!rendered.contains("Run metrics exported to"));
    }

    #[tokio::test]
    async fn export_metrics_flag_controls_run_metrics_file() {
        let dir = tempfile::tempdir().unwrap();
        let (content, telemetry) = write_inputs(dir.path());
        let report_dir = dir.path().join("reports");
        let mut a = args(content.clone(), telemetry.clone(), None);
        a.report_dir = Some(report_dir.clone());

        let report = cmd_evaluate(&EvaluationConfig::default(), a).await.unwrap();
        let metrics = report_dir.join(DEFAULT_METRICS_FILE);
        assert!(report.rendered.contains("Run metrics exported to"));
        let exported: TelemetrySnapshot = read_json_file(&metrics).unwrap();
        assert_eq!(exported.tasks.len(), 1);
        assert_eq!(exported.agents["writer"].tool_calls, 4);

        std::fs::remove_file(&metrics).unwrap();
        let config = EvaluationConfig {
            export_metrics: false,
            ..EvaluationConfig::default()
        };
        let mut a = args(content, telemetry, None);
        a.report_dir = Some(report_dir.clone());
        cmd_evaluate(&config, a).await.unwrap();
        assert!(!metrics.exists());
        assert!(report_dir.join(DEFAULT_REPORT_FILE).exists());
    }

    #[tokio::test]
    async fn fail_below_turns_gate_into_error() {
        let dir = tempfile::tempdir().unwrap();
        let (content, telemetry) = write_inputs(dir.path());
        let mut a = args(content, telemetry, None);
        a.fail_below = true;
        let config = EvaluationConfig {
            export_evaluation: false,
            export_metrics: false,
            ..EvaluationConfig::default()
        };

        let report = cmd_evaluate(&config, a).await.unwrap();
        assert!(!report.rendered.is_empty());
        let err = report.enforce_gate().unwrap_err();
        assert!(err.to_string().contains("is below minimum threshold (70)"));
    }

    #[tokio::test]
    async fn disabled_evaluation_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvaluationConfig {
            enable_evaluation: false,
            ..EvaluationConfig::default()
        };
        let report = cmd_evaluate(
            &config,
            args(dir.path().join("missing.html"), dir.path().join("missing.json"), None),
        )
        .await
        .unwrap();
        assert!(report.rendered.is_empty());
        assert!(report.verdict.is_none());
        report.enforce_gate().unwrap();
    }

    #[test]
    fn axes_rendering_marks_fallbacks() {
        let axes = ContentEvaluator::new().evaluate_axes("t", "<div></div>", "");
        let text = render_axes(&axes);
        assert!(text.starts_with("Readability"));
        assert!(text.contains("(fallback: text contains no countable words)"));
    }
}
