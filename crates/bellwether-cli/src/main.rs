//! bellwether CLI - baseline a tool server, compare baselines, inspect files.

use anyhow::{bail, Context};
use bellwether_baseline::DEFAULT_BASELINE_FILENAME;
use bellwether_compare::{compare_with, CompareOptions, Severity};
use bellwether_interview::{
    create_baseline, InterviewConfig, InterviewEngine, ProgressReporter,
};
use bellwether_transport::{
    discover, HttpConfig, HttpSession, Session, StdioConfig, StdioSession,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "bellwether")]
#[command(about = "Behavioral drift detection for JSON-RPC tool servers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interview a server and write a baseline file
    Baseline {
        /// Command line to launch the server (stdio transport)
        #[arg(trailing_var_arg = true)]
        server_command: Vec<String>,

        /// Connect over HTTP instead of launching a subprocess
        #[arg(long, conflicts_with = "server_command")]
        url: Option<String>,

        /// Output path
        #[arg(short, long, default_value = DEFAULT_BASELINE_FILENAME)]
        output: PathBuf,

        /// Ceiling on generated cases per tool
        #[arg(long)]
        max_questions: Option<usize>,

        /// Tools probed in parallel
        #[arg(long)]
        parallel: Option<usize>,

        /// Per-call timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Persona ids, in order (repeatable)
        #[arg(long = "persona")]
        personas: Vec<String>,
    },
    /// Compare two baseline files and report the drift
    Compare {
        before: PathBuf,
        after: PathBuf,

        /// Exit non-zero at or above this severity (warning | breaking)
        #[arg(long)]
        fail_on: Option<String>,

        /// Hide changes below this confidence score
        #[arg(long)]
        confidence_min: Option<u32>,

        /// Load baselines even when their integrity hash does not verify
        #[arg(long)]
        force: bool,

        /// Emit the full diff as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Print the summary of a baseline file
    Show {
        file: PathBuf,

        /// Load even when the integrity hash does not verify
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Baseline {
            server_command,
            url,
            output,
            max_questions,
            parallel,
            timeout_ms,
            personas,
        } => run_baseline(
            server_command,
            url,
            output,
            max_questions,
            parallel,
            timeout_ms,
            personas,
        ),
        Commands::Compare {
            before,
            after,
            fail_on,
            confidence_min,
            force,
            json,
        } => run_compare(before, after, fail_on, confidence_min, force, json),
        Commands::Show { file, force } => run_show(file, force),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_baseline(
    server_command: Vec<String>,
    url: Option<String>,
    output: PathBuf,
    max_questions: Option<usize>,
    parallel: Option<usize>,
    timeout_ms: Option<u64>,
    personas: Vec<String>,
) -> anyhow::Result<()> {
    let mut config = InterviewConfig::default();
    if let Some(n) = max_questions {
        config.max_questions_per_tool = n;
    }
    if let Some(n) = parallel {
        config.parallel_tools = n;
    }
    if let Some(ms) = timeout_ms {
        config.per_call_timeout = Duration::from_millis(ms);
    }
    if !personas.is_empty() {
        config.personas = personas;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (session, display_command): (Arc<dyn Session>, String) = match (&url, server_command.as_slice()) {
            (Some(url), _) => (
                Arc::new(HttpSession::connect(HttpConfig::new(url.clone()))?),
                url.clone(),
            ),
            (None, [command, args @ ..]) => {
                let stdio = StdioConfig::new(command.clone(), args.to_vec());
                let display = stdio.display_command();
                (Arc::new(StdioSession::connect(stdio).await?), display)
            }
            (None, []) => bail!("provide a server command or --url"),
        };
        info!(server = %display_command, "session established");

        let discovery = discover(session.as_ref(), config.per_call_timeout).await?;
        println!(
            "discovered {} tools on {} (protocol {})",
            discovery.tools.len(),
            discovery.server.name,
            discovery.server.protocol_version
        );

        let (reporter, mut progress_rx) = ProgressReporter::channel(64);
        let printer = tokio::spawn(async move {
            while let Some(event) = progress_rx.recv().await {
                if let Some(tool) = event.tool {
                    println!("  [{}/{}] {}", event.completed, event.total, tool);
                }
            }
        });

        let engine = InterviewEngine::new(config).with_progress(reporter);
        let result = engine.interview(Arc::clone(&session), discovery).await?;
        session.disconnect().await;
        let _ = printer.await;

        let baseline = create_baseline(&result, &display_command)?;
        bellwether_baseline::save(&baseline, &output)
            .with_context(|| format!("writing {}", output.display()))?;
        info!(path = %output.display(), partial = baseline.metadata.partial, "baseline saved");
        println!("{}", baseline.summary);
        println!("baseline written to {}", output.display());
        Ok(())
    })
}

fn run_compare(
    before: PathBuf,
    after: PathBuf,
    fail_on: Option<String>,
    confidence_min: Option<u32>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let fail_on = match fail_on.as_deref() {
        None => None,
        Some("warning") => Some(Severity::Warning),
        Some("breaking") => Some(Severity::Breaking),
        Some(other) => bail!("unknown --fail-on value '{other}' (use warning or breaking)"),
    };

    let old = load_or_exit(&before, force);
    let new = load_or_exit(&after, force);

    let options = CompareOptions {
        confidence_min,
        fail_on_severity: fail_on,
        ..Default::default()
    };
    let diff = compare_with(&old, &new, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        println!("{}", diff.summary);
        for name in &diff.tools_removed {
            println!("  removed: {name}");
        }
        for name in &diff.tools_added {
            println!("  added:   {name}");
        }
        for tool in &diff.tools_modified {
            println!("  changed: {}", tool.tool);
            for change in &tool.changes {
                println!("    [{}] {}", change.severity, change.description);
            }
        }
    }

    if options.should_fail(diff.severity) {
        std::process::exit(1);
    }
    Ok(())
}

fn run_show(file: PathBuf, force: bool) -> anyhow::Result<()> {
    let baseline = load_or_exit(&file, force);
    println!("{}", baseline.summary);
    println!(
        "captured {} ({} mode, {}ms)",
        baseline.metadata.generated_at, baseline.metadata.mode, baseline.metadata.duration_ms
    );
    for tool in &baseline.capabilities.tools {
        let samples = tool
            .response_fingerprint
            .as_ref()
            .map(|f| f.sample_count)
            .unwrap_or(0);
        println!(
            "  {} ({} samples{})",
            tool.descriptor.name,
            samples,
            if tool.partial { ", partial" } else { "" }
        );
    }
    Ok(())
}

/// Loads a baseline; integrity and format failures exit with a dedicated
/// code so CI can distinguish "corrupt file" from "drift found".
fn load_or_exit(path: &PathBuf, force: bool) -> bellwether_baseline::Baseline {
    match bellwether_baseline::load(path, force) {
        Ok(baseline) => baseline,
        Err(err) => {
            eprintln!("failed to load {}: {err}", path.display());
            std::process::exit(2);
        }
    }
}
