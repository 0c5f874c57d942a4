//! CLI binary for greenlogistics-ai.
//!
//! `analyze` runs one document from the terminal; `serve` starts the
//! browser UI. Both are thin shims mapping flags to `AnalysisConfig`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use greenlogistics_ai::{
    analyze_file, web, AnalysisConfig, AnalysisOutcome, AnalysisProgressCallback, AnalysisState,
    Credential, InferenceBackend, ProgressCallback, TransportOption,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One spinner whose message follows the request state.
struct SpinnerCallback {
    bar: ProgressBar,
}

impl SpinnerCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for SpinnerCallback {
    fn on_state_change(&self, _from: AnalysisState, to: AnalysisState) {
        match to {
            AnalysisState::ExtractionParsed => {
                self.bar.println(format!("{} {}", green("✓"), to.label()));
            }
            s if s.is_failure() => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", red("✗"), s.label());
            }
            AnalysisState::Done => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), to.label());
            }
            s => self.bar.set_message(s.label()),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a scanned invoice with Gemini
  GEMINI_API_KEY=AIza... greenlogistics analyze invoice.jpg

  # Save the combined report
  greenlogistics analyze bill_of_lading.pdf -o analisis_greenlogisticsai.json

  # Use another provider (key read from OPENAI_API_KEY)
  greenlogistics --provider openai --model gpt-4.1-mini analyze packing_list.png

  # Start the browser UI
  greenlogistics serve --addr 0.0.0.0:8501

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY            Gemini API key for `analyze` (the browser UI asks for it)
  GREENLOGISTICS_PROVIDER   gemini (default) or any edgequake-llm provider name
  GREENLOGISTICS_MODEL      Model ID override
  GREENLOGISTICS_ADDR       Listen address for `serve`
  PDFIUM_LIB_PATH           Path to libpdfium, needed for PDF uploads
"#;

/// Extract shipment data from logistics documents and compare road vs.
/// intermodal routes.
#[derive(Parser, Debug)]
#[command(
    name = "greenlogistics",
    version,
    about = "Extract shipment data from logistics documents and compare road vs. intermodal routes",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "GREENLOGISTICS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "GREENLOGISTICS_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Inference backend: gemini, or an edgequake-llm provider (openai, anthropic, ollama, …).
    #[arg(long, global = true, env = "GREENLOGISTICS_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Model ID (default: gemini-2.0-flash for Gemini, gpt-4.1-nano otherwise).
    #[arg(long, global = true, env = "GREENLOGISTICS_MODEL")]
    model: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, env = "GREENLOGISTICS_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens per model call.
    #[arg(long, global = true, env = "GREENLOGISTICS_MAX_TOKENS")]
    max_tokens: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one shipping document (PNG, JPEG or PDF).
    Analyze {
        /// Path to the document.
        file: PathBuf,

        /// Gemini API key.
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Media type override (otherwise guessed from the extension).
        #[arg(long)]
        media_type: Option<String>,

        /// Write the combined JSON report to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the JSON report to stdout instead of the summary.
        #[arg(long)]
        json: bool,

        /// Disable the spinner.
        #[arg(long, env = "GREENLOGISTICS_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Serve the browser UI.
    Serve {
        /// Listen address.
        #[arg(long, env = "GREENLOGISTICS_ADDR", default_value = "127.0.0.1:8501")]
        addr: String,

        /// Largest accepted upload, in MiB.
        #[arg(long, env = "GREENLOGISTICS_MAX_UPLOAD_MB", default_value_t = 20)]
        max_upload_mb: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let spinner_active = matches!(
        cli.command,
        Command::Analyze { json: false, no_progress: false, .. }
    ) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner_active {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Analyze {
            ref file,
            ref api_key,
            ref media_type,
            ref output,
            json,
            ..
        } => {
            let progress: Option<ProgressCallback> = if spinner_active {
                Some(SpinnerCallback::new() as Arc<dyn AnalysisProgressCallback>)
            } else {
                None
            };
            let config = build_config(&cli.model, progress, None)?;
            let credential = api_key.as_deref().and_then(Credential::new);

            let outcome = analyze_file(file, media_type.as_deref(), &config, credential.as_ref())
                .await
                .with_context(|| format!("Could not analyse {}", file.display()))?;

            if let (Some(path), Some(report)) = (output, outcome.report()) {
                report
                    .report
                    .write_to_file(path)
                    .await
                    .context("Failed to write report")?;
                if !cli.quiet {
                    eprintln!("{} Report saved to {}", green("✔"), bold(&path.display().to_string()));
                }
            }

            if json {
                print_json(&outcome)?;
            } else {
                print_summary(&outcome);
            }

            if outcome.state().is_failure() {
                std::process::exit(2);
            }
            Ok(())
        }
        Command::Serve {
            ref addr,
            max_upload_mb,
        } => {
            let config = build_config(&cli.model, None, Some(max_upload_mb.saturating_mul(1024 * 1024)))?;
            if !cli.quiet {
                eprintln!("{} {}", cyan("◆"), bold(&format!("Serving GreenLogisticsAI on http://{addr}")));
            }
            web::start_server(addr, web::AppState::new(config))
                .await
                .context("Server stopped with an error")
        }
    }
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(
    args: &ModelArgs,
    progress: Option<ProgressCallback>,
    max_upload_bytes: Option<usize>,
) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder().backend(InferenceBackend::from_name(&args.provider));

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = args.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    if let Some(bytes) = max_upload_bytes {
        builder = builder.max_upload_bytes(bytes);
    }

    builder.build().context("Invalid configuration")
}

fn print_json(outcome: &AnalysisOutcome) -> Result<()> {
    match (outcome.report(), outcome.failure()) {
        (Some(report), _) => println!("{}", report.report.to_pretty_json()?),
        (None, Some(failure)) => println!(
            "{}",
            serde_json::to_string_pretty(failure).context("Failed to serialise failure")?
        ),
        (None, None) => {}
    }
    Ok(())
}

fn print_summary(outcome: &AnalysisOutcome) {
    if let Some(record) = outcome.extracted() {
        println!("{} {}", cyan("◆"), bold("Data extracted by the AI"));
        for f in &record.fields {
            println!("  {:<22} {}", dim(&f.label), f.value);
        }
        println!();
    }

    if let Some(failure) = outcome.failure() {
        println!("{}", red(&failure.to_string()));
        println!("{}", failure.raw);
        return;
    }

    if let Some(report) = outcome.report() {
        let cmp = &report.comparison;
        println!("{} {}", cyan("◆"), bold("Route comparison"));
        print_option("🚛 Road", &cmp.ground);
        print_option("🚂 Intermodal", &cmp.intermodal);
        println!("{} {}", bold("💡 AI recommendation:"), cmp.recommendation);
    }
}

fn print_option(title: &str, option: &TransportOption) {
    println!(
        "  {}  €{}  ·  {} h  ·  {} kg CO₂",
        bold(title),
        option.cost_eur,
        option.transit_hours,
        option.co2_kg
    );
    for a in &option.advantages {
        println!("    {} {}", green("+"), a);
    }
    for d in &option.disadvantages {
        println!("    {} {}", red("-"), d);
    }
}
