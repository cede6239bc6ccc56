//! CLI binary for naskh.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` (or `Replacement` pairs) and prints results.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use naskh::{
    edit_file, inspect, ConversionConfig, ConversionProgress, PageError, Replacement,
};
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

/// Terminal progress: a live bar plus one log line per page. Pages arrive
/// strictly in order, so a single start-time slot is enough.
struct CliProgress {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
}

impl CliProgress {
    /// Create a callback whose progress-bar length is set by `on_start`
    /// (called once the page count is known).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        // Spinner only until the total is known.
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl ConversionProgress for CliProgress {
    fn on_start(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} pages…"))
        ));
    }

    fn on_page_start(&self, page: usize, _ordinal: usize, _total: usize) {
        *self.page_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("page {page}"));
    }

    fn on_page_done(&self, page: usize, paragraphs: usize) {
        let elapsed = self.page_elapsed();
        self.bar.println(format!(
            "  {} Page {:>4}  {:<14}  {}",
            green("✓"),
            page,
            dim(&format!("{paragraphs} paragraphs")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_failed(&self, page: usize, error: &PageError) {
        let elapsed = self.page_elapsed();
        let msg = error.to_string();
        let msg = if msg.chars().count() > 80 {
            let cut: String = msg.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            msg
        };
        self.bar.println(format!(
            "  {} Page {:>4}  {}  {}",
            red("✗"),
            page,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_finish(&self, processed: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} pages extracted",
                green("✔"),
                bold(&processed.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages extracted  ({} failed)",
                if processed == 0 { red("✘") } else { cyan("⚠") },
                bold(&processed.to_string()),
                processed + failed,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Free tier: first 10 pages, paced slowly (key from GEMINI_API_KEY)
  naskh convert kitab.pdf

  # Paid run over a page range, keeping the footnotes
  naskh convert kitab.pdf --api-key $KEY --pages 12-48 --include-footnotes

  # Strip a recurring watermark and choose the output path
  naskh convert kitab.pdf --strip "مكتبة الوقفية" -o clean.docx

  # Fix recurring misreadings in a finished document
  naskh edit kitab.docx --replace "اللة=الله" --replace "احمد=أحمد"

  # Page count and metadata, no API key needed
  naskh inspect kitab.pdf

FREE TIER:
  Without --api-key the converter authenticates with GEMINI_API_KEY (or
  API_KEY) from the environment, processes at most 10 pages per run, and
  waits 15 seconds between calls. --api-key lifts the cap and drops the
  pause to 3 seconds.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY   Gemini API key (free-tier limits still apply)
  API_KEY          Fallback key variable
  NASKH_MODEL      Override the model ID
  NASKH_PAGES      Default page selection

PDFIUM:
  Page rendering uses the pdfium shared library. naskh looks for it in the
  working directory first (./libpdfium.so), then in the system library path.
"#;

/// Convert scanned Arabic book PDFs to Word documents.
#[derive(Parser, Debug)]
#[command(
    name = "naskh",
    version,
    about = "Convert scanned Arabic book PDFs to Word documents using Gemini",
    long_about = "Convert scanned Arabic book PDFs into formatted Word documents. Each page is \
rasterised, read by a Gemini vision model, split into its customary zones (running head, \
heading, body, footnotes, page number), and written out with right-to-left-appropriate \
alignment and page breaks.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "NASKH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "NASKH_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a scanned PDF into a Word document.
    Convert(ConvertArgs),
    /// Apply literal find-and-replace pairs to an existing .docx.
    Edit(EditArgs),
    /// Print a PDF's page count and metadata, no conversion.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Path to the source PDF.
    input: PathBuf,

    /// Write the document here. Default: the input name with .docx.
    #[arg(short, long, env = "NASKH_OUTPUT")]
    output: Option<PathBuf>,

    /// Page selection: all, 5, or 3-15 (1-indexed, inclusive).
    #[arg(long, env = "NASKH_PAGES", default_value = "all")]
    pages: String,

    /// Gemini API key. Omitting it keeps the run on the free tier.
    #[arg(long, env = "NASKH_API_KEY")]
    api_key: Option<String>,

    /// Gemini model identifier.
    #[arg(long, env = "NASKH_MODEL", default_value = "gemini-1.5-pro-latest")]
    model: String,

    /// Keep the running-head and page-number zones.
    #[arg(long)]
    include_header_footer: bool,

    /// Keep the footnote zone (text below the separator line).
    #[arg(long)]
    include_footnotes: bool,

    /// Strings to delete from every paragraph, comma-separated. Repeatable.
    #[arg(long, value_delimiter = ',')]
    strip: Vec<String>,

    /// Path to a text file with a custom extraction prompt.
    #[arg(long, env = "NASKH_PROMPT")]
    prompt: Option<PathBuf>,

    /// Longest rendered page edge in pixels.
    #[arg(long, env = "NASKH_MAX_PIXELS", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(100..=8000))]
    max_pixels: u32,

    /// Per-remote-call timeout in seconds.
    #[arg(long, env = "NASKH_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print the run report (per-page stats) as JSON to stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "NASKH_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Path to the .docx to edit.
    input: PathBuf,

    /// Write the edited document here. Default: <input>_edited.docx.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// A find-and-replace pair, OLD=NEW. Repeatable; applied in order.
    #[arg(long = "replace", value_name = "OLD=NEW", value_parser = parse_replacement, required = true)]
    replace: Vec<Replacement>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Path to the PDF.
    input: PathBuf,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides all the feedback that matters to the user.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress && !args.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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
        Command::Convert(args) => run_convert(args, cli.quiet, show_progress).await,
        Command::Edit(args) => run_edit(args, cli.quiet),
        Command::Inspect(args) => run_inspect(args).await,
    }
}

async fn run_convert(args: ConvertArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let config = build_config(&args, show_progress).await?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("docx"));

    let output = naskh::convert(&args.input, &config)
        .await
        .context("Conversion failed")?;

    // Atomic write: temp file + rename, so a crash never leaves a truncated
    // document under the final name.
    write_atomic(&output_path, &output.document)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if args.json {
        let report = serde_json::json!({
            "output": output_path,
            "pages": output.pages,
            "stats": output.stats,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {:.1}s  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed_pages,
            stats.selected_pages,
            stats.total_duration_ms as f64 / 1000.0,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_prompt_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }

    Ok(())
}

fn run_edit(args: EditArgs, quiet: bool) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| edited_output(&args.input));

    let replaced = edit_file(&args.input, &output, &args.replace).context("Edit failed")?;

    if !quiet {
        eprintln!(
            "{}  {} occurrence(s) replaced  →  {}",
            if replaced > 0 { green("✔") } else { cyan("⚠") },
            bold(&replaced.to_string()),
            bold(&output.display().to_string()),
        );
    }
    Ok(())
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let summary = inspect(&args.input).await.context("Failed to inspect PDF")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else {
        println!("File:         {}", args.input.display());
        if let Some(ref t) = summary.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = summary.author {
            println!("Author:       {}", a);
        }
        println!("Pages:        {}", summary.page_count);
        println!("PDF Version:  {}", summary.pdf_version);
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(args: &ConvertArgs, show_progress: bool) -> Result<ConversionConfig> {
    let prompt = if let Some(ref path) = args.prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let (start, end) = parse_pages(&args.pages)?;

    let mut builder = ConversionConfig::builder()
        .page_range(start, end)
        .include_header_footer(args.include_header_footer)
        .include_footnotes(args.include_footnotes)
        .strip_strings(args.strip.clone())
        .model(args.model.clone())
        .max_rendered_pixels(args.max_pixels)
        .api_timeout_secs(args.api_timeout);

    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(prompt) = prompt {
        builder = builder.prompt_override(prompt);
    }
    if show_progress {
        builder = builder.progress(CliProgress::new_dynamic());
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages`: "all", a single page, or an inclusive range "A-B".
fn parse_pages(s: &str) -> Result<(usize, usize)> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        // end 0 means "through the last page"
        return Ok((1, 0));
    }

    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok((start, end));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok((page, page))
}

/// Parse one `--replace OLD=NEW` pair. NEW may be empty (pure deletion).
fn parse_replacement(s: &str) -> Result<Replacement, String> {
    let Some((find, replace)) = s.split_once('=') else {
        return Err(format!("expected OLD=NEW, got '{s}'"));
    };
    if find.is_empty() {
        return Err("the OLD side of OLD=NEW must not be empty".to_string());
    }
    Ok(Replacement::new(find, replace))
}

/// Default output path for `edit`: `<stem>_edited.docx` next to the input.
fn edited_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "edited".to_string());
    input.with_file_name(format!("{stem}_edited.docx"))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("docx.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}
