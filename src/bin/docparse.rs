//! CLI binary for docparse.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! API calls and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docparse::batch::{process_batch, write_output, BatchOptions};
use docparse::config::remove_config_file;
use docparse::{
    collect_files, fetch_completed_result, mask_api_key, render, wait_for_result,
    wait_until_terminal, ApiClient, BatchProgress, Config, DocParseError, JobStatus,
    NoopBatchProgress, OcrStrategy, OutputFormat, ParseMode, ParseOptions, ParseRequest,
    PollOptions, StatusResponse, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_POLL_INTERVAL,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI batch progress using indicatif ───────────────────────────────────────

/// Terminal batch progress: a live file counter bar plus one log line per
/// finished file, rendered with [indicatif].
struct CliBatchProgress {
    bar: ProgressBar,
}

impl CliBatchProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl BatchProgress for CliBatchProgress {
    fn on_file_start(&self, _index: usize, _total_files: usize, input: &Path) {
        self.bar.set_message(input.display().to_string());
    }

    fn on_file_done(&self, input: &Path, output: &Path) {
        self.bar.println(format!(
            "  {} {} {} {}",
            green("✓"),
            input.display(),
            dim("->"),
            output.display()
        ));
        self.bar.inc(1);
    }

    fn on_file_failed(&self, input: &Path, error: &DocParseError) {
        // Long error messages would wrap and tear the bar.
        let msg = error.to_string();
        let msg = if msg.chars().count() > 80 {
            let cut: String = msg.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            msg
        };

        self.bar.println(format!(
            "  {} {} failed ({})",
            red("✗"),
            input.display(),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_files: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse a document to stdout as Markdown
  docparse parse document.pdf

  # HTML to a file
  docparse parse document.pdf --format html -o document.html

  # A whole directory into out/, recursively
  docparse parse ./scans --recursive --output-dir out

  # Globs work too (quote them so the shell does not expand them)
  docparse parse 'reports/*.pdf' --output-dir out

  # Large document: submit async, then come back for the result
  docparse parse big.pdf --async
  docparse result req_abc123 --wait -o big.md

  # Follow an async job live
  docparse status req_abc123 --watch

  # Raw API response, element list only
  docparse parse document.pdf --json --elements-only > elements.json

SUPPORTED FORMATS:
  Documents: pdf docx pptx xlsx hwp
  Images:    jpg jpeg png bmp tiff heic

ENVIRONMENT VARIABLES:
  UPSTAGE_API_KEY       API key (overrides the config file)
  DOCPARSE_CONFIG_PATH  Config file location override
  RUST_LOG              Log filter (overrides -v / -q)

SETUP:
  1. Get an API key from https://console.upstage.ai
  2. Store it:   docparse config set api-key up_...
  3. Parse:      docparse parse document.pdf -o document.md
"#;

/// Parse documents with the Upstage Document Parse API.
#[derive(Parser, Debug)]
#[command(
    name = "docparse",
    version,
    about = "Convert PDFs, Office documents, and images to HTML, Markdown, or text",
    long_about = "Convert PDFs, Office documents, and images to HTML, Markdown, or plain text \
using the Upstage Document Parse API. Documents are parsed server-side — layout analysis, OCR, \
chart and table recognition — and every rendering comes back in one response.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file.
    #[arg(long, global = true, env = "DOCPARSE_CONFIG_PATH", value_name = "PATH")]
    config: Option<PathBuf>,

    /// API key; overrides the config file.
    #[arg(long, global = true, env = "UPSTAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL, for gateways and testing.
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    endpoint: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress progress output; errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a document, a directory, or a glob of documents
    Parse(ParseArgs),
    /// Check the status of an async parse request
    Status(StatusArgs),
    /// Fetch the result of an async parse request
    Result(ResultArgs),
    /// Manage stored configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// List the available models
    Models(ModelsArgs),
    /// Show version information
    Version(VersionArgs),
}

#[derive(clap::Args, Debug)]
struct ParseArgs {
    /// File, directory, or glob pattern to parse.
    input: String,

    /// Write the result to this file instead of stdout (single file only).
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write one output per input into this directory (required for batches).
    #[arg(short = 'd', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output format [default: from config].
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Output the raw JSON response.
    #[arg(short, long)]
    json: bool,

    /// Output individual elements instead of the whole document.
    #[arg(short, long)]
    elements_only: bool,

    /// Parsing mode [default: from config].
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// OCR strategy [default: from config].
    #[arg(long, value_enum)]
    ocr: Option<OcrArg>,

    /// Model to use.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Enable chart recognition (default).
    #[arg(long, overrides_with = "no_chart_recognition")]
    chart_recognition: bool,

    /// Disable chart recognition.
    #[arg(long)]
    no_chart_recognition: bool,

    /// Merge tables that span multiple pages.
    #[arg(long = "merge-tables")]
    merge_multipage_tables: bool,

    /// Include element coordinates (default).
    #[arg(long, overrides_with = "no_coordinates")]
    coordinates: bool,

    /// Omit element coordinates from the response.
    #[arg(long)]
    no_coordinates: bool,

    /// Submit asynchronously and print the request ID instead of waiting.
    #[arg(short, long = "async")]
    async_submit: bool,

    /// Recurse into subdirectories when the input is a directory.
    #[arg(short, long)]
    recursive: bool,
}

#[derive(clap::Args, Debug)]
struct StatusArgs {
    /// The request ID returned by `parse --async`.
    request_id: String,

    /// Keep polling and update the status line until the job finishes.
    #[arg(short, long)]
    watch: bool,

    /// Seconds between polls in watch mode.
    #[arg(short, long, value_name = "SECS", default_value_t = 5)]
    interval: u64,

    /// Output the raw status response as JSON.
    #[arg(short, long, conflicts_with = "watch")]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct ResultArgs {
    /// The request ID returned by `parse --async`.
    request_id: String,

    /// Poll until the job completes instead of failing on a pending one.
    #[arg(short, long)]
    wait: bool,

    /// Seconds to wait before giving up (with --wait).
    #[arg(short, long, value_name = "SECS", default_value_t = 300)]
    timeout: u64,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format [default: from config].
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Output the raw JSON response.
    #[arg(short, long)]
    json: bool,

    /// Output individual elements instead of the whole document.
    #[arg(short, long)]
    elements_only: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print a configuration value
    Get { key: String },
    /// Show all configuration values
    List,
    /// Delete the config file after confirmation
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

#[derive(clap::Args, Debug)]
struct ModelsArgs {
    /// Output the model list as JSON.
    #[arg(short, long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct VersionArgs {
    /// Print only the version number.
    #[arg(short, long)]
    short: bool,

    /// Output version information as JSON.
    #[arg(short, long)]
    json: bool,
}

/// `--format` choices. Raw JSON output has its own flag (`--json`), so the
/// format flag only offers the three document renderings.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Html,
    Markdown,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Standard,
    Enhanced,
    Auto,
}

impl From<ModeArg> for ParseMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Standard => ParseMode::Standard,
            ModeArg::Enhanced => ParseMode::Enhanced,
            ModeArg::Auto => ParseMode::Auto,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OcrArg {
    Auto,
    Force,
}

impl From<OcrArg> for OcrStrategy {
    fn from(v: OcrArg) -> Self {
        match v {
            OcrArg::Auto => OcrStrategy::Auto,
            OcrArg::Force => OcrStrategy::Force,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };

    match &cli.command {
        Commands::Parse(args) => run_parse(&cli, args, &load_lenient(&config_path)).await,
        Commands::Status(args) => run_status(&cli, args, &load_lenient(&config_path)).await,
        Commands::Result(args) => run_result(&cli, args, &load_lenient(&config_path)).await,
        Commands::Config(cmd) => run_config(cmd, &config_path),
        Commands::Models(args) => run_models(args),
        Commands::Version(args) => run_version(args),
    }
}

/// Load the config for commands that can run without one; a broken file is
/// reported and replaced by defaults rather than aborting the run.
fn load_lenient(path: &Path) -> Config {
    match Config::load_from(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}; continuing with defaults");
            Config::default()
        }
    }
}

/// API key resolution: flag (or `UPSTAGE_API_KEY`, via clap) first, then the
/// config file. No key at all is an error before any request is made.
fn build_client(cli: &Cli, config: &Config) -> Result<ApiClient> {
    let api_key = cli
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| (!config.api_key.is_empty()).then(|| config.api_key.clone()))
        .ok_or(DocParseError::MissingApiKey)?;

    let client = ApiClient::builder(api_key)
        .base_url(&cli.endpoint)
        .build()?;
    Ok(client)
}

fn resolve_format(format: Option<FormatArg>, json: bool, config: &Config) -> Result<OutputFormat> {
    if json {
        return Ok(OutputFormat::Json);
    }
    match format {
        Some(f) => Ok(f.into()),
        None => Ok(config.format()?),
    }
}

/// Print to stdout (with a final newline) or write to a file.
fn write_rendering(rendered: &str, output: Option<&Path>, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            write_output(path, rendered)?;
            if !quiet {
                eprintln!("Output written to: {}", path.display());
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            // Terminal output gets a closing newline; file output stays exact.
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }
    Ok(())
}

// ── parse ────────────────────────────────────────────────────────────────

async fn run_parse(cli: &Cli, args: &ParseArgs, config: &Config) -> Result<()> {
    let files = collect_files(&args.input, args.recursive)?;
    let format = resolve_format(args.format, args.json, config)?;
    let options = ParseOptions {
        model: args.model.clone(),
        mode: match args.mode {
            Some(m) => m.into(),
            None => config.mode()?,
        },
        ocr: match args.ocr {
            Some(o) => o.into(),
            None => config.ocr()?,
        },
        // Default-on pairs: the negative flag wins only when it was the one
        // given last (clap clears the overridden one).
        chart_recognition: args.chart_recognition || !args.no_chart_recognition,
        merge_multipage_tables: args.merge_multipage_tables,
        coordinates: args.coordinates || !args.no_coordinates,
    };
    let client = build_client(cli, config)?;

    if args.async_submit {
        if files.len() > 1 {
            anyhow::bail!("--async supports a single file; submit files individually");
        }
        return submit_async(&client, &files[0], options).await;
    }

    // Flag first, then the configured default directory. An explicit -o pins
    // single-file output even when a default directory is configured.
    let output_dir = if args.output.is_some() {
        None
    } else {
        args.output_dir.clone().or_else(|| {
            (!config.output_dir.is_empty()).then(|| PathBuf::from(&config.output_dir))
        })
    };

    if files.len() == 1 && output_dir.is_none() {
        let file = &files[0];
        if !cli.quiet {
            eprintln!("Parsing {}...", file.display());
        }
        let response = client
            .parse(&ParseRequest::with_options(file, options))
            .await?;
        let rendered = render(&response, format, args.elements_only)?;
        return write_rendering(&rendered, args.output.as_deref(), cli.quiet);
    }

    let Some(output_dir) = output_dir else {
        anyhow::bail!("--output-dir is required for batch processing (multiple files)");
    };

    if !cli.quiet {
        eprintln!("Processing {} files...\n", files.len());
    }
    let progress: Box<dyn BatchProgress> = if cli.quiet {
        Box::new(NoopBatchProgress)
    } else {
        Box::new(CliBatchProgress::new(files.len()))
    };
    let batch_options = BatchOptions {
        parse: options,
        format,
        elements_only: args.elements_only,
    };
    let report = process_batch(&client, &files, &output_dir, &batch_options, progress.as_ref())
        .await?;

    if !cli.quiet {
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Total:   {}", report.total);
        eprintln!("  Success: {}", report.success_count());
        eprintln!("  Failed:  {}", report.failed_count());
        if !report.failures.is_empty() {
            eprintln!();
            eprintln!("Failed files:");
            for failure in &report.failures {
                eprintln!("  - {}", failure.input.display());
            }
        }
    }

    report.check()?;
    Ok(())
}

async fn submit_async(client: &ApiClient, file: &Path, options: ParseOptions) -> Result<()> {
    let response = client
        .parse_async(&ParseRequest::with_options(file, options))
        .await?;

    println!("Request submitted successfully");
    println!("Request ID: {}", response.request_id);
    println!();
    println!("Check status: docparse status {}", response.request_id);
    println!("Get result:   docparse result {}", response.request_id);
    Ok(())
}

// ── status ───────────────────────────────────────────────────────────────

async fn run_status(cli: &Cli, args: &StatusArgs, config: &Config) -> Result<()> {
    let client = build_client(cli, config)?;
    let status = client.get_status(&args.request_id).await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("Failed to serialize status")?
        );
        return Ok(());
    }

    print_status(&status);

    if args.watch && !status.status.is_terminal() {
        watch_status(&client, &args.request_id, Duration::from_secs(args.interval)).await?;
    }
    Ok(())
}

fn print_status(status: &StatusResponse) {
    println!("Request ID: {}", status.request_id);
    println!("Status: {}", status.status);
    if status.total_pages > 0 {
        println!("Progress: {}%", status.progress);
        println!(
            "Pages processed: {}/{}",
            status.pages_processed, status.total_pages
        );
    }
    if let Some(error) = status.error.as_deref().filter(|e| !e.is_empty()) {
        println!("Error: {error}");
    }
}

/// Redraw one status line per poll until the job finishes or the user
/// interrupts.
async fn watch_status(client: &ApiClient, request_id: &str, interval: Duration) -> Result<()> {
    println!("\nWatching for updates (Ctrl+C to stop)...");

    let watch = async {
        tokio::time::sleep(interval).await;
        wait_until_terminal(
            client,
            request_id,
            PollOptions::without_deadline(interval),
            |s| {
                print!("\x1b[2K\rStatus: {}, Progress: {}%", s.status, s.progress);
                let _ = io::stdout().flush();
            },
        )
        .await
    };

    let last = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!();
            return Ok(());
        }
        result = watch => result?,
    };

    match last.status {
        JobStatus::Completed => {
            println!("\n\nCompleted! Get result with: docparse result {request_id}");
            Ok(())
        }
        JobStatus::Failed => {
            let message = last.error.unwrap_or_default();
            println!("\n\nRequest failed: {message}");
            Err(DocParseError::JobFailed { message }.into())
        }
        _ => Ok(()),
    }
}

// ── result ───────────────────────────────────────────────────────────────

async fn run_result(cli: &Cli, args: &ResultArgs, config: &Config) -> Result<()> {
    let client = build_client(cli, config)?;

    let response = if args.wait {
        if !cli.quiet {
            eprintln!("Waiting for request {} to complete...", args.request_id);
        }
        let options = PollOptions {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: Some(Duration::from_secs(args.timeout)),
        };
        let response = wait_for_result(&client, &args.request_id, options, |_| {}).await?;
        if !cli.quiet {
            eprintln!("Request completed!");
        }
        response
    } else {
        fetch_completed_result(&client, &args.request_id).await?
    };

    let format = resolve_format(args.format, args.json, config)?;
    let rendered = render(&response, format, args.elements_only)?;
    write_rendering(&rendered, args.output.as_deref(), cli.quiet)
}

// ── config ───────────────────────────────────────────────────────────────

fn run_config(cmd: &ConfigCommand, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Set { key, value } => {
            // Deliberately no env overlay here: `set` must never copy an
            // environment-provided key into the file.
            let mut config = Config::load_from(path)?;
            config.set(key, value)?;
            config.save_to(path)?;
            println!("Set {key} = {value}");
        }
        ConfigCommand::Get { key } => {
            let mut config = Config::load_from(path)?;
            config.apply_env();
            let value = config.get(key)?;
            if key == "api-key" {
                println!("{}", mask_api_key(&value));
            } else {
                println!("{value}");
            }
        }
        ConfigCommand::List => {
            let mut config = Config::load_from(path)?;
            config.apply_env();
            println!("Current configuration:");
            println!();
            for (key, value) in config.entries() {
                let display = match key {
                    "api-key" if value.is_empty() => "(not set)".to_string(),
                    "api-key" => mask_api_key(&value),
                    "output-dir" if value.is_empty() => "(not set)".to_string(),
                    _ => value,
                };
                println!("  {:<16}{display}", format!("{key}:"));
            }
            println!();
            println!("Config file: {}", path.display());
        }
        ConfigCommand::Reset { force } => {
            if *force || confirm("Are you sure you want to reset all configuration? [y/N] ")? {
                remove_config_file(path)?;
                println!("Configuration reset to defaults.");
            } else {
                println!("Cancelled.");
            }
        }
        ConfigCommand::Path => println!("{}", path.display()),
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

// ── models ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ModelInfo {
    name: &'static str,
    description: &'static str,
    recommended: bool,
}

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "document-parse",
        description: "Alias for the latest stable model",
        recommended: true,
    },
    ModelInfo {
        name: "document-parse-250618",
        description: "Stable snapshot (2025-06-18)",
        recommended: false,
    },
    ModelInfo {
        name: "document-parse-nightly",
        description: "Nightly build with the newest features",
        recommended: false,
    },
];

fn run_models(args: &ModelsArgs) -> Result<()> {
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(MODELS).context("Failed to serialize model list")?
        );
        return Ok(());
    }

    println!("Available models:");
    println!();
    for model in MODELS {
        let rec = if model.recommended { " *" } else { "" };
        println!("  {:<25} {}{rec}", model.name, model.description);
    }
    println!();
    println!("* Recommended");
    Ok(())
}

// ── version ──────────────────────────────────────────────────────────────

fn run_version(args: &VersionArgs) -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    let commit = option_env!("DOCPARSE_COMMIT").unwrap_or("unknown");
    let date = option_env!("DOCPARSE_BUILD_DATE").unwrap_or("unknown");

    if args.short {
        println!("{VERSION}");
        return Ok(());
    }

    if args.json {
        let info = serde_json::json!({
            "version": VERSION,
            "commit": commit,
            "date": date,
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialize version info")?
        );
        return Ok(());
    }

    println!("docparse version {VERSION}");
    println!("  commit:  {commit}");
    println!("  built:   {date}");
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    Ok(())
}
