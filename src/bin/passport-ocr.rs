//! CLI binary for passport-ocr.
//!
//! A thin shim over the library crate: maps flags to `ExtractionConfig`,
//! drives a `Session`, and prints the results table.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use passport_ocr::config::DEFAULT_MODEL;
use passport_ocr::render::render_html_document;
use passport_ocr::{
    BatchSummary, ExtractionConfig, FileRecord, FileStatus, NoopObserver, QueueObserver,
    Session, Settings, StatusBadge, TableRow,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

// ── CLI queue observer using indicatif ───────────────────────────────────────

/// Terminal observer: a spinner while the batch is validated, then a bar
/// with one log line per finished file.
struct CliObserver {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Checking files…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            started: Mutex::new(None),
        }
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Scanning");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl QueueObserver for CliObserver {
    fn on_batch_accepted(&self, accepted: usize, rejected: usize) {
        self.activate_bar(accepted);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Scanning {accepted} passport image(s)…"))
        ));
        if rejected > 0 {
            self.bar.println(format!(
                "  {} {rejected} non-image file(s) skipped",
                yellow("⚠")
            ));
        }
    }

    fn on_file_start(&self, _index: usize, record: &FileRecord, _all: &[FileRecord]) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(truncate(&record.file_name, 32));
    }

    fn on_file_complete(&self, index: usize, record: &FileRecord, _all: &[FileRecord]) {
        let secs = self.elapsed_secs();
        let line = match record.status {
            FileStatus::Success => format!(
                "  {} {:>3}  {:<28}  {}  {}",
                green("✓"),
                index + 1,
                truncate(&record.file_name, 28),
                if record.data.passport_no.is_empty() {
                    dim("(no passport no)")
                } else {
                    bold(&record.data.passport_no)
                },
                dim(&format!("{secs:.1}s")),
            ),
            _ => format!(
                "  {} {:>3}  {:<28}  {}  {}",
                red("✗"),
                index + 1,
                truncate(&record.file_name, 28),
                red(&truncate(record.error.as_deref().unwrap_or_default(), 80)),
                dim(&format!("{secs:.1}s")),
            ),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        self.bar.finish_and_clear();
        if summary.failed == 0 {
            eprintln!(
                "{} {} file(s) extracted successfully",
                green("✔"),
                bold(&summary.succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) extracted  ({} failed)",
                if summary.failed == summary.processed {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&summary.succeeded.to_string()),
                summary.processed,
                red(&summary.failed.to_string()),
            );
        }
    }
}

/// Clears the bar when dropped so an error return never leaves a spinner
/// running on the terminal.
struct BarGuard(ProgressBar);

impl Drop for BarGuard {
    fn drop(&mut self) {
        if !self.0.is_finished() {
            self.0.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Save your Google AI Studio key once
  passport-ocr config --api-key AIza...

  # Scan a few photos and write LDB_Passport_OCR_<timestamp>.xlsx here
  passport-ocr scan p1.jpg p2.png

  # Scan a folder, export elsewhere, also write an HTML table
  passport-ocr scan ./photos -o ./out --html ./out/table.html

  # Print the records as JSON, no spreadsheet
  passport-ocr scan --json --no-export p1.jpg > records.json

  # Interactive session: add batches, review, export, reset
  passport-ocr shell

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Overrides the stored key for this run
  PASSPORT_OCR_SETTINGS   Settings file (default: <config dir>/passport-ocr/settings.json)
  PASSPORT_OCR_MODEL      Gemini model ID (default: gemini-2.5-flash)
  RUST_LOG                Log filter, e.g. passport_ocr=debug
"#;

/// Extract passport data from photos with Google Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "passport-ocr",
    version,
    about = "Extract passport data from photos with Google Gemini and export to Excel",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PASSPORT_OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "PASSPORT_OCR_QUIET")]
    quiet: bool,

    /// Settings file holding the API key.
    #[arg(long, global = true, env = "PASSPORT_OCR_SETTINGS")]
    settings: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PASSPORT_OCR_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save or show the Gemini API key.
    Config {
        /// Key to store (Google AI Studio keys start with "AIza").
        #[arg(long)]
        api_key: Option<String>,

        /// Show the stored key (masked) and the settings path.
        #[arg(long)]
        show: bool,
    },

    /// Extract one batch of photos, print the table, export to Excel.
    Scan(ScanArgs),

    /// Interactive session: add batches, view the table, export, reset.
    Shell(ModelArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Image files or directories.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory for the exported workbook.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Also write the results table as an HTML page.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Print the records as JSON on stdout instead of a table.
    #[arg(long)]
    json: bool,

    /// Skip the Excel export.
    #[arg(long)]
    no_export: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Gemini model ID.
    #[arg(long, env = "PASSPORT_OCR_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Downscale images wider than this before upload (64–8192).
    #[arg(long, default_value_t = 1536,
          value_parser = clap::value_parser!(u32).range(64..=8192))]
    max_width: u32,

    /// Per-request API timeout in seconds.
    #[arg(long, env = "PASSPORT_OCR_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Gemini API base URL.
    #[arg(long, env = "GEMINI_ENDPOINT", hide = true)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        command,
        verbose,
        quiet,
        settings,
        no_progress,
    } = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let json = matches!(&command, Command::Scan(a) if a.json);
    let show_progress = !quiet && !no_progress && !json;
    let filter = if verbose {
        "debug"
    } else if quiet || show_progress {
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

    let settings_path = match settings {
        Some(p) => p,
        None => Settings::default_path()
            .context("No config directory on this platform; pass --settings <PATH>")?,
    };

    match command {
        Command::Config { api_key, show } => run_config(&settings_path, api_key, show),
        Command::Scan(args) => {
            let mut session = open_session(&settings_path, &args.model)?;
            run_scan(&mut session, &args, show_progress, quiet).await
        }
        Command::Shell(args) => {
            let mut session = open_session(&settings_path, &args)?;
            run_shell(&mut session, show_progress, quiet).await
        }
    }
}

/// Map CLI args to `ExtractionConfig` and open the session.
fn open_session(settings_path: &Path, args: &ModelArgs) -> Result<Session> {
    let mut builder = ExtractionConfig::builder()
        .model(args.model.clone())
        .max_width(args.max_width);
    if let Some(ref endpoint) = args.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(secs) = args.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    let config = builder.build().context("Invalid configuration")?;

    let mut session = Session::open(settings_path, config).context("Failed to open session")?;

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            debug!("Using GEMINI_API_KEY from the environment");
            session.override_api_key(&key)?;
        }
    }
    Ok(session)
}

fn run_config(settings_path: &Path, api_key: Option<String>, show: bool) -> Result<()> {
    let mut settings = Settings::load(settings_path)?;
    let saving = api_key.is_some();

    if let Some(key) = api_key {
        let looks_valid = settings.set_api_key(&key)?;
        if !looks_valid {
            eprintln!("{} Google AI key should start with \"AIza...\"", yellow("⚠"));
        }
        settings.save(settings_path)?;
        eprintln!("{} Settings saved! Ready to scan.", green("✔"));
    }

    if show || !saving {
        println!("Settings:  {}", settings_path.display());
        if settings.has_api_key() {
            println!("API key:   {}", settings.masked_key());
        } else {
            println!("API key:   {}", dim("(not set)"));
        }
        if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.trim().is_empty()) {
            println!("{}", dim("GEMINI_API_KEY is set and overrides the stored key"));
        }
    }
    Ok(())
}

async fn run_scan(
    session: &mut Session,
    args: &ScanArgs,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let paths = expand_paths(&args.files).await?;
    scan_batch(session, paths, show_progress, quiet).await?;

    if args.json {
        let json = serde_json::to_string_pretty(session.records())
            .context("Failed to serialise records")?;
        println!("{json}");
    } else {
        print_table(&session.table());
    }

    if let Some(ref html_path) = args.html {
        tokio::fs::write(html_path, render_html_document(session.records()))
            .await
            .with_context(|| format!("Failed to write {}", html_path.display()))?;
        if !quiet {
            eprintln!("{} HTML table → {}", green("✔"), bold(&html_path.display().to_string()));
        }
    }

    if !args.no_export {
        let path = session.export(&args.output).await.context("Export failed")?;
        if !quiet {
            eprintln!(
                "{} Excel exported → {}  ({} records)",
                green("✔"),
                bold(&path.display().to_string()),
                session.records().len()
            );
        }
    }
    Ok(())
}

/// Submit one batch with the terminal observer when progress is on.
async fn scan_batch(
    session: &mut Session,
    paths: Vec<PathBuf>,
    show_progress: bool,
    quiet: bool,
) -> Result<BatchSummary> {
    let summary = if show_progress {
        let observer = CliObserver::new();
        let _guard = BarGuard(observer.bar.clone());
        session.submit(paths, &observer).await?
    } else {
        session.submit(paths, &NoopObserver).await?
    };

    if !quiet && !show_progress {
        eprintln!(
            "Extracted {}/{} file(s)",
            summary.succeeded, summary.processed
        );
        if summary.failed > 0 {
            eprintln!("  {} file(s) failed", summary.failed);
        }
    }
    Ok(summary)
}

/// Replace each directory with its files, sorted by name. Files pass through.
async fn expand_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        let is_dir = tokio::fs::metadata(input)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            out.push(input.clone());
            continue;
        }
        let mut entries = tokio::fs::read_dir(input)
            .await
            .with_context(|| format!("Failed to read directory {}", input.display()))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                files.push(entry.path());
            }
        }
        files.sort();
        out.extend(files);
    }
    Ok(out)
}

fn print_table(rows: &[TableRow]) {
    if rows.is_empty() {
        println!("{}", dim("No files yet."));
        return;
    }
    println!(
        "{}",
        bold(&format!(
            "{:>3}  {:<24}  {:<12}  {:<24}  {:<12}  {:<12}  {:<12}  {:<6}  {}",
            "#", "File", "Passport No", "Full Name", "Birth", "Expiry", "Nationality", "Gender",
            "Status"
        ))
    );
    for row in rows {
        let badge = match row.badge {
            StatusBadge::Success => green(row.badge.label()),
            StatusBadge::Failed => red(row.badge.label()),
            StatusBadge::Processing => yellow(row.badge.label()),
        };
        println!(
            "{:>3}  {:<24}  {:<12}  {:<24}  {:<12}  {:<12}  {:<12}  {:<6}  {}",
            row.index,
            truncate(&row.file_name, 24),
            truncate(&row.fields[0], 12),
            truncate(&row.fields[1], 24),
            truncate(&row.fields[2], 12),
            truncate(&row.fields[5], 12),
            truncate(&row.fields[6], 12),
            truncate(&row.fields[7], 6),
            badge
        );
        if let Some(ref note) = row.status_note {
            println!("     {}", dim(&format!("↳ {note}")));
        }
    }
}

// ── Interactive shell ────────────────────────────────────────────────────────

const SHELL_HELP: &str = "\
Commands:
  add <paths…>    scan images (files or folders; quote paths with spaces)
  table           show the results table
  export [dir]    write the Excel workbook (default: current dir)
  reset           delete all records
  key <KEY>       save a new API key
  help            this text
  quit            leave the shell";

/// Split a command line on whitespace, keeping double-quoted runs together.
fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in s.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

async fn run_shell(session: &mut Session, show_progress: bool, quiet: bool) -> Result<()> {
    eprintln!("{} {}", cyan("◆"), bold("Passport OCR shell"));
    if !session.settings().has_api_key() {
        eprintln!(
            "{} No API key configured. Use: key <KEY>",
            yellow("⚠")
        );
    }
    eprintln!("{}", dim("Type 'help' for commands."));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("passport-ocr> ");
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        let (cmd, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match cmd {
            "" => {}
            "add" => {
                let args: Vec<PathBuf> = split_args(rest).into_iter().map(PathBuf::from).collect();
                if args.is_empty() {
                    eprintln!("usage: add <paths…>");
                    continue;
                }
                let result = match expand_paths(&args).await {
                    Ok(paths) => scan_batch(session, paths, show_progress, quiet).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(_) => print_table(&session.table()),
                    Err(e) => eprintln!("{} {e:#}", red("✘")),
                }
            }
            "table" | "ls" => print_table(&session.table()),
            "export" => {
                let dir = split_args(rest).into_iter().next().unwrap_or_else(|| ".".into());
                match session.export(&dir).await {
                    Ok(path) => eprintln!(
                        "{} Excel exported → {}  ({} records)",
                        green("✔"),
                        bold(&path.display().to_string()),
                        session.records().len()
                    ),
                    Err(e) => eprintln!("{} {e}", red("✘")),
                }
            }
            "reset" | "clear" => {
                if session.records().is_empty() {
                    continue;
                }
                eprint!("Delete all data? This cannot be undone. [y/N] ");
                io::stderr().flush().ok();
                let answer = lines
                    .next_line()
                    .await
                    .context("Failed to read stdin")?
                    .unwrap_or_default();
                if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                    session.reset();
                    eprintln!("{} All data cleared", green("✔"));
                }
            }
            "key" => match session.set_api_key(rest) {
                Ok(looks_valid) => {
                    if !looks_valid {
                        eprintln!("{} Google AI key should start with \"AIza...\"", yellow("⚠"));
                    }
                    eprintln!("{} Settings saved! Ready to scan.", green("✔"));
                }
                Err(e) => eprintln!("{} {e}", red("✘")),
            },
            "help" | "?" => eprintln!("{SHELL_HELP}"),
            "quit" | "exit" | "q" => break,
            other => eprintln!("Unknown command '{other}'. Type 'help'."),
        }
    }
    Ok(())
}
