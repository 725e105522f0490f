//! CLI binary for pdf-photo-sort.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SortConfig` and prints results.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_photo_sort::{
    inspect, normalize_save_dir, sort_pdf, MissingFieldStyle, MultiLinkPolicy, PagePlan,
    ProgressCallback, SortConfig, SortProgressCallback, SortReport,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live download bar plus one log line per filed photo. Downloads finish
/// out of order, so the bar only counts.
struct CliProgressCallback {
    bar: ProgressBar,
    failed: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed: AtomicUsize::new(0),
        })
    }
}

impl SortProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_downloads: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} photos  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_downloads as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Downloading");
        self.bar.reset_eta();
    }

    fn on_fetch_start(&self, page_num: usize, _url: &str) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_fetch_complete(&self, _page_num: usize, _bytes: usize) {
        self.bar.inc(1);
    }

    fn on_fetch_error(&self, page_num: usize, error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} Page {:>3}  {}", red("✗"), page_num, red(error)));
        self.bar.inc(1);
    }

    fn on_page_sorted(&self, page_num: usize, final_path: &Path) {
        self.bar.set_prefix("Filing");
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            green("✓"),
            page_num,
            dim(&final_path.display().to_string())
        ));
    }

    fn on_page_failed(&self, page_num: usize, error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} Page {:>3}  {}", red("✗"), page_num, red(error)));
    }

    fn on_run_complete(&self, sorted: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!("{} {} photos filed", green("✔"), bold(&sorted.to_string()));
        } else {
            eprintln!(
                "{} {} photos filed  ({} failed)",
                cyan("⚠"),
                bold(&sorted.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Sort a local photo log
  pdf-photo-sort site-log.pdf ./photos

  # Sort a photo log published on the web, with a progress bar
  pdf-photo-sort --progress https://example.com/logs/week-12.pdf ./photos

  # Show what would happen without downloading anything
  pdf-photo-sort --dry-run site-log.pdf ./photos

  # Machine-readable report
  pdf-photo-sort --json site-log.pdf ./photos > report.json

OUTPUT LAYOUT:
  {save_directory}/{description}/{description}_{page}_[{taken}_]{job}.jpeg
  Names that are already taken get _1, _2, … appended.

ENVIRONMENT VARIABLES:
  PDF_PHOTO_SORT_*   Fallback for every flag, e.g. PDF_PHOTO_SORT_CONCURRENCY=4
  PDFIUM_LIB_PATH    Path to an existing libpdfium
  RUST_LOG           Log filter, overrides -v / -q
"#;

#[derive(Parser, Debug)]
#[command(
    name = "pdf-photo-sort",
    version,
    about = "Download the photos linked from a PDF photo log and file them by description",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF photo log: a local path or an http(s) URL.
    path_to_pdf: String,

    /// Directory that receives one subdirectory per photo description.
    save_directory: String,

    /// Photo downloads in flight at once.
    #[arg(short = 'j', long, env = "PDF_PHOTO_SORT_CONCURRENCY", default_value_t = 10)]
    concurrency: usize,

    /// Pages with several photo links.
    #[arg(long, env = "PDF_PHOTO_SORT_MULTI_LINK", value_enum, default_value = "keep-all")]
    multi_link: MultiLinkArg,

    /// Write absent taken dates and job numbers as `None` in file names.
    #[arg(long, env = "PDF_PHOTO_SORT_LEGACY_NONE_NAMES")]
    legacy_none_names: bool,

    /// Stop after the first failed download instead of skipping it.
    #[arg(long, env = "PDF_PHOTO_SORT_FAIL_FAST")]
    fail_fast: bool,

    /// Per-download timeout in seconds (default: none).
    #[arg(long, env = "PDF_PHOTO_SORT_TIMEOUT")]
    timeout: Option<u64>,

    /// Treat non-2xx responses as failed downloads.
    #[arg(long, env = "PDF_PHOTO_SORT_REQUIRE_SUCCESS")]
    require_success: bool,

    #[arg(long, env = "PDF_PHOTO_SORT_PASSWORD")]
    password: Option<String>,

    /// Explicit pdfium library file.
    #[arg(long, env = "PDF_PHOTO_SORT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print the planned name of every photo without downloading.
    #[arg(long, alias = "inspect")]
    dry_run: bool,

    /// Print the report (or plan) as JSON on stdout.
    #[arg(long, env = "PDF_PHOTO_SORT_JSON")]
    json: bool,

    /// Show a progress bar on stderr.
    #[arg(long, env = "PDF_PHOTO_SORT_PROGRESS")]
    progress: bool,

    #[arg(short, long, env = "PDF_PHOTO_SORT_VERBOSE")]
    verbose: bool,

    #[arg(short, long, env = "PDF_PHOTO_SORT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum MultiLinkArg {
    KeepAll,
    LastWins,
    Reject,
}

impl From<MultiLinkArg> for MultiLinkPolicy {
    fn from(v: MultiLinkArg) -> Self {
        match v {
            MultiLinkArg::KeepAll => MultiLinkPolicy::KeepAll,
            MultiLinkArg::LastWins => MultiLinkPolicy::LastWins,
            MultiLinkArg::Reject => MultiLinkPolicy::Reject,
        }
    }
}

/// Exit status for a failed parse: 0 for `--help`/`--version`, 1 otherwise.
fn parse_exit_code(e: &clap::Error) -> i32 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if parse_exit_code(&e) == 0 => e.exit(),
        Err(e) => {
            if let Err(io_err) = e.print() {
                eprintln!("{e}\n(failed to print usage: {io_err})");
            }
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let show_progress = cli.progress && !cli.quiet && !cli.json && !cli.dry_run;
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SortProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let save_dir = normalize_save_dir(&cli.save_directory);

    if cli.dry_run {
        let plans = inspect(&cli.path_to_pdf, &config)
            .await
            .context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plans).context("Failed to serialise plan")?
            );
        } else {
            print_plan(&plans, &save_dir);
        }
        return Ok(());
    }

    let report = sort_pdf(&cli.path_to_pdf, &save_dir, &config)
        .await
        .with_context(|| format!("Failed to sort photos from {}", cli.path_to_pdf))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress && cli.verbose {
        print_summary(&report);
    }

    Ok(())
}

fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SortConfig> {
    let missing_fields = if cli.legacy_none_names {
        MissingFieldStyle::LegacyNone
    } else {
        MissingFieldStyle::Empty
    };

    let mut builder = SortConfig::builder()
        .concurrency(cli.concurrency)
        .multi_link(cli.multi_link.clone().into())
        .missing_fields(missing_fields)
        .fail_fast(cli.fail_fast)
        .require_success_status(cli.require_success);

    if let Some(secs) = cli.timeout {
        builder = builder.fetch_timeout_secs(secs);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_plan(plans: &[PagePlan], save_dir: &Path) {
    for plan in plans {
        match (&plan.directory, &plan.file_name) {
            (Some(dir), Some(name)) => println!(
                "Page {:>3}  {} link(s)  →  {}",
                plan.page_number,
                plan.links.len(),
                save_dir.join(dir).join(name).display()
            ),
            _ if plan.links.is_empty() => {
                println!("Page {:>3}  {}", plan.page_number, dim("no photo link"))
            }
            _ => println!(
                "Page {:>3}  {} link(s)  →  {}",
                plan.page_number,
                plan.links.len(),
                red("no usable description; would stay unsorted")
            ),
        }
    }
}

fn print_summary(report: &SortReport) {
    let s = &report.stats;
    eprintln!(
        "Filed {}/{} photos from {} pages in {}ms",
        s.files_sorted, s.downloads_attempted, s.total_pages, s.duration_ms
    );
    if s.downloads_failed > 0 {
        eprintln!("  {} downloads failed", s.downloads_failed);
    }
    if s.files_unsorted > 0 {
        eprintln!("  {} photos left unsorted", s.files_unsorted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_positionals_parse() {
        let cli = Cli::try_parse_from(["pdf-photo-sort", "log.pdf", "out"]).unwrap();
        assert_eq!(cli.path_to_pdf, "log.pdf");
        assert_eq!(cli.save_directory, "out");
        assert_eq!(cli.concurrency, 10);
    }

    #[test]
    fn missing_save_directory_exits_one() {
        let err = Cli::try_parse_from(["pdf-photo-sort", "log.pdf"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(parse_exit_code(&err), 1);
    }

    #[test]
    fn no_arguments_exits_one() {
        let err = Cli::try_parse_from(["pdf-photo-sort"]).unwrap_err();
        assert_eq!(parse_exit_code(&err), 1);
    }

    #[test]
    fn extra_argument_exits_one() {
        let err = Cli::try_parse_from(["pdf-photo-sort", "a.pdf", "out", "extra"]).unwrap_err();
        assert_eq!(parse_exit_code(&err), 1);
    }

    #[test]
    fn help_and_version_exit_zero() {
        let err = Cli::try_parse_from(["pdf-photo-sort", "--help"]).unwrap_err();
        assert_eq!(parse_exit_code(&err), 0);
        let err = Cli::try_parse_from(["pdf-photo-sort", "--version"]).unwrap_err();
        assert_eq!(parse_exit_code(&err), 0);
    }
}
