//! CLI binary for wikiarchive.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ArchiveConfig`, picks a browser session, and prints the batch summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wikiarchive::{
    archive_with_chrome, archive_with_http, resolve_titles, ArchiveConfig,
    ArchiveProgressCallback, BatchSummary, ChromeConfig, HttpSessionConfig, ProgressCallback,
    SkipPolicy, TitleStatus,
};

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar over the titles, one log line per title.
struct CliProgressCallback {
    bar: ProgressBar,
    title_started: Mutex<Option<Instant>>,
    images: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} titles  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Archiving");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            title_started: Mutex::new(None),
            images: AtomicUsize::new(0),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .title_started
            .lock()
            .ok()
            .and_then(|mut g| g.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl ArchiveProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_titles: usize) {
        self.bar.set_length(total_titles as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Archiving {total_titles} title(s)…"))
        ));
    }

    fn on_title_start(&self, _index: usize, _total: usize, title: &str) {
        if let Ok(mut g) = self.title_started.lock() {
            *g = Some(Instant::now());
        }
        self.images.store(0, Ordering::SeqCst);
        self.bar.set_message(title.to_string());
    }

    fn on_title_skipped(&self, title: &str, raw_source: &Path) {
        self.bar.println(format!(
            "  {} {}  {}",
            dim("↷"),
            title,
            dim(&format!("skipped, {} exists", raw_source.display()))
        ));
        if let Ok(mut g) = self.title_started.lock() {
            g.take();
        }
        self.bar.inc(1);
    }

    fn on_image_saved(&self, _title: &str, filename: &str) {
        let n = self.images.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.set_message(format!("{filename} ({n} image(s))"));
    }

    fn on_image_failed(&self, _title: &str, error: &str) {
        self.bar.println(format!("    {} {}", yellow("!"), dim(error)));
    }

    fn on_title_complete(&self, title: &str, final_document: &Path) {
        self.bar.println(format!(
            "  {} {}  {}  {}",
            green("✓"),
            title,
            dim(&final_document.display().to_string()),
            self.elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_title_error(&self, title: &str, error: &str) {
        // Keep the bar tidy: first line only, truncated.
        let first = error.lines().next().unwrap_or(error);
        let msg = if first.chars().count() > 100 {
            format!("{}\u{2026}", first.chars().take(99).collect::<String>())
        } else {
            first.to_string()
        };
        self.bar.println(format!(
            "  {} {}  {}  {}",
            red("✗"),
            title,
            red(&msg),
            self.elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Archive two pages into the current directory (opens Chrome for login)
  wikiarchive "Software:Petrel Plugins" "Foo Bar"

  # Titles from a file, one per line, into ./archive
  wikiarchive --root archive titles.txt

  # Reuse an existing Chrome profile so no login is needed
  wikiarchive --user-data-dir ~/.config/google-chrome --profile-directory "Profile 1" titles.txt

  # Public wiki over plain HTTP, JSON summary on stdout
  wikiarchive --backend http --wiki-url https://wiki.example.org --json "Main Page"

LAYOUT:
  Each title gets a directory named after its sanitised title:
    Foo_Bar/Foo_Bar.mwk    raw wiki markup (marks the title as done)
    Foo_Bar/Foo_Bar.md     Markdown intermediate
    Foo_Bar/Foo_Bar.html   normalised standalone document
    Foo_Bar/*.png|jpg|gif  images shown on the page

  To refresh a title, delete its .mwk file and run again.

EXIT CODES:
  0  every title archived or skipped
  2  some titles failed
  1  every attempted title failed, or the batch could not start

REQUIREMENTS:
  pandoc on PATH (or --pandoc), and Chrome/Chromium for the default backend.
"#;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    /// Chrome over the DevTools protocol (interactive login possible).
    Chrome,
    /// Plain HTTP requests with an optional cookie header.
    Http,
}

/// Archive wiki pages (raw markup, images, styled HTML) for offline use.
#[derive(Parser, Debug)]
#[command(
    name = "wikiarchive",
    version,
    about = "Archive wiki pages (raw markup, images, standalone HTML) for offline use",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A file with one title per line, or one or more page titles.
    #[arg(required = true)]
    titles: Vec<String>,

    /// Archive root; one sub-directory per title is created under it.
    #[arg(short, long, env = "WIKIARCHIVE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Wiki base URL (scheme and host).
    #[arg(long, env = "WIKIARCHIVE_WIKI_URL", default_value = wikiarchive::config::DEFAULT_WIKI_BASE_URL)]
    wiki_url: String,

    /// Session backend.
    #[arg(long, env = "WIKIARCHIVE_BACKEND", value_enum, default_value = "chrome")]
    backend: Backend,

    /// Run Chrome without a window.
    #[arg(long, env = "WIKIARCHIVE_HEADLESS")]
    headless: bool,

    /// Chrome/Chromium executable (auto-detected when omitted).
    #[arg(long, env = "WIKIARCHIVE_CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Chrome user-data directory holding the profile to reuse.
    #[arg(long, env = "WIKIARCHIVE_USER_DATA_DIR")]
    user_data_dir: Option<PathBuf>,

    /// Chrome profile inside the user-data directory.
    #[arg(long, env = "WIKIARCHIVE_PROFILE_DIRECTORY", default_value = "Default")]
    profile_directory: String,

    /// Cookie header sent with every request (http backend).
    #[arg(long, env = "WIKIARCHIVE_COOKIE")]
    cookie: Option<String>,

    /// Navigation / request timeout in seconds.
    #[arg(long, env = "WIKIARCHIVE_NAV_TIMEOUT", default_value_t = 60)]
    nav_timeout: u64,

    /// Converter executable.
    #[arg(long, env = "WIKIARCHIVE_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// Skip the Markdown intermediate.
    #[arg(long, env = "WIKIARCHIVE_NO_MARKDOWN")]
    no_markdown: bool,

    /// Maximum wait for an image to finish loading, in milliseconds.
    #[arg(long, env = "WIKIARCHIVE_IMAGE_TIMEOUT", default_value_t = 10_000)]
    image_timeout: u64,

    /// Text before the colon in the injected heading.
    #[arg(long, env = "WIKIARCHIVE_HEADING_PREFIX")]
    heading_prefix: Option<String>,

    /// Stylesheet linked from every archived document.
    #[arg(long, env = "WIKIARCHIVE_STYLESHEET_URL")]
    stylesheet_url: Option<String>,

    /// Treat a title as done only once its normalised document exists.
    #[arg(long, env = "WIKIARCHIVE_REQUIRE_FINAL")]
    require_final: bool,

    /// Keep the raw-source file of a title that failed later on.
    #[arg(long, env = "WIKIARCHIVE_KEEP_FAILED_SOURCE")]
    keep_failed_source: bool,

    /// Print the batch summary as JSON on stdout.
    #[arg(long, env = "WIKIARCHIVE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "WIKIARCHIVE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WIKIARCHIVE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WIKIARCHIVE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar narrates titles itself; library INFO logs would
    // tear it, so they are dropped while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Titles ───────────────────────────────────────────────────────────
    let titles = resolve_titles(&cli.titles).context("Failed to read titles")?;
    if titles.is_empty() {
        anyhow::bail!("No titles to archive");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ArchiveProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run batch ────────────────────────────────────────────────────────
    let summary = match cli.backend {
        Backend::Chrome => {
            let chrome = ChromeConfig {
                headless: cli.headless,
                chrome_path: cli.chrome_path.clone(),
                user_data_dir: cli.user_data_dir.clone(),
                profile_directory: Some(cli.profile_directory.clone()),
                navigation_timeout_secs: cli.nav_timeout,
            };
            archive_with_chrome(&titles, &chrome, &config).await
        }
        Backend::Http => {
            let http = HttpSessionConfig {
                timeout_secs: cli.nav_timeout,
                cookie: cli.cookie.clone(),
                ..Default::default()
            };
            archive_with_http(&titles, &http, &config).await
        }
    }
    .context("Archive batch could not run")?;

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary, show_progress);
    }

    Ok(ExitCode::from(summary.exit_code()))
}

/// Map CLI args to `ArchiveConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ArchiveConfig> {
    let mut builder = ArchiveConfig::builder()
        .root_dir(&cli.root)
        .wiki_base_url(&cli.wiki_url)
        .pandoc_path(&cli.pandoc)
        .produce_markdown(!cli.no_markdown)
        .image_timeout_ms(cli.image_timeout)
        .keep_source_on_failure(cli.keep_failed_source)
        .skip_policy(if cli.require_final {
            SkipPolicy::FinalDocument
        } else {
            SkipPolicy::RawSource
        });

    if let Some(ref prefix) = cli.heading_prefix {
        builder = builder.heading_prefix(prefix);
    }
    if let Some(ref url) = cli.stylesheet_url {
        builder = builder.stylesheet_url(url);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(summary: &BatchSummary, progress_shown: bool) {
    // Per-title lines were already printed by the progress bar.
    if !progress_shown {
        for outcome in &summary.outcomes {
            match &outcome.status {
                TitleStatus::Archived { final_document } => eprintln!(
                    "{} {}  {}",
                    green("✓"),
                    outcome.title,
                    dim(&final_document.display().to_string())
                ),
                TitleStatus::Skipped { raw_source } => eprintln!(
                    "{} {}  {}",
                    dim("↷"),
                    outcome.title,
                    dim(&format!("skipped, {} exists", raw_source.display()))
                ),
                TitleStatus::Failed { message, .. } => {
                    eprintln!("{} {}  {}", red("✗"), outcome.title, red(message))
                }
            }
        }
    }

    let mark = if summary.is_success() {
        green("✔")
    } else if summary.is_total_failure() {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{}  {} archived, {} skipped, {} failed  {}  {}ms",
        mark,
        bold(&summary.archived.to_string()),
        summary.skipped,
        if summary.failed > 0 {
            red(&summary.failed.to_string())
        } else {
            summary.failed.to_string()
        },
        dim(&format!(
            "{} image(s) saved, {} failed",
            summary.images_saved, summary.images_failed
        )),
        summary.total_duration_ms,
    );
}
