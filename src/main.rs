use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};

use codemetry_ai::HttpExplainer;
use codemetry_core::{
    AnalysisRequest, AnalysisResult, CodemetryConfig, Confounder, MoodWindowResult, OutputFormat,
};
use codemetry_engine::Analyzer;
use codemetry_history::GitHistoryProvider;

#[derive(Parser)]
#[command(
    name = "codemetry",
    version,
    about = "Explainable mood metrics from your git history",
    long_about = "Codemetry scores each recent day of a repository's commit history against\n\
                   its own statistical baseline and explains the result: ranked reasons,\n\
                   confidence, confounders, and optional AI-written summaries.\n\n\
                   The score is a proxy for work strain, not a judgement of any person.\n\n\
                   Examples:\n  \
                     codemetry analyze                     Score the last 7 days\n  \
                     codemetry analyze --days 30           Score the last 30 days\n  \
                     codemetry analyze --format json       Machine-readable output\n  \
                     codemetry analyze --ai                Add AI explanations\n  \
                     codemetry init                        Create a .codemetry.toml config\n  \
                     codemetry doctor                      Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .codemetry.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Score recent daily windows of commit history
    #[command(long_about = "Score recent daily windows of commit history.\n\n\
        Each calendar day (UTC) in the requested range is scored against a baseline\n\
        built from the preceding history. Output is a table by default or the full\n\
        JSON document with --format json.\n\n\
        Examples:\n  codemetry analyze --days 14\n  \
        codemetry analyze --since 2024-01-01 --until 2024-01-31\n  \
        codemetry analyze --author alice --branch develop --ai")]
    Analyze {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Number of days back from now to analyze (default: 7)
        #[arg(long, conflicts_with_all = ["since", "until"])]
        days: Option<u32>,

        /// First day to analyze (YYYY-MM-DD, requires --until)
        #[arg(long, requires = "until")]
        since: Option<String>,

        /// Last day to analyze, inclusive (YYYY-MM-DD, requires --since)
        #[arg(long, requires = "since")]
        until: Option<String>,

        /// Only count commits whose author name or email matches
        #[arg(long)]
        author: Option<String>,

        /// Branch to walk instead of HEAD
        #[arg(long)]
        branch: Option<String>,

        /// Output format
        #[arg(long, default_value = "table")]
        format: Format,

        /// Request AI explanations for each window
        #[arg(long)]
        ai: bool,

        /// AI engine: openai, anthropic, deepseek, or google
        #[arg(long)]
        ai_engine: Option<String>,

        /// Days of prior history for baselines (default: 56)
        #[arg(long)]
        baseline_days: Option<u32>,

        /// Days past each window scanned for follow-up fixes (default: 3)
        #[arg(long)]
        follow_up_horizon: Option<u32>,
    },
    /// Create a default .codemetry.toml configuration file
    #[command(long_about = "Create a default .codemetry.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .codemetry.toml already exists.")]
    Init,
    /// Check your codemetry setup and environment
    #[command(long_about = "Check your codemetry setup and environment.\n\n\
        Runs diagnostics for the git repository, config file, AI credential,\n\
        and available commit history.")]
    Doctor,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable table
    Table,
    /// Machine-readable JSON with snake_case keys
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Table => OutputFormat::Table,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mcodemetry\x1b[0m v{version} — explainable mood metrics from your git history\n");
        println!("Quick start:");
        println!("  \x1b[36mcodemetry init\x1b[0m            Create a .codemetry.toml config file");
        println!("  \x1b[36mcodemetry analyze\x1b[0m         Score the last 7 days of commits");
        println!("  \x1b[36mcodemetry analyze --ai\x1b[0m    Add AI-written explanations\n");
        println!("All commands:");
        println!("  \x1b[32manalyze\x1b[0m   Score daily windows against a statistical baseline");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("codemetry v{version} — explainable mood metrics from your git history\n");
        println!("Quick start:");
        println!("  codemetry init            Create a .codemetry.toml config file");
        println!("  codemetry analyze         Score the last 7 days of commits");
        println!("  codemetry analyze --ai    Add AI-written explanations\n");
        println!("All commands:");
        println!("  analyze   Score daily windows against a statistical baseline");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'codemetry <command> --help' for details.");
}

/// Parse a `YYYY-MM-DD` day into its UTC midnight.
fn parse_day(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .into_diagnostic()
        .wrap_err(format!("--{flag} expects YYYY-MM-DD, got '{value}'"))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

/// Overlay `CODEMETRY_AI_*` environment variables onto the loaded config.
fn apply_env_overrides(config: &mut CodemetryConfig) {
    if let Ok(key) = std::env::var("CODEMETRY_AI_API_KEY") {
        if !key.is_empty() {
            config.ai.api_key = Some(key);
        }
    }
    if let Ok(engine) = std::env::var("CODEMETRY_AI_ENGINE") {
        if !engine.is_empty() {
            config.ai.engine = engine;
        }
    }
    if let Ok(model) = std::env::var("CODEMETRY_AI_MODEL") {
        if !model.is_empty() {
            config.ai.model = Some(model);
        }
    }
    if let Ok(url) = std::env::var("CODEMETRY_AI_BASE_URL") {
        if !url.is_empty() {
            config.ai.base_url = Some(url);
        }
    }
    if let Ok(timeout) = std::env::var("CODEMETRY_AI_TIMEOUT") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.ai.timeout_secs = secs;
        }
    }
}

fn mood_cell(window: &MoodWindowResult, use_color: bool) -> String {
    let label = window.mood_label.to_string();
    if !use_color {
        return label;
    }
    let code = match window.mood_label {
        codemetry_core::MoodLabel::Drained => "\x1b[31m",
        codemetry_core::MoodLabel::Strained => "\x1b[33m",
        codemetry_core::MoodLabel::Steady => "\x1b[0m",
        codemetry_core::MoodLabel::Upbeat => "\x1b[32m",
        codemetry_core::MoodLabel::Thriving => "\x1b[1m\x1b[32m",
    };
    format!("{code}{label}\x1b[0m")
}

fn reason_cell(window: &MoodWindowResult) -> String {
    if window.reasons.is_empty() {
        return "-".into();
    }
    let shown: Vec<&str> = window
        .reasons
        .iter()
        .take(3)
        .map(|r| r.summary.as_str())
        .collect();
    let mut cell = shown.join("; ");
    let hidden = window.reasons.len().saturating_sub(3);
    if hidden > 0 {
        cell.push_str(&format!(" (+{hidden} more)"));
    }
    cell
}

fn render_table(result: &AnalysisResult, use_color: bool) {
    println!(
        "Mood analysis: {} windows (baseline {} days)\n",
        result.windows.len(),
        result.baseline_days,
    );
    println!(
        "{:<12} {:<10} {:>6} {:>6}  {}",
        "Date", "Mood", "Score", "Conf", "Top reasons"
    );
    println!("{:-<92}", "");

    for window in &result.windows {
        // Pad before coloring so escape codes don't skew column widths.
        let label = window.mood_label.to_string();
        let padding = " ".repeat(10usize.saturating_sub(label.len()));
        let mood = format!("{}{padding}", mood_cell(window, use_color));
        println!(
            "{:<12} {} {:>6.1} {:>6.2}  {}",
            window.window_label,
            mood,
            window.mood_score,
            window.confidence,
            reason_cell(window),
        );
        if !window.confounders.is_empty() {
            let caveats: Vec<String> =
                window.confounders.iter().map(|c| c.to_string()).collect();
            println!("{:<12} caveats: {}", "", caveats.join(", "));
        }
    }

    let explained: Vec<&MoodWindowResult> = result
        .windows
        .iter()
        .filter(|w| w.ai_summary.is_some())
        .collect();
    if !explained.is_empty() {
        println!("\nAI insights:");
        for window in explained {
            println!("  {}:", window.window_label);
            if let Some(summary) = &window.ai_summary {
                for bullet in &summary.explanation_bullets {
                    println!("    - {bullet}");
                }
            }
        }
    }
}

struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(config: &CodemetryConfig, use_color: bool) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Git repository
    let cwd = std::env::current_dir().into_diagnostic()?;
    let repo = git2::Repository::discover(&cwd).ok();
    match &repo {
        Some(r) => checks.push(CheckResult::pass(
            "git_repository",
            format!("detected at {}", r.path().display()),
        )),
        None => checks.push(CheckResult::fail(
            "git_repository",
            "not a git repository",
            "run codemetry from inside a git repository",
        )),
    }

    // 2. Config file
    if Path::new(".codemetry.toml").exists() {
        checks.push(CheckResult::pass("config_file", ".codemetry.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".codemetry.toml not found",
            "run 'codemetry init' to create a default config",
        ));
    }

    // 3. Keyword patterns
    match config.keywords.compile() {
        Ok(_) => checks.push(CheckResult::pass("keyword_patterns", "all patterns compile")),
        Err(e) => checks.push(CheckResult::fail(
            "keyword_patterns",
            e.to_string(),
            "fix the pattern in .codemetry.toml under [keywords]",
        )),
    }

    // 4. AI credential
    if config.ai.enabled {
        if config.ai.api_key.is_some() || std::env::var("CODEMETRY_AI_API_KEY").is_ok() {
            checks.push(CheckResult::pass(
                "ai_credential",
                format!("configured for engine '{}'", config.ai.engine),
            ));
        } else {
            checks.push(CheckResult::fail(
                "ai_credential",
                "ai enabled but no credential set",
                "export CODEMETRY_AI_API_KEY=... or set api_key in .codemetry.toml [ai]",
            ));
        }
    } else {
        checks.push(CheckResult::info(
            "ai_credential",
            "ai disabled (enable with --ai or [ai] enabled = true)",
        ));
    }

    // 5. Commit history depth
    if let Some(r) = &repo {
        let count = (|| -> std::result::Result<u64, git2::Error> {
            let mut revwalk = r.revwalk()?;
            revwalk.push_head()?;
            Ok(revwalk.count() as u64)
        })();
        match count {
            Ok(n) if n > 0 => {
                let detail = format!("{n} commits reachable from HEAD");
                if n < 20 {
                    checks.push(CheckResult::info(
                        "commit_history",
                        format!("{detail}; baselines will be thin"),
                    ));
                } else {
                    checks.push(CheckResult::pass("commit_history", detail));
                }
            }
            _ => checks.push(CheckResult::fail(
                "commit_history",
                "no commits reachable from HEAD",
                "make at least one commit before analyzing",
            )),
        }
    }

    let version = env!("CARGO_PKG_VERSION");
    println!("codemetry v{version} — Environment Check\n");
    for check in &checks {
        let sym = if use_color {
            check.colored_symbol()
        } else {
            check.symbol().to_string()
        };
        let label = check.name.replace('_', " ");
        println!("  {sym} {label:<20} {}", check.detail);
        if let Some(hint) = &check.hint {
            println!("    hint: {hint}");
        }
    }

    let passed = checks.iter().filter(|c| c.status == "pass").count();
    let failed = checks.iter().filter(|c| c.status == "fail").count();
    let info = checks.iter().filter(|c| c.status == "info").count();
    println!("\n{passed} checks passed, {failed} failed, {info} info");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Codemetry Configuration
# Scores are proxy metrics about work patterns, not judgements of people.

[analysis]
# baseline_days = 56
# follow_up_horizon_days = 3

[keywords]
# fix_pattern = '(?i)\b(fix|bug|hotfix|patch|typo|oops)\b'
# revert_pattern = '(?i)\b(revert)\b'
# wip_pattern = '(?i)\b(wip|tmp|debug|hack)\b'

[signals]
# Hours (UTC) counted as normal working time; commits outside are late-night.
# normal_hours_start = 8
# normal_hours_end = 20

[ai]
# enabled = false
# engine = "openai"          # openai | anthropic | deepseek | google
# api_key = "..."            # or export CODEMETRY_AI_API_KEY
# model = "gpt-4o-mini"
# base_url = "https://api.openai.com/v1"
# timeout_secs = 30
"#;

async fn run_analyze(
    config: CodemetryConfig,
    repo: PathBuf,
    request: AnalysisRequest,
    use_color: bool,
) -> Result<()> {
    let external = config.to_external().into_diagnostic()?;
    let ai_config = external.ai.clone();

    let mut analyzer = Analyzer::new(Arc::new(GitHistoryProvider), external);
    let mut ai_hint = false;
    if request.ai_enabled {
        match HttpExplainer::from_config(&ai_config) {
            Ok(explainer) => analyzer = analyzer.with_explainer(Arc::new(explainer)),
            Err(e) => {
                eprintln!("warning: ai explanations unavailable: {e}");
                ai_hint = true;
            }
        }
    }

    let result = analyzer.analyze(&repo, &request).await.into_diagnostic()?;

    match request.output_format {
        OutputFormat::Json => println!("{}", result.to_json_pretty().into_diagnostic()?),
        OutputFormat::Table => render_table(&result, use_color),
    }

    if ai_hint
        && result
            .windows
            .iter()
            .any(|w| w.confounders.contains(&Confounder::AiUnavailable))
    {
        eprintln!(
            "hint: export CODEMETRY_AI_API_KEY=... or set api_key in .codemetry.toml [ai]"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CodemetryConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".codemetry.toml");
            if default_path.exists() {
                CodemetryConfig::from_file(default_path).into_diagnostic()?
            } else {
                CodemetryConfig::default()
            }
        }
    };
    apply_env_overrides(&mut config);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
            Ok(())
        }
        Some(Command::Analyze {
            repo,
            days,
            since,
            until,
            author,
            branch,
            format,
            ai,
            ai_engine,
            baseline_days,
            follow_up_horizon,
        }) => {
            let since = since
                .as_deref()
                .map(|s| parse_day("since", s))
                .transpose()?;
            // The flag names an inclusive last day; the engine range is
            // half-open, so push the bound to the next midnight.
            let until = until
                .as_deref()
                .map(|s| parse_day("until", s))
                .transpose()?
                .map(|day| day + chrono::Duration::days(1));

            if let Some(engine) = ai_engine {
                config.ai.engine = engine;
            }

            let request = AnalysisRequest {
                since,
                until,
                days: if since.is_some() { None } else { days.or(Some(7)) },
                author,
                branch,
                baseline_days: baseline_days.unwrap_or(config.analysis.baseline_days),
                follow_up_horizon_days: follow_up_horizon
                    .unwrap_or(config.analysis.follow_up_horizon_days),
                ai_enabled: ai || config.ai.enabled,
                ai_engine: config.ai.engine.clone(),
                output_format: format.into(),
            };

            run_analyze(config, repo, request, use_color).await
        }
        Some(Command::Init) => {
            let path = Path::new(".codemetry.toml");
            if path.exists() {
                miette::bail!(".codemetry.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .codemetry.toml with default configuration");
            Ok(())
        }
        Some(Command::Doctor) => run_doctor(&config, use_color),
    }
}
