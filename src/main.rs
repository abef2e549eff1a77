use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use prism_core::PrismConfig;
use prism_review::fetch::HttpFetcher;
use prism_review::github::GitHubClient;
use prism_review::pipeline::{PublishOutcome, ReviewPipeline};
use prism_review::vertex::{gcloud_access_token, VertexClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "prism",
    version,
    about = "Review pull request files with Vertex AI",
    long_about = "prism sends every file changed by a pull request to a Vertex AI model\n\
                   and posts the collected feedback as a single PR comment.\n\n\
                   Without a repository and PR number it runs in debug mode: a local\n\
                   fixture is reviewed and the comment is printed instead of posted.\n\n\
                   Examples:\n  \
                     prism review                                   Review using GITHUB_REPOSITORY / PR_NUMBER\n  \
                     prism review --repository octocat/hello --pr 7 Review a specific pull request\n  \
                     prism init                                     Create a .prism.toml config file\n  \
                     prism doctor                                   Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .prism.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for the run summary and doctor checks
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Review the files changed by a pull request
    #[command(long_about = "Review the files changed by a pull request.\n\n\
        Each changed file is fetched, truncated to review.max_file_chars, and sent to\n\
        the configured Vertex AI model. All reviews are posted as one PR comment.\n\
        Failures are logged per file and never stop the run.\n\n\
        Examples:\n  prism review\n  prism review --repository octocat/hello --pr 7 --strict")]
    Review {
        /// Repository coordinate (overrides GITHUB_REPOSITORY)
        #[arg(long)]
        repository: Option<String>,
        /// Pull request number (overrides PR_NUMBER)
        #[arg(long)]
        pr: Option<u64>,
        /// Google Cloud project (overrides GCP_PROJECT_ID)
        #[arg(long)]
        project: Option<String>,
        /// Vertex AI location (overrides GCP_LOCATION)
        #[arg(long)]
        location: Option<String>,
        /// Model name (overrides GCP_MODEL)
        #[arg(long)]
        model: Option<String>,
        /// Save the comment body here if posting it fails
        #[arg(long)]
        fallback_output: Option<PathBuf>,
        /// Exit non-zero if no file was reviewed or the comment was not posted
        #[arg(long)]
        strict: bool,
    },
    /// Create a default .prism.toml configuration file
    #[command(long_about = "Create a default .prism.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .prism.toml already exists.")]
    Init,
    /// Check your prism setup and environment
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// Machine-readable JSON
    Json,
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
        println!("\x1b[1mprism\x1b[0m v{version}: pull request review with Vertex AI\n");
        println!("Quick start:");
        println!("  \x1b[36mprism init\x1b[0m      Create a .prism.toml config file");
        println!("  \x1b[36mprism doctor\x1b[0m    Check your setup");
        println!("  \x1b[36mprism review\x1b[0m    Review the current pull request\n");
    } else {
        println!("prism v{version}: pull request review with Vertex AI\n");
        println!("Quick start:");
        println!("  prism init      Create a .prism.toml config file");
        println!("  prism doctor    Check your setup");
        println!("  prism review    Review the current pull request\n");
    }

    println!("Run 'prism <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default = format!("prism={level},prism_review={level},prism_core={level}");
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("PRISM_LOG").unwrap_or_else(|_| EnvFilter::new(&default)),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PrismConfig> {
    let mut config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            PrismConfig::from_file(path)?
        }
        None => {
            let default_path = Path::new(".prism.toml");
            if default_path.exists() {
                tracing::debug!(path = %default_path.display(), "loading config");
                PrismConfig::from_file(default_path)?
            } else {
                tracing::debug!("no config file, using defaults");
                PrismConfig::default()
            }
        }
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
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

    fn symbol(&self, use_color: bool) -> &'static str {
        match (self.status, use_color) {
            ("pass", true) => "\x1b[32m\u{2713}\x1b[0m",
            ("fail", true) => "\x1b[31m\u{2717}\x1b[0m",
            (_, true) => "\x1b[33m~\x1b[0m",
            ("pass", false) => "\u{2713}",
            ("fail", false) => "\u{2717}",
            _ => "~",
        }
    }
}

fn run_doctor(config: &PrismConfig, format: OutputFormat, use_color: bool) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    if Path::new(".prism.toml").exists() {
        checks.push(CheckResult::pass("config_file", ".prism.toml found"));
    } else {
        checks.push(CheckResult::info(
            "config_file",
            ".prism.toml not found, using defaults and environment",
        ));
    }

    match &config.vertex.project {
        Some(project) => checks.push(CheckResult::pass(
            "vertex_project",
            format!(
                "{project} ({}, model: {})",
                config.vertex.location, config.vertex.model
            ),
        )),
        None => checks.push(CheckResult::fail(
            "vertex_project",
            "GCP_PROJECT_ID not set",
            "export GCP_PROJECT_ID=... or set project in .prism.toml under [vertex]",
        )),
    }

    if config.vertex.access_token.is_some() {
        checks.push(CheckResult::pass("vertex_token", "access token configured"));
    } else if gcloud_access_token().is_some() {
        checks.push(CheckResult::pass("vertex_token", "obtained from gcloud"));
    } else {
        checks.push(CheckResult::fail(
            "vertex_token",
            "no access token",
            "run 'gcloud auth login' or export VERTEX_ACCESS_TOKEN=...",
        ));
    }

    match config.run_context() {
        Ok(ctx) => match ctx.pull_request() {
            Some(pr) => checks.push(CheckResult::pass("pull_request", pr.to_string())),
            None => checks.push(CheckResult::info(
                "pull_request",
                "GITHUB_REPOSITORY or PR_NUMBER not set, reviews run in debug mode",
            )),
        },
        Err(e) => checks.push(CheckResult::fail(
            "pull_request",
            e.to_string(),
            "use the owner/repo form for GITHUB_REPOSITORY",
        )),
    }

    if config.github.token.is_some() {
        checks.push(CheckResult::pass("github_token", "GITHUB_TOKEN set"));
    } else {
        checks.push(CheckResult::fail(
            "github_token",
            "GITHUB_TOKEN not set",
            "export GITHUB_TOKEN=... (needed to post comments)",
        ));
    }

    let fixture = &config.review.debug_fixture;
    if fixture.exists() {
        checks.push(CheckResult::pass(
            "debug_fixture",
            format!("{} found", fixture.display()),
        ));
    } else {
        checks.push(CheckResult::info(
            "debug_fixture",
            format!("{} not found (only needed in debug mode)", fixture.display()),
        ));
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Text => {
            println!("prism v{} environment check\n", env!("CARGO_PKG_VERSION"));
            for check in &checks {
                let label = check.name.replace('_', " ");
                println!("  {} {label:<16} {}", check.symbol(use_color), check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }
            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            println!("\n{passed} checks passed, {failed} failed");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# prism configuration
# Environment variables (GCP_PROJECT_ID, GITHUB_REPOSITORY, PR_NUMBER, ...)
# override these values; command-line flags override both.

[vertex]
# project = "my-gcp-project"
# location = "us-central1"
# model = "gemini-2.5-flash"

[github]
# repository = "owner/repo"
# api_url = "https://api.github.com"

[review]
# max_file_chars = 25000
# timeout_secs = 60
# debug_fixture = "fixtures/debug_review.py"
# fallback_output = "prism-comment.md"
"#;

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
    init_tracing(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => print_welcome(use_color),
        Some(Command::Review {
            repository,
            pr,
            project,
            location,
            model,
            fallback_output,
            strict,
        }) => {
            let mut config = load_config(cli.config.as_deref())?;
            if repository.is_some() {
                config.github.repository = repository;
            }
            if pr.is_some() {
                config.github.pr_number = pr;
            }
            if project.is_some() {
                config.vertex.project = project;
            }
            if let Some(location) = location {
                config.vertex.location = location;
            }
            if let Some(model) = model {
                config.vertex.model = model;
            }
            if fallback_output.is_some() {
                config.review.fallback_output = fallback_output;
            }
            config.validate()?;

            let ctx = config.run_context()?;
            let timeout = config.review.timeout();
            match ctx.pull_request() {
                Some(pr) => tracing::info!(pr = %pr, model = %config.vertex.model, "starting review"),
                None => tracing::info!(model = %config.vertex.model, "starting review in debug mode"),
            }

            let access_token = match (&config.vertex.access_token, &config.vertex.project) {
                (Some(token), _) => Some(token.clone()),
                (None, Some(_)) => gcloud_access_token(),
                (None, None) => None,
            };

            let github = GitHubClient::new(&config.github, timeout)?;
            let fetcher = HttpFetcher::new(timeout)?;
            let vertex = VertexClient::new(&config.vertex, timeout)?.with_access_token(access_token);

            let pipeline = ReviewPipeline::new(github, fetcher, vertex, config.review.clone());
            let report = pipeline.run(&ctx).await;

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Text => {
                    if let PublishOutcome::Printed { body } = &report.publish {
                        println!("{body}");
                    }
                    eprint!("{report}");
                }
            }

            if strict && report.is_failure() {
                std::process::exit(1);
            }
        }
        Some(Command::Init) => {
            let path = Path::new(".prism.toml");
            if path.exists() {
                miette::bail!(".prism.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .prism.toml with default configuration");
        }
        Some(Command::Doctor) => {
            let config = load_config(cli.config.as_deref())?;
            run_doctor(&config, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prism", &mut std::io::stdout());
        }
    }

    Ok(())
}
