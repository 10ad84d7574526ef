//! CLI command definitions, routing, and tracing setup.

use std::io::Read;

use chatsync_core::{SyncCoordinator, SyncObserver, SyncOutcome, SyncState};
use chatsync_flomo::format_flomo_content;
use chatsync_platforms::{PageSnapshot, PlatformRegistry, extract_conversation};
use chatsync_shared::{
    AppConfig, ExtensionConfig, SyncId, config_file_path, init_config, load_config, save_config,
    validate_webhook_url,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// chatsync: save AI chat transcripts to Flomo.
#[derive(Parser)]
#[command(
    name = "chatsync",
    version,
    about = "Extract ChatGPT, Claude, Kimi and DeepSeek conversations and save them to Flomo.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// The chat page to read.
#[derive(clap::Args)]
pub(crate) struct PageArgs {
    /// URL the page was loaded from; selects the platform.
    #[arg(long)]
    pub url: String,

    /// Saved page HTML, or `-` for stdin.
    #[arg(long, value_name = "FILE|-")]
    pub html: String,

    /// Conversation title; defaults to the title shown on the page.
    #[arg(long)]
    pub title: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract a conversation and send it to Flomo.
    Sync {
        #[command(flatten)]
        page: PageArgs,

        /// Flomo webhook URL (overrides the config file).
        #[arg(long, env = "FLOMO_WEBHOOK_URL")]
        webhook_url: Option<String>,

        /// Tag prefix (overrides the config file).
        #[arg(long)]
        tag: Option<String>,

        /// Print the sync report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract a conversation and print it without sending anything.
    Extract {
        #[command(flatten)]
        page: PageArgs,

        /// Print the note exactly as it would be posted to Flomo.
        #[arg(long)]
        payload: bool,

        /// Tag prefix used with --payload (overrides the config file).
        #[arg(long)]
        tag: Option<String>,
    },

    /// List supported platforms in matching order.
    Platforms,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Update values in the config file.
    Set {
        /// Flomo incoming-webhook URL.
        #[arg(long)]
        webhook_url: Option<String>,

        /// Tag prefix for every note.
        #[arg(long)]
        default_tag: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "chatsync=info",
        1 => "chatsync=debug",
        _ => "chatsync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync {
            page,
            webhook_url,
            tag,
            json,
        } => cmd_sync(&page, webhook_url, tag, json).await,
        Command::Extract { page, payload, tag } => cmd_extract(&page, payload, tag),
        Command::Platforms => cmd_platforms(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Set {
                webhook_url,
                default_tag,
            } => cmd_config_set(webhook_url, default_tag),
        },
    }
}

/// Read page HTML from a file, or stdin for `-`.
fn read_html(source: &str) -> Result<String> {
    if source == "-" {
        let mut html = String::new();
        std::io::stdin()
            .read_to_string(&mut html)
            .map_err(|e| eyre!("cannot read HTML from stdin: {e}"))?;
        Ok(html)
    } else {
        std::fs::read_to_string(source).map_err(|e| eyre!("cannot read '{source}': {e}"))
    }
}

fn load_page(args: &PageArgs) -> Result<PageSnapshot> {
    let html = read_html(&args.html)?;
    Ok(PageSnapshot::new(&args.url, html)?)
}

fn extension_config(webhook_url: Option<String>, tag: Option<String>) -> Result<ExtensionConfig> {
    let config = load_config()?;
    Ok(ExtensionConfig::from(&config).with_overrides(webhook_url, tag))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_sync(
    args: &PageArgs,
    webhook_url: Option<String>,
    tag: Option<String>,
    json: bool,
) -> Result<()> {
    let config = extension_config(webhook_url, tag)?;
    let page = load_page(args)?;

    info!(url = page.url(), "syncing conversation");

    let mut coordinator = SyncCoordinator::start_default(config, page)?;
    let progress = CliProgress::new();
    let report = coordinator.sync(args.title.as_deref(), &progress).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match &report.outcome {
        SyncOutcome::Success => {
            println!(
                "✓ Chat synchronized to Flomo successfully ({})",
                report.title.as_deref().unwrap_or_default()
            );
            Ok(())
        }
        SyncOutcome::Failure(failure) => {
            eprintln!("✗ {failure}");
            Err(eyre!("sync {} failed", report.sync_id))
        }
    }
}

fn cmd_extract(args: &PageArgs, payload: bool, tag: Option<String>) -> Result<()> {
    let page = load_page(args)?;
    let extracted = extract_conversation(&PlatformRegistry::new(), &page, args.title.as_deref())?;

    if payload {
        let config = extension_config(None, tag)?;
        let note = format_flomo_content(
            &extracted.title,
            &extracted.markdown,
            &extracted.platform,
            config.tag_prefix(),
        );
        println!("{note}");
    } else {
        println!("{}", extracted.markdown);
    }
    Ok(())
}

fn cmd_platforms() -> Result<()> {
    let registry = PlatformRegistry::new();
    for (i, platform) in registry.platforms().enumerate() {
        println!(
            "{}. {:<9} {:<9} {}",
            i + 1,
            platform.name(),
            platform.display_name(),
            platform.domains().join(", ")
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", config_file_path()?.display());
    println!("{toml_str}");
    Ok(())
}

fn cmd_config_set(webhook_url: Option<String>, default_tag: Option<String>) -> Result<()> {
    if webhook_url.is_none() && default_tag.is_none() {
        return Err(eyre!("nothing to set: pass --webhook-url and/or --default-tag"));
    }

    let mut config = load_config()?;
    if let Some(url) = webhook_url {
        let url = url.trim().to_string();
        validate_webhook_url(&url)?;
        config.flomo.webhook_url = Some(url);
    }
    if let Some(tag) = default_tag {
        config.flomo.default_tag = tag.trim().to_string();
    }

    let path = save_config(&config)?;
    println!("Config saved to: {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner that follows the coordinator's state changes.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl SyncObserver for CliProgress {
    fn state_changed(&self, _sync_id: SyncId, state: &SyncState) {
        match state {
            SyncState::Idle => self.spinner.set_message("Preparing sync"),
            SyncState::Requesting => self.spinner.set_message("Reading conversation"),
            SyncState::Delivering => self.spinner.set_message("Sending to Flomo"),
            SyncState::Settled(_) => self.spinner.finish_and_clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_with_overrides() {
        let cli = Cli::try_parse_from([
            "chatsync",
            "-vv",
            "sync",
            "--url",
            "https://claude.ai/chat/1",
            "--html",
            "-",
            "--title",
            "Notes",
            "--webhook-url",
            "https://flomoapp.com/iwh/a/b/",
            "--tag",
            "#ai",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Sync {
            page,
            webhook_url,
            tag,
            json,
        } = cli.command
        else {
            panic!("expected sync");
        };
        assert_eq!(page.html, "-");
        assert_eq!(page.title.as_deref(), Some("Notes"));
        assert_eq!(webhook_url.as_deref(), Some("https://flomoapp.com/iwh/a/b/"));
        assert_eq!(tag.as_deref(), Some("#ai"));
        assert!(!json);
    }

    #[test]
    fn extract_requires_url_and_html() {
        assert!(Cli::try_parse_from(["chatsync", "extract", "--html", "page.html"]).is_err());
        assert!(
            Cli::try_parse_from(["chatsync", "extract", "--url", "https://chatgpt.com/", "--html", "p.html", "--payload"])
                .is_ok()
        );
    }

    #[test]
    fn missing_html_file_is_reported() {
        let err = read_html("/definitely/not/here.html").unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
