//! tvdriver CLI
//!
//! Runs the settings flow against a device on the device cloud, or performs a
//! single key press or field fill for debugging a screen.
//!
//! Credentials come from the environment (or a `.env` file):
//!   HEADSPIN_API_TOKEN, APP_ID, UDID
//!
//! Usage:
//!   tvdriver run                                  # full settings flow
//!   tvdriver run --field qa=//VoiceTextEditBox    # custom fields
//!   tvdriver press up right right select          # navigate by hand
//!   tvdriver fill //VoiceTextEditBox latest       # one resilient fill

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tvdriver::{
    AutomationEngine, Config, FieldEntry, FlowTimings, FocusableSearch, LabelReporter,
    LabelSink, SessionGuard, SettingsFlow,
};

#[derive(Parser)]
#[command(name = "tvdriver")]
#[command(about = "Remote UI automation for TV apps on a device cloud")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// WebDriver endpoint (defaults to the device-cloud hub for the API token)
    #[clap(long, env = "APPIUM_URL", global = true)]
    appium_url: Option<String>,

    /// Device-cloud API base used for session labels
    #[clap(long, env = "HEADSPIN_API_BASE", global = true)]
    api_base: Option<String>,

    /// Pause after each key press, in milliseconds
    #[clap(long, default_value_t = 1000, global = true)]
    settle_ms: u64,
}

#[derive(Args, Debug, Clone, Copy)]
struct SearchArgs {
    /// How many ancestor levels to climb from the selector hint
    #[clap(long, default_value_t = tvdriver::search::DEFAULT_MAX_UP)]
    max_up: usize,

    /// How many children to try under each ancestor
    #[clap(long, default_value_t = tvdriver::search::DEFAULT_MAX_DOWN)]
    max_down: usize,
}

impl From<SearchArgs> for FocusableSearch {
    fn from(args: SearchArgs) -> Self {
        FocusableSearch::new(args.max_up, args.max_down)
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Field to fill as TEXT=SELECTOR; repeat for several fields
    #[clap(long = "field", value_parser = parse_field)]
    fields: Vec<FieldEntry>,

    #[command(flatten)]
    search: SearchArgs,

    /// Seconds to wait for the app to load before the first key press
    #[clap(long, default_value_t = 5)]
    app_load_secs: u64,

    /// Seconds to wait before ending the session
    #[clap(long, default_value_t = 10)]
    exit_wait_secs: u64,

    /// Do not post step labels to the device-cloud API
    #[clap(long)]
    no_labels: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate to settings and fill the required fields
    Run(RunArgs),
    /// Press one or more remote-control keys
    Press {
        /// Key names (Home, Select, Up, Down, ...), case of the first letter ignored
        #[clap(required = true)]
        keys: Vec<String>,
    },
    /// Type text into the nearest focusable node around a selector
    Fill {
        /// XPath hint for the target field
        selector: String,
        /// Text to deliver
        text: String,
        #[command(flatten)]
        search: SearchArgs,
    },
}

fn parse_field(raw: &str) -> Result<FieldEntry, String> {
    match raw.split_once('=') {
        Some((text, selector)) if !selector.trim().is_empty() => {
            Ok(FieldEntry::new(text, selector.trim()))
        }
        _ => Err(format!("expected TEXT=SELECTOR, got '{raw}'")),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &ConnectionArgs) -> Result<Config> {
    let mut config = Config::from_env().context("Critical configuration missing")?;
    if let Some(url) = &args.appium_url {
        config = config.with_appium_url(url);
    }
    if let Some(base) = &args.api_base {
        config = config.with_api_base(base);
    }
    Ok(config.with_settle_delay(Duration::from_millis(args.settle_ms)))
}

fn main() -> Result<()> {
    // A missing .env file is fine; variables may come from the real environment.
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli.connection)?;

    let result = match cli.command {
        Commands::Run(args) => run_flow(&config, args),
        Commands::Press { keys } => press_keys(&config, &keys),
        Commands::Fill {
            selector,
            text,
            search,
        } => fill(&config, &selector, &text, search.into()),
    };

    if let Err(e) = &result {
        error!("An unrecoverable error occurred during the automation: {:#}", e);
    }
    result
}

fn run_flow(config: &Config, args: RunArgs) -> Result<()> {
    let mut flow = if args.fields.is_empty() {
        SettingsFlow::default()
    } else {
        SettingsFlow::new(args.fields)
    };
    flow = flow.with_search(args.search.into()).with_timings(FlowTimings {
        app_load: Duration::from_secs(args.app_load_secs),
        before_exit: Duration::from_secs(args.exit_wait_secs),
        ..FlowTimings::default()
    });

    let reporter = LabelReporter::from_config(config);
    let labels: Option<&dyn LabelSink> = if args.no_labels {
        None
    } else {
        Some(&reporter)
    };

    let session = SessionGuard::open(config).context("Could not start a device session")?;
    let report = flow.run(&*session, labels)?;
    session.close().context("Failed to end the device session")?;

    for field in &report.fields {
        info!(
            "{} field '{}'",
            if field.filled { "Filled" } else { "Missed" },
            field.text
        );
    }
    if !report.all_filled() {
        bail!("Some required fields could not be filled");
    }
    Ok(())
}

fn press_keys(config: &Config, keys: &[String]) -> Result<()> {
    // Validate every name up front so a typo never leaves the UI half-navigated.
    let parsed = keys
        .iter()
        .map(|k| k.parse())
        .collect::<Result<Vec<tvdriver::RemoteKey>, _>>()?;

    let session = SessionGuard::open(config).context("Could not start a device session")?;
    for key in parsed {
        session.press_key(key)?;
    }
    session.close()?;
    Ok(())
}

fn fill(config: &Config, selector: &str, text: &str, search: FocusableSearch) -> Result<()> {
    let session = SessionGuard::open(config).context("Could not start a device session")?;
    let filled = search.find_and_fill(&*session, &selector.into(), text)?;
    session.close()?;

    if !filled {
        bail!("No focusable element found near {selector}");
    }
    info!("Filled '{}' near {}", text, selector);
    Ok(())
}
