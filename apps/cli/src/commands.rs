//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use leadbridge_core::pipeline::{ProcessedLead, ProgressReporter};
use leadbridge_core::{ReconcileOptions, parse_submission, specs};
use leadbridge_crm::{CatalogCache, CatalogSource, ClientOptions, CrmClient, parse_catalog};
use leadbridge_shared::{AppConfig, init_config, load_config, resolve_credentials};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// LeadBridge: score website leads and map them onto live CRM custom fields.
#[derive(Parser)]
#[command(
    name = "leadbridge",
    version,
    about = "Score website form submissions and reconcile them against a CRM's custom fields.",
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

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Score a submission, reconcile it and print the contact payload.
    Process {
        /// Submission JSON file, or `-` for stdin. Repeat to process several.
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Read the custom field catalog from a file instead of the CRM.
        #[arg(long)]
        catalog: Option<String>,

        /// Send the payload to the CRM.
        #[arg(long, conflicts_with = "catalog")]
        push: bool,

        /// CRM location id (overrides crm.location_id).
        #[arg(long, env = "LEADBRIDGE_LOCATION_ID")]
        location: Option<String>,
    },

    /// Print the score and quality tier of a submission.
    Score {
        /// Submission JSON file, or `-` for stdin.
        #[arg(short, long)]
        input: String,
    },

    /// Fetch and list the live custom field catalog.
    Catalog {
        /// CRM location id (overrides crm.location_id).
        #[arg(long, env = "LEADBRIDGE_LOCATION_ID")]
        location: Option<String>,

        /// Print the catalog as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the semantic fields LeadBridge knows about.
    Fields,

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
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so stdout stays clean for payload JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadbridge=info",
        1 => "leadbridge=debug",
        _ => "leadbridge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
        Command::Process {
            input,
            catalog,
            push,
            location,
        } => cmd_process(&input, catalog.as_deref(), push, location.as_deref()).await,
        Command::Score { input } => cmd_score(&input),
        Command::Catalog { location, json } => cmd_catalog(location.as_deref(), json).await,
        Command::Fields => cmd_fields(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_process(
    inputs: &[String],
    catalog_file: Option<&str>,
    push: bool,
    location: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    let opts = ReconcileOptions::from(&config.reconcile);

    if let Some(path) = catalog_file {
        let catalog = parse_catalog(&read_input(path)?)?;
        let location_id = location
            .map(str::to_string)
            .or_else(|| config.crm.location_id.clone())
            .unwrap_or_default();
        info!(path, fields = catalog.len(), "using catalog from file");

        for input in inputs {
            let inbound = parse_submission(&read_input(input)?)?;
            let lead = leadbridge_core::process_with_catalog(
                inbound,
                Ok(catalog.clone()),
                &location_id,
                &opts,
            )?;
            print_lead(input, &lead)?;
        }
        return Ok(());
    }

    let creds = resolve_credentials(&config, location)?;
    let client = CrmClient::new(&ClientOptions::from(&config.crm))?;
    let source = CatalogCache::new(
        client.clone(),
        Duration::from_secs(config.crm.catalog_ttl_secs),
    );

    for input in inputs {
        let inbound = parse_submission(&read_input(input)?)?;
        let reporter = CliProgress::new();
        let lead = leadbridge_core::process(&source, &creds, inbound, &opts, &reporter).await?;
        print_lead(input, &lead)?;

        if push {
            if lead.degraded {
                warn!(
                    input = %input,
                    "pushing without custom fields, catalog unavailable or empty"
                );
            }
            let spinner = spinner("Upserting contact");
            let outcome = client.upsert_contact(&creds, &lead.payload).await;
            spinner.finish_and_clear();
            let outcome = outcome.wrap_err_with(|| format!("failed to push {input}"))?;
            eprintln!(
                "  Contact: {} ({})",
                outcome.contact_id.as_deref().unwrap_or("unknown id"),
                if outcome.created { "created" } else { "updated" }
            );
        }
    }

    Ok(())
}

fn cmd_score(input: &str) -> Result<()> {
    let inbound = parse_submission(&read_input(input)?)?;
    let submission = leadbridge_core::normalize_submission(inbound)?;
    let score = leadbridge_core::score(&submission);
    println!("{} ({})", score.numeric_score, score.quality_tier.label());
    Ok(())
}

async fn cmd_catalog(location: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let creds = resolve_credentials(&config, location)?;
    let client = CrmClient::new(&ClientOptions::from(&config.crm))?;

    let spinner = spinner("Fetching custom field catalog");
    let fields = client.fetch_catalog(&creds).await;
    spinner.finish_and_clear();
    let fields = fields?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    println!("{:<28} {:<32} {:<14} KEY", "ID", "NAME", "TYPE");
    for field in &fields {
        println!(
            "{:<28} {:<32} {:<14} {}",
            field.id,
            field.display_name,
            field.data_type,
            field.key.as_deref().unwrap_or("-")
        );
    }
    println!("\n{} fields", fields.len());
    Ok(())
}

fn cmd_fields() -> Result<()> {
    println!("{:<26} {:<26} {:<14} SCOPE", "KEY", "CRM NAME", "TYPE");
    for spec in specs::semantic_fields() {
        println!(
            "{:<26} {:<26} {:<14} {:?}",
            spec.semantic_key, spec.preferred_external_name, spec.data_type, spec.scope
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
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Summary to stderr, payload JSON to stdout.
fn print_lead(input: &str, lead: &ProcessedLead) -> Result<()> {
    eprintln!();
    eprintln!("  Input:     {input}");
    eprintln!("  Form:      {}", lead.submission.form_kind());
    eprintln!(
        "  Score:     {} ({})",
        lead.score.numeric_score,
        lead.score.quality_tier.label()
    );
    match &lead.reconciliation {
        Some(r) => {
            eprintln!("  Mapped:    {}", r.fields.len());
            eprintln!("  Unmapped:  {}", r.unmapped.len());
            if !r.failed.is_empty() {
                eprintln!("  Failed:    {}", r.failed.len());
                for failure in &r.failed {
                    eprintln!("             {}: {}", failure.semantic_key, failure.reason);
                }
            }
            eprintln!("  Fallback:  {}", if r.fallback_applied { "yes" } else { "no" });
        }
        None => eprintln!("  Degraded:  catalog unavailable, no custom fields"),
    }
    if lead.degraded && lead.reconciliation.is_some() {
        eprintln!("  Degraded:  catalog empty, no custom fields");
    }
    eprintln!("  Time:      {:.1}ms", lead.elapsed.as_secs_f64() * 1000.0);
    eprintln!();

    println!("{}", serde_json::to_string_pretty(&lead.payload)?);
    Ok(())
}

/// Read a file, or stdin when `path` is `-`.
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read stdin")?;
        return Ok(buf);
    }

    let p = Path::new(path);
    if !p.is_file() {
        return Err(eyre!("input file '{path}' does not exist"));
    }
    std::fs::read_to_string(p).wrap_err_with(|| format!("failed to read {path}"))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        Self {
            spinner: spinner("Starting"),
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _lead: &ProcessedLead) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
