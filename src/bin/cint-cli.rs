use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use cint_client::{ApiRequest, CintClient, ClientConfig, Payload, Scheme};
use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "cint-cli",
    version,
    about = "Small async CLI for the Cint panel API"
)]
struct Cli {
    /// Transport scheme (http or https).
    #[arg(long, env = "CINT_SCHEME", default_value = "https")]
    scheme: String,

    /// API host, optionally with port.
    #[arg(long, env = "CINT_HOST", default_value = cint_client::DEFAULT_HOST)]
    host: String,

    /// Panel key; also the default resource key.
    #[arg(long, env = "CINT_KEY")]
    key: Option<String>,

    /// Panel secret.
    #[arg(long, env = "CINT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Default resource key when it differs from the credential key.
    #[arg(long, env = "CINT_RESOURCE_KEY")]
    resource_key: Option<String>,

    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the API root.
    Main,
    /// Fetch one panel.
    Panel { panel_id: String },
    /// Fetch panel settings.
    Settings,
    /// List genders.
    Genders,
    /// List panelist statuses.
    Statuses,
    /// List transaction types.
    TransactionTypes,
    /// Fetch panel questions (XML).
    Questions(PanelArgs),
    /// Search panelists.
    Panelists(SearchArgs),
    /// Fetch one panelist.
    Panelist(PanelistArgs),
    /// Create a panelist.
    CreatePanelist(CreateArgs),
    /// Update a panelist.
    UpdatePanelist(UpdateArgs),
    /// Delete a panelist.
    DeletePanelist(PanelistArgs),
    /// List respondents.
    Respondents(PanelArgs),
    /// List respondent quotas.
    Quotas(PanelArgs),
    /// List panel events.
    Events(PanelArgs),
    /// List survey invitations of a panelist.
    Invitations(PanelistArgs),
    /// Nominate a panelist and print its start link.
    Candidate(UpdateArgs),
    /// Send a raw HTTP request using method + path.
    Request(RequestArgs),
}

#[derive(Debug, Args)]
struct PanelArgs {
    /// Panel key; defaults to the configured key.
    #[arg(long = "panel")]
    panel_key: Option<String>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Search parameter in form key=value (member_id, email). Repeat as needed.
    #[arg(long = "param", value_name = "KEY=VALUE", required = true)]
    param: Vec<String>,

    #[command(flatten)]
    panel: PanelArgs,
}

#[derive(Debug, Args)]
struct PanelistArgs {
    panelist_id: String,

    #[command(flatten)]
    panel: PanelArgs,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[command(flatten)]
    body: BodyInput,

    #[command(flatten)]
    panel: PanelArgs,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    panelist_id: String,

    #[command(flatten)]
    body: BodyInput,

    #[command(flatten)]
    panel: PanelArgs,
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// HTTP method (GET, POST, PATCH, DELETE, ...).
    method: String,

    /// Request path (for example: /panels/KEY/events).
    path: String,

    /// Query parameter in form key=value. Repeat as needed.
    #[arg(long = "query", value_name = "KEY=VALUE")]
    query: Vec<String>,

    #[command(flatten)]
    body: BodyInput,
}

#[derive(Debug, Args)]
struct BodyInput {
    /// JSON request body literal.
    #[arg(long, conflicts_with = "body_file")]
    body_json: Option<String>,

    /// Path to a file containing a JSON request body.
    #[arg(long, value_name = "PATH", conflicts_with = "body_json")]
    body_file: Option<PathBuf>,
}

/// Entry point for the async CLI.
///
/// Builds a client from flags/env, attaches credentials when both key and
/// secret are given, dispatches the subcommand and prints the payload.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = build_client(&cli)?;
    let output = run(&client, &cli.command).await?;
    print_payload(&output, cli.compact).context("failed to print output")?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let base_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        match verbose {
            0 => "warn",
            1 => "warn,cint_client=info",
            _ => "info,cint_client=debug",
        }
        .to_owned()
    });
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn build_client(cli: &Cli) -> Result<CintClient> {
    let scheme = Scheme::from_str(&cli.scheme).context("invalid --scheme")?;
    let mut config = ClientConfig::default()
        .with_scheme(scheme)
        .with_host(&cli.host);
    if let Some(key) = &cli.resource_key {
        config = config.with_resource_key(key);
    }

    let client = CintClient::new(config)
        .with_context(|| format!("failed to create client for host '{}'", cli.host))?;
    match credential_pair(cli.key.as_deref(), cli.secret.as_deref())? {
        Some((key, secret)) => client
            .with_credentials(key, secret)
            .context("failed to attach credentials"),
        None => Ok(client),
    }
}

/// Key and secret must be given together or not at all.
fn credential_pair<'a>(
    key: Option<&'a str>,
    secret: Option<&'a str>,
) -> Result<Option<(&'a str, &'a str)>> {
    match (key, secret) {
        (Some(key), Some(secret)) => Ok(Some((key, secret))),
        (Some(_), None) => bail!("--key requires --secret (or CINT_SECRET)"),
        (None, Some(_)) => bail!("--secret requires --key (or CINT_KEY)"),
        (None, None) => Ok(None),
    }
}

async fn run(client: &CintClient, command: &Command) -> Result<Payload> {
    let payload = match command {
        Command::Main => client.get_main().await?,
        Command::Panel { panel_id } => client.get_panel(panel_id).await?,
        Command::Settings => client.get_setting().await?,
        Command::Genders => client.get_genders().await?,
        Command::Statuses => client.get_statuses().await?,
        Command::TransactionTypes => client.get_transaction_types().await?,
        Command::Questions(args) => client.get_questions(args.key()).await?,
        Command::Panelists(args) => {
            let params = parse_pairs(&args.param, "--param")?;
            let borrowed = borrow_pairs(&params);
            client.get_panelists(&borrowed, args.panel.key()).await?
        }
        Command::Panelist(args) => {
            client
                .get_panelist(&args.panelist_id, args.panel.key())
                .await?
        }
        Command::CreatePanelist(args) => {
            let body = require_body(&args.body)?;
            client.create_panelist(&body, args.panel.key()).await?
        }
        Command::UpdatePanelist(args) => {
            let body = require_body(&args.body)?;
            client
                .update_panelist(&body, &args.panelist_id, args.panel.key())
                .await?
        }
        Command::DeletePanelist(args) => {
            client
                .delete_panelist(&args.panelist_id, args.panel.key())
                .await?
        }
        Command::Respondents(args) => client.get_respondents(args.key()).await?,
        Command::Quotas(args) => client.get_respondent_quotas(args.key()).await?,
        Command::Events(args) => client.get_events(args.key()).await?,
        Command::Invitations(args) => {
            client
                .get_survey_invitations(&args.panelist_id, args.panel.key())
                .await?
        }
        Command::Candidate(args) => {
            let body = require_body(&args.body)?;
            let candidate = client
                .candidate_respondent(&body, &args.panelist_id, args.panel.key())
                .await?;
            let start = candidate.link_start()?;
            Payload::Json(serde_json::json!({
                "params": candidate.params(),
                "link_start": start,
            }))
        }
        Command::Request(args) => send_request(client, args)
            .await
            .with_context(|| format!("request failed: {} {}", args.method, args.path))?,
    };
    Ok(payload)
}

impl PanelArgs {
    fn key(&self) -> Option<&str> {
        self.panel_key.as_deref()
    }
}

/// Sends a raw HTTP request using method + path.
async fn send_request(client: &CintClient, args: &RequestArgs) -> Result<Payload> {
    // Validate method eagerly so CLI errors are explicit before any network call.
    let method = Method::from_str(&args.method.to_ascii_uppercase())
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;
    let query = parse_pairs(&args.query, "--query").context("failed to parse --query arguments")?;
    let mut request = ApiRequest::new(method, args.path.clone()).with_query(query);
    if let Some(body) = parse_body(&args.body).context("failed to parse request body input")? {
        request = request.with_body(&body)?;
    }

    let payload = client
        .request(request)
        .await
        .with_context(|| format!("HTTP request failed for path '{}'", args.path))?;
    Ok(payload)
}

/// Parses repeated `key=value` arguments into owned key/value pairs.
///
/// Returns an error when a value does not include `=` or has an empty key.
fn parse_pairs(values: &[String], flag_name: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(values.len());
    for item in values {
        let Some((key, value)) = item.split_once('=') else {
            bail!("invalid {flag_name} value '{item}': expected key=value");
        };
        if key.is_empty() {
            bail!("invalid {flag_name} value '{item}': empty key");
        }
        pairs.push((key.to_owned(), value.to_owned()));
    }
    Ok(pairs)
}

fn borrow_pairs(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
    pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

fn require_body(body: &BodyInput) -> Result<Value> {
    parse_body(body)?.context("a body is required: use --body-json or --body-file")
}

/// Parses an optional JSON body from inline text or a file path.
///
/// Exactly one of `--body-json` or `--body-file` may be set.
fn parse_body(body: &BodyInput) -> Result<Option<Value>> {
    match (&body.body_json, &body.body_file) {
        (Some(raw), None) => serde_json::from_str(raw)
            .context("failed to parse JSON from --body-json")
            .map(Some),
        (None, Some(path)) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read --body-file '{}'", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| {
                    format!("failed to parse JSON in --body-file '{}'", path.display())
                })
                .map(Some)
        }
        (None, None) => Ok(None),
        (Some(_), Some(_)) => bail!("use only one of --body-json or --body-file"),
    }
}

/// Prints JSON either compact or pretty-formatted; XML is printed verbatim.
fn print_payload(payload: &Payload, compact: bool) -> Result<()> {
    match payload {
        Payload::Xml(text) => println!("{text}"),
        Payload::Json(value) if compact => println!(
            "{}",
            serde_json::to_string(value).context("Failed to render JSON")?
        ),
        Payload::Json(value) => println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to render JSON")?
        ),
    }
    Ok(())
}
