//! Tabula CLI
//!
//! Resolves a declarative table definition against a JSON array of records and
//! prints the payload a renderer would receive.
//!
//! Usage:
//!   tabula --definition users.yaml --records users.json --query 'filter.name=contains.smith'

use anyhow::Context;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use tabula::{InMemorySource, QueryParams, Table, TableDefaults, TableDefinition, TableDefinitionFile};
use tracing::info;

/// Resolve a table definition against a record file
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(author, version, about = "Resolve a table definition into a renderer payload")]
struct Args {
    /// YAML table definition
    #[arg(short, long)]
    definition: PathBuf,

    /// JSON file holding an array of records
    #[arg(short, long)]
    records: PathBuf,

    /// Request query string, e.g. 'filter.name=contains.smith&page=2'
    #[arg(short, long, default_value = "")]
    query: String,

    /// Request cookie as name=value (repeatable)
    #[arg(short, long = "cookie", value_parser = parse_cookie)]
    cookies: Vec<(String, String)>,

    /// YAML file with table-wide defaults
    #[arg(long, env = "TABULA_DEFAULTS")]
    defaults: Option<PathBuf>,

    /// Instance name for the table
    #[arg(short, long)]
    name: Option<String>,

    /// Pretty-print the payload
    #[arg(short, long)]
    pretty: bool,
}

fn parse_cookie(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tabula=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let defaults = match &args.defaults {
        Some(path) => TableDefaults::from_file(path)
            .with_context(|| format!("loading defaults from {}", path.display()))?,
        None => TableDefaults::default(),
    };

    let definition = TableDefinitionFile::from_file(&args.definition)
        .with_context(|| format!("loading definition from {}", args.definition.display()))?
        .build()?;
    let resource = definition
        .resource()
        .context("the table definition has no resource")?
        .to_string();

    let contents = std::fs::read_to_string(&args.records)
        .with_context(|| format!("reading records from {}", args.records.display()))?;
    let rows: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("parsing records from {}", args.records.display()))?;
    let source = InMemorySource::from_json(resource.as_str(), rows);

    let mut params = QueryParams::from_query_string(&args.query);
    let cookies: HashMap<String, String> = args.cookies.into_iter().collect();

    let mut table = Table::make(&definition, &defaults, &source)?;
    if let Some(name) = args.name {
        table = table.named(name);
    }
    let payload = table.resolve(&mut params, &cookies)?;
    info!(
        table = %payload.name,
        total = payload.meta.total,
        page = payload.meta.current_page,
        "table resolved"
    );

    println!("{}", payload.to_json(args.pretty)?);
    Ok(())
}
