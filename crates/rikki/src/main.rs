//! Rikki CLI
//!
//! Filters or rewrites a JSON dump of captured exchanges using a rule file
//! or criteria given on the command line. Results go to stdout as JSON, logs
//! go to stderr.
//!
//! Usage:
//!   rikki filter --exchanges flows.json --rules rules.yaml [--rule NAME]
//!   rikki filter --exchanges flows.json --host 'api\..*' --code 200
//!   rikki rewrite --exchanges flows.json --rules rules.yaml

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use rikki::predicate::FieldMap;
use rikki::{Exchange, ExchangeFilter, Interceptor, RequestCriterion, ResponseCriterion, RulesConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rikki")]
#[command(author, version, about = "Filter and rewrite captured HTTP exchanges")]
struct Args {
    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the exchanges matching a rule set or inline criteria
    Filter(FilterArgs),
    /// Apply the first matching rule's overlay to every exchange
    Rewrite(RewriteArgs),
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    /// JSON file holding an array of exchanges
    #[arg(short, long)]
    exchanges: PathBuf,

    /// Rule file (YAML, or JSON by extension)
    #[arg(short, long, conflicts_with_all = ["host", "port", "method", "path", "param", "header", "content", "code"])]
    rules: Option<PathBuf>,

    /// Only use the rule with this name
    #[arg(long, requires = "rules")]
    rule: Option<String>,

    #[command(flatten)]
    criteria: InlineCriteria,
}

#[derive(ClapArgs, Debug)]
struct InlineCriteria {
    /// Host regex (anchored), also tried against the Host header
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    method: Option<String>,

    /// Path without query string
    #[arg(long)]
    path: Option<String>,

    /// Query parameter, KEY=VALUE (repeatable)
    #[arg(long, value_parser = parse_key_value)]
    param: Vec<(String, String)>,

    /// Request header, NAME=VALUE (repeatable)
    #[arg(long, value_parser = parse_key_value)]
    header: Vec<(String, String)>,

    /// Request body; prefix with '?' for JSON-subset matching
    #[arg(long)]
    content: Option<String>,

    /// Response status code
    #[arg(long)]
    code: Option<u16>,
}

#[derive(ClapArgs, Debug)]
struct RewriteArgs {
    /// JSON file holding an array of exchanges
    #[arg(short, long)]
    exchanges: PathBuf,

    /// Rule file (YAML, or JSON by extension)
    #[arg(short, long)]
    rules: PathBuf,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn to_field_map(pairs: Vec<(String, String)>) -> Option<FieldMap> {
    (!pairs.is_empty()).then(|| pairs.into_iter().collect())
}

impl InlineCriteria {
    fn into_criteria(self) -> (RequestCriterion, ResponseCriterion) {
        let request = RequestCriterion {
            host: self.host,
            port: self.port,
            method: self.method,
            path: self.path,
            params: to_field_map(self.param),
            headers: to_field_map(self.header),
            content: self.content.map(Into::into),
        };
        let response = ResponseCriterion {
            code: self.code,
            ..Default::default()
        };
        (request, response)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_exchanges(path: &Path) -> Result<Vec<Exchange>, anyhow::Error> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read exchanges file {}", path.display()))?;
    let exchanges: Vec<Exchange> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid exchanges file {}", path.display()))?;
    info!(count = exchanges.len(), "loaded exchanges");
    Ok(exchanges)
}

fn print_json(exchanges: &[Exchange]) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(exchanges)?);
    Ok(())
}

fn run_filter(args: FilterArgs) -> Result<(), anyhow::Error> {
    let exchanges = load_exchanges(&args.exchanges)?;

    let matched = match args.rules {
        Some(rules_path) => {
            let config = RulesConfig::from_file(&rules_path)?;
            let interceptor = Interceptor::from_config(&config)?;
            match args.rule {
                Some(name) => {
                    let rule = interceptor
                        .rule(&name)
                        .with_context(|| format!("No rule named '{name}'"))?;
                    rule.filter.apply(&exchanges)
                }
                None => interceptor.filter(&exchanges),
            }
        }
        None => {
            let (request, response) = args.criteria.into_criteria();
            ExchangeFilter::new(Some(&request), Some(&response))?.apply(&exchanges)
        }
    };

    info!(matched = matched.len(), "filter complete");
    print_json(&matched)
}

fn run_rewrite(args: RewriteArgs) -> Result<(), anyhow::Error> {
    let mut exchanges = load_exchanges(&args.exchanges)?;
    let config = RulesConfig::from_file(&args.rules)?;
    let interceptor = Interceptor::from_config(&config)?;

    let mut rewritten = 0usize;
    for exchange in &mut exchanges {
        if interceptor.intercept(exchange)?.is_some() {
            rewritten += 1;
        }
    }

    info!(rewritten, total = exchanges.len(), "rewrite complete");
    print_json(&exchanges)
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Command::Filter(filter_args) => run_filter(filter_args),
        Command::Rewrite(rewrite_args) => run_rewrite(rewrite_args),
    }
}
