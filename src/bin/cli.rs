//! Binary entry point for the cypher-builder CLI.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;

use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use cypher_builder::{
    cli::{run_script, QueryScript},
    query::{Operator, Query},
    types::CollisionPolicy,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cypher-builder",
    version,
    about = "Render parameterized Cypher statements from JSON query scripts",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "CYPHER_BUILDER_CONFIG",
        help = "Path to the CLI config file"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "Output format (defaults to the config value, then text)"
    )]
    format: Option<OutputFormat>,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "How clashing parameter names are reconciled"
    )]
    collision_policy: Option<CollisionPolicyArg>,

    #[arg(short, long, global = true, help = "Emit debug logs on stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Render a query script into Cypher text and parameters")]
    Render {
        #[arg(value_name = "FILE", help = "Script path, or '-' for stdin")]
        script: PathBuf,
    },

    #[command(about = "List the comparison operators accepted in predicates")]
    Operators,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CollisionPolicyArg {
    Reject,
    Overwrite,
}

impl From<CollisionPolicyArg> for CollisionPolicy {
    fn from(policy: CollisionPolicyArg) -> Self {
        match policy {
            CollisionPolicyArg::Reject => CollisionPolicy::Reject,
            CollisionPolicyArg::Overwrite => CollisionPolicy::Overwrite,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = CliConfig::load(cli.config.clone())?;
    debug!(path = ?config.path(), "cli.config.loaded");
    let format = cli
        .format
        .or(config.default_format())
        .unwrap_or(OutputFormat::Text);
    match cli.command {
        Command::Render { script } => {
            let mut options = config.builder_options().clone();
            if let Some(policy) = cli.collision_policy {
                options.collision_policy = policy.into();
            }
            let script = load_script(&script)?;
            let query = run_script(&script, options)?;
            emit(format, &query, print_query_text)?;
        }
        Command::Operators => {
            let symbols: Vec<&str> = Operator::ALL.iter().map(|op| op.symbol()).collect();
            emit(format, &symbols, |symbols| {
                for symbol in symbols {
                    println!("{symbol}");
                }
            })?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cypher_builder=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn load_script(path: &Path) -> Result<QueryScript, Box<dyn Error>> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(QueryScript::from_json(&text)?);
    }
    Ok(QueryScript::from_path(path)?)
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(&T),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(value),
    }
    Ok(())
}

fn print_query_text(query: &Query) {
    println!("{}", query.text);
    if query.params.is_empty() {
        return;
    }
    println!();
    println!("Params:");
    for (name, value) in query.params.iter() {
        let rendered = serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"));
        println!("  ${name} = {rendered}");
    }
}
