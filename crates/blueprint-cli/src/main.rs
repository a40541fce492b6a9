//! # blueprint-cli
//!
//! Command-line front end for the schema builder and subschema selector.
//!
//! Every command reads one schema file (JSON, or YAML by extension), runs a
//! single operation and writes the resulting JSON to stdout or `--output`.

use std::path::PathBuf;

use clap::Parser;

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "blueprint")]
#[command(about = "Mapping blueprint schema editor")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the result to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Print a schema after loading and validation
    Show {
        /// Schema file path
        schema: PathBuf,
    },

    /// Check a schema's structure and invariants
    Validate {
        /// Schema file path
        schema: PathBuf,
    },

    /// Add a property and print the edited schema
    Add {
        /// Schema file path
        schema: PathBuf,

        /// Dot-separated path of the new property
        path: String,

        /// JSON Schema of the new property
        #[arg(short, long)]
        definition: String,

        /// Insert after this sibling key
        #[arg(long)]
        after: Option<String>,

        /// Mark the property as required
        #[arg(long)]
        required: bool,
    },

    /// Replace, rename or (un)require a property and print the edited schema
    Update {
        /// Schema file path
        schema: PathBuf,

        /// Dot-separated path of the property
        path: String,

        /// JSON Schema replacing the property's schema
        #[arg(short, long)]
        definition: String,

        /// New key for the property
        #[arg(long)]
        rename: Option<String>,

        /// Set or clear the required flag
        #[arg(long)]
        required: Option<bool>,
    },

    /// Remove a property and print the edited schema
    Remove {
        /// Schema file path
        schema: PathBuf,

        /// Dot-separated path of the property
        path: String,
    },

    /// Select subtrees and print the extracted selection
    Select {
        /// Target schema file path
        schema: PathBuf,

        /// Dot-separated paths to select, in click order
        paths: Vec<String>,

        /// Select every top-level property
        #[arg(long, conflicts_with = "paths")]
        all: bool,

        /// Source mapping file to seed from; the updated mapping is printed
        #[arg(short, long)]
        mapping: Option<PathBuf>,
    },
}

fn main() {
    if let Err(error) = run() {
        eprintln!("blueprint error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_level)?;

    let options = commands::Options {
        pretty: cli.pretty || config.pretty,
        normalize: config.normalize,
    };

    let rendered = match cli.command {
        Commands::Show { schema } => commands::show(&schema, &options)?,
        Commands::Validate { schema } => commands::validate(&schema, &options)?,
        Commands::Add {
            schema,
            path,
            definition,
            after,
            required,
        } => commands::add(
            &schema,
            &path,
            &definition,
            after.as_deref(),
            required,
            &options,
        )?,
        Commands::Update {
            schema,
            path,
            definition,
            rename,
            required,
        } => commands::update(&schema, &path, &definition, rename, required, &options)?,
        Commands::Remove { schema, path } => commands::remove(&schema, &path, &options)?,
        Commands::Select {
            schema,
            paths,
            all,
            mapping,
        } => commands::select(&schema, &paths, all, mapping.as_deref(), &options)?,
    };

    commands::write_output(cli.output.as_deref(), &rendered)
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
