//! bom-tools: BOM graph collection and resolution tool
//!
//! Collects part structures from a product-data service or tabular exports
//! and hands the resulting graph to a graph store.

#![allow(clippy::too_many_lines, clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use bom_tools::{
    cli,
    config::{self, AppConfig, ConfigPreset, Validatable},
    crawl::DetailsStrategy,
    error::BomError,
    extract::ExtractOptions,
    pipeline::exit_codes,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with input support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nInputs:",
        "\n  Product-data service (JSON-RPC tools/call), CSV BOM exports",
        "\n\nTable Shapes:",
        "\n  level-indexed, parent/child numbers, parent/child names",
        "\n\nOutputs:",
        "\n  parts.json + edges.json, CSV edge lists, JSON bundle, N-Triples"
    )
}

#[derive(Parser)]
#[command(name = "bom-tools")]
#[command(author = "Binarly.io")]
#[command(version, long_version = build_long_version())]
#[command(about = "BOM graph collection and resolution tool", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Completed with skipped nodes or rows (--fail-on-skip)
    2  Strict name resolution failed
    3  Error occurred

EXAMPLES:
    # Crawl the BOM below a top-level part
    bom-tools collect TOP-100 --base-url http://localhost:3000 -d out/

    # Re-run from the response cache only
    bom-tools collect TOP-100 --offline -d out/

    # Parse level-indexed CSV exports
    bom-tools parse-bom exports/ -d out/ --csv

    # Resolve a name-keyed BOM against part tables
    bom-tools resolve-names parts.csv name_bom.csv -d out/ --strict

    # Export with derived relations as N-Triples
    bom-tools export out/ -f ntriples -O graph.nt")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "BOM_TOOLS_CONFIG")]
    config: Option<PathBuf>,

    /// Configuration preset (default, offline, thorough, strict)
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs (extracted for readability)
// ============================================================================

/// Arguments for the `collect` subcommand
#[derive(Parser)]
struct CollectArgs {
    /// Top-level part number
    top: String,

    /// Output directory for parts.json, edges.json and index.json
    #[arg(short = 'd', long, default_value = ".")]
    out_dir: PathBuf,

    /// Product-data service base URL
    #[arg(long, env = "BOM_TOOLS_BASE_URL")]
    base_url: Option<String>,

    /// Answer every call from the response cache
    #[arg(long)]
    offline: bool,

    /// Response cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Maximum BOM depth below the top part
    #[arg(long)]
    max_depth: Option<usize>,

    /// Largest depth requested in one structure call
    #[arg(long)]
    per_call_depth: Option<usize>,

    /// Which parts get a details lookup
    #[arg(long, value_enum)]
    details: Option<DetailsArg>,

    /// Look up details for parts still unnamed after the crawl
    #[arg(long)]
    hydrate: bool,

    /// Exit with code 1 if any node was skipped
    #[arg(long)]
    fail_on_skip: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DetailsArg {
    Full,
    Top,
    None,
}

impl From<DetailsArg> for DetailsStrategy {
    fn from(arg: DetailsArg) -> Self {
        match arg {
            DetailsArg::Full => Self::Full,
            DetailsArg::Top => Self::Top,
            DetailsArg::None => Self::None,
        }
    }
}

/// Arguments shared by `parse-bom` and `resolve-names`
#[derive(Parser)]
struct TabularArgs {
    /// CSV files or directories of CSV files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short = 'd', long, default_value = ".")]
    out_dir: PathBuf,

    /// Also write edges.csv
    #[arg(long)]
    csv: bool,

    /// Exit with code 1 if any row was skipped
    #[arg(long)]
    fail_on_skip: bool,
}

/// Arguments for the `resolve-names` subcommand
#[derive(Parser)]
struct ResolveArgs {
    #[command(flatten)]
    tables: TabularArgs,

    /// Abort on the first unknown or ambiguous name
    #[arg(long)]
    strict: bool,

    /// Do not accept part numbers in place of names
    #[arg(long)]
    no_number_fallback: bool,
}

/// Arguments for the `export` subcommand
#[derive(Parser)]
struct ExportArgs {
    /// Directory holding parts.json and edges.json
    graph_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: cli::ExportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Leave out used_in and part_of_assembly
    #[arg(long)]
    no_derived: bool,

    /// Rows per sink call
    #[arg(long)]
    batch_size: Option<usize>,
}

/// Arguments for the `subgraph` subcommand
#[derive(Parser)]
struct SubgraphArgs {
    /// Directory holding parts.json and edges.json
    graph_dir: PathBuf,

    /// Root part number (defaults to the graph's only root)
    #[arg(long)]
    root: Option<String>,

    /// Deepest level to include (root is level 0)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Children followed per node
    #[arg(long)]
    max_children: Option<usize>,

    /// Parts listed under "most children"
    #[arg(long, default_value = "10")]
    top: usize,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the BOM below a top-level part
    Collect(CollectArgs),

    /// Parse number-keyed tabular BOMs into edges
    ParseBom(TabularArgs),

    /// Resolve a name-keyed BOM against part tables
    ResolveNames(ResolveArgs),

    /// Export a graph with derived relations
    Export(ExportArgs),

    /// Extract a bounded subgraph for visualization
    Subgraph(SubgraphArgs),

    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `cache` command
#[derive(Subcommand)]
enum CacheAction {
    /// Print entry counts per kind and total size
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every cached response
    Clear,
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .bom-tools.yaml in the current directory
    Init,
}

/// Config file (or defaults); a preset replaces both.
fn load_app_config(cli: &Cli) -> Result<AppConfig> {
    let (mut app, loaded_from) = config::load_or_default(cli.config.as_deref());
    if let Some(path) = &loaded_from {
        tracing::debug!("Loaded config from {}", path.display());
    }
    if let Some(name) = &cli.preset {
        let preset = ConfigPreset::from_name(name)
            .with_context(|| format!("Unknown preset '{name}'"))?;
        if loaded_from.is_some() {
            tracing::warn!("--preset {preset} ignores the settings in the config file");
        }
        tracing::debug!("Using preset {preset}: {}", preset.description());
        app = AppConfig::from_preset(preset);
    }
    Ok(app)
}

fn validate(app: &AppConfig) -> Result<()> {
    let errors = app.validate();
    if errors.is_empty() {
        return Ok(());
    }
    for error in &errors {
        tracing::error!("Invalid configuration: {error}");
    }
    Err(BomError::config(format!("{} configuration errors", errors.len())).into())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            exit_codes::ERROR
        }
    };
    if exit_code != exit_codes::SUCCESS {
        std::process::exit(exit_code);
    }
    Ok(())
}

// Dispatch to command handlers
fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Collect(args) => {
            let mut app = load_app_config(cli)?;
            if let Some(url) = &args.base_url {
                app.remote.base_url = Some(url.clone());
            }
            if args.offline {
                app.cache.offline = true;
            }
            if let Some(dir) = &args.cache_dir {
                app.cache.dir = Some(dir.clone());
            }
            if let Some(depth) = args.max_depth {
                app.crawl.max_depth = depth;
            }
            if let Some(cap) = args.per_call_depth {
                app.crawl.per_call_depth_cap = cap;
            }
            if let Some(details) = args.details {
                app.crawl.details = details.into();
            }
            if args.hydrate {
                app.crawl.hydrate_details = true;
            }
            validate(&app)?;

            cli::run_collect(
                &app,
                &cli::CollectConfig {
                    top: args.top.clone(),
                    out_dir: args.out_dir.clone(),
                    fail_on_skip: args.fail_on_skip,
                    quiet: cli.quiet,
                },
            )
        }

        Commands::ParseBom(args) => {
            let app = load_app_config(cli)?;
            validate(&app)?;
            cli::run_parse_bom(&app, &tabular_config(args, cli.quiet))
        }

        Commands::ResolveNames(args) => {
            let mut app = load_app_config(cli)?;
            if args.strict {
                app.resolution.strict = true;
            }
            if args.no_number_fallback {
                app.resolution.number_fallback = false;
            }
            validate(&app)?;
            cli::run_resolve_names(&app, &tabular_config(&args.tables, cli.quiet))
        }

        Commands::Export(args) => {
            let app = load_app_config(cli)?;
            validate(&app)?;
            let mut config =
                cli::ExportCommandConfig::from_app(&app, args.graph_dir.clone(), args.format);
            config.output = args.output_file.clone();
            config.quiet = cli.quiet;
            if args.no_derived {
                config.derived = false;
            }
            if let Some(size) = args.batch_size {
                config.batch_size = size;
            }
            cli::run_export(&config)
        }

        Commands::Subgraph(args) => {
            let app = load_app_config(cli)?;
            let options = ExtractOptions {
                max_depth: args.max_depth.or(app.extract.max_depth),
                max_children: args.max_children.or(app.extract.max_children),
            };
            cli::run_subgraph(&cli::SubgraphConfig {
                graph_dir: args.graph_dir.clone(),
                root: args.root.clone(),
                options,
                top: args.top,
                output: args.output_file.clone(),
                quiet: cli.quiet,
            })
        }

        Commands::Cache { action } => {
            let app = load_app_config(cli)?;
            match action {
                CacheAction::Stats { json } => cli::run_cache_stats(&app, *json),
                CacheAction::Clear => cli::run_cache_clear(&app, cli.quiet),
            }
        }

        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "bom-tools", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema()?;
            match output {
                Some(path) => {
                    std::fs::write(path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (app, loaded_from) = config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&app).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    dirs::config_dir().map(|p| p.join("bom-tools").display().to_string()),
                    dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                match config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".bom-tools.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                std::fs::write(&target, config::generate_example_config())
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },
    }
}

fn tabular_config(args: &TabularArgs, quiet: bool) -> cli::TabularCommandConfig {
    cli::TabularCommandConfig {
        inputs: args.inputs.clone(),
        out_dir: args.out_dir.clone(),
        csv: args.csv,
        fail_on_skip: args.fail_on_skip,
        quiet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_collect_args() {
        let cli = Cli::try_parse_from([
            "bom-tools", "collect", "TOP-1", "--offline", "--details", "full", "-d", "out",
        ])
        .unwrap();
        match cli.command {
            Commands::Collect(args) => {
                assert_eq!(args.top, "TOP-1");
                assert!(args.offline);
                assert!(matches!(args.details, Some(DetailsArg::Full)));
                assert_eq!(args.out_dir, PathBuf::from("out"));
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let cli = Cli::try_parse_from(["bom-tools", "--preset", "bogus", "cache", "stats"]).unwrap();
        assert!(load_app_config(&cli).is_err());
    }
}
