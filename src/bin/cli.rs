use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use codeanalyzer::config::{Config, CONFIG_FILE_NAME};
use codeanalyzer::error::{Result, ScanError};
use codeanalyzer::output::OutputFormat;
use codeanalyzer::rules::{Rule, RuleFilter, Severity};
use codeanalyzer::{EngineOptions, RuleManager, RunOptions};

#[derive(Parser)]
#[command(
    name = "codeanalyzer",
    about = "Run static-analysis engines over files, directories and globs",
    version,
    author
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); CODEANALYZER_LOG overrides
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rules matching the filters against the targets
    Run(RunArgs),

    /// List rules matching the filters
    ListRules {
        #[command(flatten)]
        filters: FilterArgs,

        /// Include rules that are disabled by default
        #[arg(long)]
        all: bool,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show one rule in detail
    Describe {
        #[arg(long, short = 'e')]
        engine: String,

        #[arg(long, short = 'n')]
        rule_name: String,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate a starter .codeanalyzer.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Categories, comma-separated
    #[arg(long, short = 'c', value_delimiter = ',')]
    category: Vec<String>,

    /// Rulesets, comma-separated
    #[arg(long, short = 'r', value_delimiter = ',')]
    ruleset: Vec<String>,

    /// Engines, comma-separated
    #[arg(long, short = 'e', value_delimiter = ',')]
    engine: Vec<String>,

    /// Languages, comma-separated
    #[arg(long, short = 'l', value_delimiter = ',')]
    language: Vec<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Vec<RuleFilter> {
        let mut filters = Vec::new();
        if !self.category.is_empty() {
            filters.push(RuleFilter::category(&self.category));
        }
        if !self.ruleset.is_empty() {
            filters.push(RuleFilter::ruleset(&self.ruleset));
        }
        if !self.engine.is_empty() {
            filters.push(RuleFilter::engine(&self.engine));
        }
        if !self.language.is_empty() {
            filters.push(RuleFilter::language(&self.language));
        }
        filters
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::ListRules {
            filters,
            all,
            format,
            config,
        } => cmd_list_rules(&filters, all, &format, config),
        Commands::Describe {
            engine,
            rule_name,
            format,
            config,
        } => cmd_describe(&engine, &rule_name, &format, config),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("CODEANALYZER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_manager(config: Option<PathBuf>) -> Result<RuleManager> {
    let path = config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = Config::load(&path)?;
    RuleManager::from_config(&config)
}

#[derive(Args)]
struct RunArgs {
    /// File, directory or glob to analyze; prefix with '!' to exclude.
    /// Brace alternation ({a,b}) is not supported
    #[arg(long = "target", short = 't', required = true, num_args = 1..)]
    targets: Vec<String>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Output format (csv, html, json, junit, sarif, table, xml)
    #[arg(long, short = 'f')]
    format: Option<String>,

    /// Write results to a file; the format defaults to its extension
    #[arg(long, short = 'o')]
    outfile: Option<PathBuf>,

    /// Map engine severities onto a common scale
    #[arg(long)]
    normalize_severity: bool,

    /// Exit with status 1 when a violation is at least this severe (1-5 or name)
    #[arg(long)]
    severity_threshold: Option<String>,

    /// Enable data-flow analysis in engines that support it
    #[arg(long)]
    dfa: bool,

    /// Host CLI version passed to engines
    #[arg(long, env = "SFDX_VERSION")]
    sfdx_version: Option<String>,

    /// Engine option as KEY=VALUE, passed to every engine
    #[arg(long = "engine-option", value_name = "KEY=VALUE")]
    engine_options: Vec<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

fn cmd_run(args: RunArgs) -> Result<i32> {
    let format = match &args.format {
        Some(name) => OutputFormat::from_str_lenient(name).unwrap_or_else(|| {
            eprintln!("Warning: unknown format '{}', using table", name);
            OutputFormat::Table
        }),
        None => args
            .outfile
            .as_ref()
            .and_then(|p| OutputFormat::from_file_name(&p.to_string_lossy()))
            .unwrap_or_default(),
    };

    let threshold = args
        .severity_threshold
        .as_deref()
        .map(|s| {
            Severity::from_str_lenient(s)
                .ok_or_else(|| ScanError::Config(format!("unknown severity '{}'", s)))
        })
        .transpose()?;

    let engine_options = parse_engine_options(&args.engine_options)?;
    let options = RunOptions {
        format,
        normalize_severity: args.normalize_severity || threshold.is_some(),
        run_dfa: args.dfa,
        sfdx_version: args.sfdx_version,
    };

    let manager = load_manager(args.config)?;
    let results = manager.run_rules_matching_criteria(
        &args.filters.to_filters(),
        &args.targets,
        &options,
        &engine_options,
    )?;

    if results.results.is_empty() {
        println!("No rule violations found.");
    } else {
        match &args.outfile {
            Some(out) => {
                std::fs::write(out, &results.results)?;
                println!(
                    "Wrote {} violation(s) to {}",
                    results.violation_count(),
                    out.display()
                );
            }
            None => println!("{}", results.results.trim_end()),
        }
    }

    // Exit code: 0 = ok, 1 = violation at or above threshold
    let exceeded = threshold.is_some_and(|t| results.exceeds_threshold(t));
    Ok(if exceeded { 1 } else { 0 })
}

fn parse_engine_options(raw: &[String]) -> Result<EngineOptions> {
    raw.iter()
        .map(|opt| {
            opt.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| {
                    ScanError::Config(format!("engine option '{}' is not KEY=VALUE", opt))
                })
        })
        .collect()
}

fn cmd_list_rules(
    filters: &FilterArgs,
    all: bool,
    format: &str,
    config: Option<PathBuf>,
) -> Result<i32> {
    let manager = load_manager(config)?;
    let filters = filters.to_filters();
    let rules = if all {
        manager.get_rules_matching_only_explicit_criteria(&filters)
    } else {
        manager.get_rules_matching_criteria(&filters)
    };

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!(
                "{:<10} {:<22} {:<4} {:<8} {:<28} RULESETS",
                "ENGINE", "NAME", "SEV", "ENABLED", "CATEGORIES"
            );
            println!("{}", "-".repeat(90));
            for rule in &rules {
                println!(
                    "{:<10} {:<22} {:<4} {:<8} {:<28} {}",
                    rule.engine,
                    rule.name,
                    rule.severity,
                    if rule.default_enabled { "yes" } else { "no" },
                    rule.categories.join(", "),
                    rule.rulesets.join(", "),
                );
            }
            println!("\n{} rule(s)", rules.len());
        }
    }

    Ok(0)
}

fn cmd_describe(engine: &str, rule_name: &str, format: &str, config: Option<PathBuf>) -> Result<i32> {
    let manager = load_manager(config)?;
    let rule = manager.describe_rule(engine, rule_name)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(rule)?),
        _ => print_rule(rule),
    }

    Ok(0)
}

fn print_rule(rule: &Rule) {
    println!("{}", rule.qualified_name());
    println!("  description: {}", rule.description);
    println!("  severity:    {} ({})", rule.severity, Severity::from_engine_level(rule.severity));
    println!("  enabled:     {}", rule.default_enabled);
    println!("  categories:  {}", rule.categories.join(", "));
    println!("  rulesets:    {}", rule.rulesets.join(", "));
    if !rule.languages.is_empty() {
        println!("  languages:   {}", rule.languages.join(", "));
    }
    if let Some(url) = &rule.url {
        println!("  url:         {}", url);
    }
    for (key, value) in &rule.metadata {
        println!("  {:<12} {}", format!("{}:", key), value);
    }
}

fn cmd_init(force: bool) -> Result<i32> {
    let path = PathBuf::from(CONFIG_FILE_NAME);

    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", CONFIG_FILE_NAME);
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {}", CONFIG_FILE_NAME);

    Ok(0)
}
