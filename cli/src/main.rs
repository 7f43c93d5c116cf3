use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use typefiles_config::{ConfigLoader, EngineSettings};
use typefiles_core::lint_fragment;
use typefiles_engine::{
    Orchestrator, OutputFormat, SchemaResolver, ValidationReport, format_report, format_schema,
};
use walkdir::WalkDir;

mod watch;

/// Exit status when validation found problems.
const EXIT_FINDINGS: i32 = 1;
/// Exit status when the command itself could not run.
const EXIT_FAILURE: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "typefiles")]
#[command(about = "Validate directory contents against tfconfig.json schemas", version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate every directory under a workspace root.
    Check(CheckArgs),
    /// Print the effective schema of one directory.
    Resolve(ResolveArgs),
    /// Parse and lint every configuration file under a workspace root.
    Lint(LintArgs),
    /// Validate on start and again after each batch of filesystem changes.
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
struct SettingsArgs {
    /// YAML engine settings file.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Number of parallel validation jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
}

impl SettingsArgs {
    fn load(&self) -> Result<EngineSettings, String> {
        let mut settings = match &self.settings {
            Some(path) => EngineSettings::load(path)
                .map_err(|e| format!("Failed to load settings {}: {e}", path.display()))?,
            None => EngineSettings::default(),
        };
        if self.jobs.is_some() {
            settings.jobs = self.jobs;
        }
        Ok(settings)
    }
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Workspace root.
    #[arg(default_value = ".")]
    root: PathBuf,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
    #[command(flatten)]
    settings: SettingsArgs,
    /// Treat warnings as failures.
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Directory to resolve.
    dir: PathBuf,
    /// Workspace root (default: current directory).
    #[arg(long)]
    root: Option<PathBuf>,
    /// Output format (markdown and table print JSON).
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Print each contributing configuration instead of the merged result.
    #[arg(long)]
    chain: bool,
    /// YAML engine settings file.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct LintArgs {
    /// Workspace root.
    #[arg(default_value = ".")]
    root: PathBuf,
    /// YAML engine settings file.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct WatchArgs {
    /// Workspace root.
    #[arg(default_value = ".")]
    root: PathBuf,
    /// Quiet period before a batch of changes triggers validation.
    #[arg(long, default_value_t = 1000)]
    debounce_ms: u64,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
    #[command(flatten)]
    settings: SettingsArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Resolve(args) => run_resolve(args).map(|()| true),
        Command::Lint(args) => run_lint(args),
        Command::Watch(args) => run_watch(args).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_FINDINGS),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_optional_settings(path: Option<&Path>) -> Result<EngineSettings, String> {
    match path {
        Some(path) => EngineSettings::load(path)
            .map_err(|e| format!("Failed to load settings {}: {e}", path.display())),
        None => Ok(EngineSettings::default()),
    }
}

/// Whether a report passes, given the warning policy.
fn report_passes(report: &ValidationReport, deny_warnings: bool) -> bool {
    report.error_count() == 0 && (!deny_warnings || report.warning_count() == 0)
}

fn run_check(args: CheckArgs) -> Result<bool, String> {
    let settings = args.settings.load()?;
    let orchestrator = Orchestrator::new(settings);
    let report = orchestrator.run(&args.root).map_err(|e| e.to_string())?;

    let output = format_report(&report, args.format)?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }

    Ok(report_passes(&report, args.deny_warnings))
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let settings = load_optional_settings(args.settings.as_deref())?;
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir().map_err(|e| format!("Failed to read current directory: {e}"))?,
    };
    if !args.dir.is_dir() {
        return Err(format!("Not a directory: {}", args.dir.display()));
    }

    let loader = ConfigLoader::with_file_name(settings.config_file_name);
    let resolver = SchemaResolver::new(Arc::new(loader));

    if args.chain {
        let chain = resolver
            .resolve_chain(&args.dir, &root)
            .map_err(|e| e.to_string())?;
        let entries: Vec<serde_json::Value> = chain
            .iter()
            .map(|fragment| {
                serde_json::json!({
                    "origin": fragment.origin,
                    "fragment": fragment,
                })
            })
            .collect();
        let output = match args.format {
            OutputFormat::Yaml => serde_yaml::to_string(&entries)
                .map_err(|e| format!("YAML serialization failed: {e}"))?,
            _ => serde_json::to_string_pretty(&entries)
                .map_err(|e| format!("JSON serialization failed: {e}"))?,
        };
        println!("{output}");
        return Ok(());
    }

    match resolver.resolve(&args.dir, &root).map_err(|e| e.to_string())? {
        Some(schema) => println!("{}", format_schema(&schema, args.format)?),
        None => eprintln!("No configuration applies to {}", args.dir.display()),
    }
    Ok(())
}

fn run_lint(args: LintArgs) -> Result<bool, String> {
    let settings = load_optional_settings(args.settings.as_deref())?;
    if !args.root.is_dir() {
        return Err(format!("Not a directory: {}", args.root.display()));
    }
    let loader = ConfigLoader::with_file_name(settings.config_file_name.clone());

    let mut checked = 0usize;
    let mut problems = 0usize;
    let walker = WalkDir::new(&args.root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !settings.is_ignored_directory(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry.map_err(|e| format!("Failed to walk {}: {e}", args.root.display()))?;
        if !entry.file_type().is_file() || entry.file_name() != settings.config_file_name.as_str() {
            continue;
        }
        checked += 1;
        let path = entry.path();
        match loader.load(path) {
            Ok(Some(fragment)) => {
                for err in lint_fragment(&fragment) {
                    println!("{}: {err}", path.display());
                    problems += 1;
                }
            }
            Ok(None) => {}
            Err(err) => {
                println!("{err}");
                problems += 1;
            }
        }
    }

    eprintln!("Checked {checked} configuration files, {problems} problems");
    Ok(problems == 0)
}

fn run_watch(args: WatchArgs) -> Result<(), String> {
    let settings = args.settings.load()?;
    let orchestrator = Orchestrator::new(settings);
    let format = args.format;
    watch::watch(
        &orchestrator,
        &args.root,
        std::time::Duration::from_millis(args.debounce_ms),
        |report| {
            let output = format_report(report, format)?;
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
            Ok(true)
        },
    )
}
