use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use argbind_core::{DocumentError, Schema, SchemaDocument, parse_or_report, validate_document};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::debug;

const DOCUMENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Output format for bound values.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum CliOutputFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argbind")]
#[command(version, about = "Bind --flag value arguments against declarative schema documents")]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bind arguments given after `--` and print the resulting value.
    Bind(BindArgs),
    /// Print usage text derived from a schema document.
    Usage(UsageArgs),
    /// Validate schema documents and report every problem found.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct BindArgs {
    /// Schema document (JSON, or YAML with a .yaml/.yml extension).
    #[arg(long)]
    schema: PathBuf,
    /// Output format for the bound value.
    #[arg(long, value_enum, default_value_t = CliOutputFormat::Json)]
    format: CliOutputFormat,
    /// Arguments to bind, e.g. `-- CommandOne --input a.txt`.
    #[arg(last = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Schema document (JSON, or YAML with a .yaml/.yml extension).
    #[arg(long)]
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema documents and/or directories containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Command::Bind(args) => run_bind(args),
        Command::Usage(args) => run_usage(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.parse().unwrap_or_default()),
        )
        .init();
}

fn run_bind(args: BindArgs) -> Result<(), String> {
    let schema = compile_document(&args.schema)?;
    debug!(args = args.args.len(), "Binding arguments");

    let value = parse_or_report(&schema, &args.args, &mut std::io::stderr())
        .map_err(|errors| errors.to_string())?;

    let rendered = format_value(&value, args.format)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end())
        .map_err(|err| format!("Failed to write output: {err}"))
}

fn run_usage(args: UsageArgs) -> Result<(), String> {
    let schema = compile_document(&args.schema)?;
    print!("{}", schema.usage());
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let paths = collect_document_paths(&args.inputs)?;

    let mut invalid = 0usize;
    for path in &paths {
        let problems = match load_document(path) {
            Ok(doc) => validate_document(&doc)
                .iter()
                .map(DocumentError::to_string)
                .collect(),
            Err(err) => vec![err],
        };

        if problems.is_empty() {
            println!("ok: {}", path.display());
            continue;
        }

        invalid += 1;
        eprintln!("{}: {} problem(s)", path.display(), problems.len());
        for problem in &problems {
            eprintln!("  - {problem}");
        }
    }

    if invalid > 0 {
        return Err(format!(
            "{invalid} of {} schema document(s) failed validation",
            paths.len()
        ));
    }

    println!("Checked {} schema document(s).", paths.len());
    Ok(())
}

fn load_document(path: &Path) -> Result<SchemaDocument, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;

    let doc = if is_yaml(path) {
        serde_yaml::from_str(&raw).map_err(|err| err.to_string())
    } else {
        serde_json::from_str(&raw).map_err(|err| err.to_string())
    }
    .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))?;

    debug!(path = %path.display(), "Loaded schema document");
    Ok(doc)
}

fn compile_document(path: &Path) -> Result<Box<dyn Schema<Value>>, String> {
    let doc = load_document(path)?;
    doc.compile().map_err(|errors| {
        let lines: Vec<String> = errors.iter().map(|err| format!("  - {err}")).collect();
        format!(
            "Invalid schema document '{}':\n{}",
            path.display(),
            lines.join("\n")
        )
    })
}

fn collect_document_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }

        let entries = fs::read_dir(input)
            .map_err(|err| format!("Failed to read directory '{}': {err}", input.display()))?;
        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_document_extension(path))
            .collect();
        found.sort();
        paths.extend(found);
    }

    if paths.is_empty() {
        return Err("No schema documents found".to_string());
    }
    Ok(paths)
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn format_value(value: &Value, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| format!("Failed to serialize value: {err}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|err| format!("Failed to serialize value: {err}"))
        }
    }
}
