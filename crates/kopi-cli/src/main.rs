mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kopi_config::KopiConfig;
use kopi_core::SourceDocument;
use kopi_parse::parse_documents;
use kopi_types::TypeStore;
use serde::Serialize;
use walkdir::WalkDir;

use crate::report::{token_records, DiagnosticsReport, ParseReport};

#[derive(Parser)]
#[command(name = "kopi", version, about = "Kopi CLI (parse, diagnostics, tokens)")]
struct Cli {
    /// Config file to use instead of `kopi.toml` discovery
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse files as one batch and print an outline of each
    Parse(ParseArgs),
    /// Report diagnostics for every `.java` file under a path
    Diagnostics(DiagnosticsArgs),
    /// Dump the tokens of a file with their resolved symbols
    Tokens(TokensArgs),
}

#[derive(Args)]
struct ParseArgs {
    /// Files to parse
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DiagnosticsArgs {
    /// Directory to scan or a single file
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TokensArgs {
    /// File to tokenize
    file: PathBuf,
    /// Include whitespace and comments
    #[arg(long)]
    trivia: bool,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    kopi_config::init_tracing(&config.logging);
    let opts = config.parse_options();

    match cli.command {
        Command::Parse(args) => {
            let docs = read_documents(&args.files)?;
            let mut store = TypeStore::with_minimal_jdk();
            let units = parse_documents(&docs, &[], &mut store, &opts);
            let report = ParseReport::new(&store, &docs, &units);
            let exit = if report.summary.errors > 0 { 1 } else { 0 };
            if args.json {
                print_json(&report)?;
            } else {
                report.print_human();
            }
            Ok(exit)
        }
        Command::Diagnostics(args) => {
            let files = java_files(&args.path)?;
            tracing::debug!(count = files.len(), "collected java files");
            let docs = read_documents(&files)?;
            let mut store = TypeStore::with_minimal_jdk();
            let units = parse_documents(&docs, &[], &mut store, &opts);
            let report = DiagnosticsReport::new(&docs, &units);
            let exit = if report.summary.errors > 0 { 1 } else { 0 };
            if args.json {
                print_json(&report)?;
            } else {
                report.print_human();
            }
            Ok(exit)
        }
        Command::Tokens(args) => {
            let docs = read_documents(std::slice::from_ref(&args.file))?;
            let mut store = TypeStore::with_minimal_jdk();
            let units = parse_documents(&docs, &[], &mut store, &opts);
            let tokens = units.first().map(|u| u.tokens.as_slice()).unwrap_or_default();
            let records = token_records(tokens, args.trivia);
            if args.json {
                print_json(&records)?;
            } else {
                report::print_tokens(&records);
            }
            Ok(0)
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<KopiConfig> {
    if let Some(path) = explicit {
        return KopiConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let (config, _) = kopi_config::load_for_workspace(&cwd)?;
    Ok(config)
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(SourceDocument::new(path.display().to_string(), text, 1))
        })
        .collect()
}

fn java_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let is_java = entry.path().extension().is_some_and(|ext| ext == "java");
        if entry.file_type().is_file() && is_java {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
