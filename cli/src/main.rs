use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gml_core::types::PrimitiveKind;
use gml_core::{AnalysisConfig, AssetSpec, Diagnostic, Project, Severity};
use serde::Serialize;
use tracing::debug;

const DEFAULT_TRACE_FILTER: &str = "gml_core=info,gml_cli=info";
const VERBOSE_TRACE_FILTER: &str = "gml_core=debug,gml_cli=debug";

#[cfg(test)]
mod main_test;

#[derive(Debug, Parser)]
#[command(name = "gmlint", author, version, about = "Static analysis for GML projects", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging on stderr (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Analysis config file; defaults to `gml.toml` in the project root
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyse a project directory or a single file and print its diagnostics.
    Check {
        path: PathBuf,
        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the tokens of a file.
    Tokens { file: PathBuf },
    /// List the globals a project declares.
    Symbols {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show hover text for the symbol at a byte offset.
    Hover {
        path: PathBuf,
        /// File path inside the project, `asset/file.gml`
        #[arg(long)]
        file: String,
        #[arg(long)]
        offset: usize,
    },
}

#[derive(Debug, Serialize)]
struct FileReport<'a> {
    path: &'a str,
    diagnostics: &'a [Diagnostic],
}

#[derive(Debug, Serialize)]
struct SymbolReport {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    path: Option<String>,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let fallback = if verbose { VERBOSE_TRACE_FILTER } else { DEFAULT_TRACE_FILTER };
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|expr| EnvFilter::try_new(expr).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));
    let _ = fmt().with_writer(std::io::stderr).with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Check { path, json } => {
            let project = open_project(&path, args.config.as_deref()).await?;
            run_check(&project, json)
        }
        Commands::Tokens { file } => {
            run_tokens(&file)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Symbols { path, json } => {
            let project = open_project(&path, args.config.as_deref()).await?;
            run_symbols(&project, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Hover { path, file, offset } => {
            let project = open_project(&path, args.config.as_deref()).await?;
            let id = project
                .file_id(&file)
                .with_context(|| format!("no file `{file}` in {}", path.display()))?;
            match project.hover(id, offset) {
                Some(text) => {
                    println!("{text}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("nothing at offset {offset}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<AnalysisConfig> {
    match explicit {
        Some(path) => AnalysisConfig::load(path),
        None => AnalysisConfig::discover(root),
    }
}

/// A directory is loaded as a project tree; a single file becomes a one-script project.
async fn open_project(path: &Path, config: Option<&Path>) -> Result<Project> {
    if path.is_dir() {
        let config = load_config(path, config)?;
        return Project::load_dir(path, config).await;
    }
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let config = load_config(root, config)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("invalid file name {}", path.display()))?;
    debug!(file = %path.display(), "analysing single file");
    let mut project = Project::new(config)?;
    project.initialize(vec![AssetSpec::script(name, content)])?;
    Ok(project)
}

fn run_check(project: &Project, json: bool) -> Result<ExitCode> {
    let all = project.all_diagnostics();
    let errors = all
        .values()
        .flatten()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let total: usize = all.values().map(Vec::len).sum();

    if json {
        let reports: Vec<FileReport> = all
            .iter()
            .map(|(path, diagnostics)| FileReport { path, diagnostics })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (path, diagnostics) in &all {
            for diagnostic in diagnostics {
                println!("{path}:{diagnostic}");
            }
        }
        eprintln!("{} files checked, {total} diagnostics, {errors} errors", project.files().count());
    }
    Ok(if errors > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn run_tokens(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let lexed = gml_core::token::tokenize(&text);
    for token in &lexed.tokens {
        println!("{} {:?} {:?}", token.span, token.kind, token.text);
    }
    for err in &lexed.errors {
        eprintln!("{err}");
    }
    Ok(())
}

fn run_symbols(project: &Project, json: bool) -> Result<()> {
    let reg = project.registry();
    let symbols: Vec<SymbolReport> = project
        .global_symbols()
        .into_iter()
        .map(|id| {
            let sig = reg.sig(id);
            let ty = if reg.kind(sig.ty) == PrimitiveKind::Function {
                reg.code(sig.ty)
            } else {
                reg.to_feather_string(sig.ty)
            };
            SymbolReport {
                name: sig.name.clone(),
                ty,
                path: project.definition_of(id).map(|l| l.path),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&symbols)?);
    } else {
        for symbol in &symbols {
            println!("{}: {}", symbol.name, symbol.ty);
        }
    }
    Ok(())
}
