use anyhow::Context;
use clap::Parser;
use colored::*;
use ignore::WalkBuilder;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use fencefmt::config::{Config, ConfigCompiler, ConfigReader};
use fencefmt::{FormatReport, Orchestrator};

#[derive(Parser)]
#[command(author, version, about = "Format the code blocks in Markdown files", long_about = None)]
struct Cli {
    /// Files or directories to format. Use `-` to read from stdin.
    #[arg(required = false)]
    paths: Vec<PathBuf>,

    /// Configuration file path (discovered upwards from the current directory otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report files that would change without writing them
    #[arg(long)]
    check: bool,

    /// Print formatted output instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Write the generated lint and formatter configuration files into DIR
    #[arg(long, value_name = "DIR")]
    emit_configs: Option<PathBuf>,

    /// Formatter timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Show detailed output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(&cli) {
        Ok(changed) => process::exit(if changed && cli.check { 1 } else { 0 }),
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            process::exit(1);
        }
    }
}

/// Returns whether any file would change.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let config = ConfigReader::load(cli.config.as_deref(), &cwd)?;

    if !config.output.color {
        colored::control::set_override(false);
    }

    if let Some(dir) = &cli.emit_configs {
        emit_configs(&config, dir)?;
        if cli.paths.is_empty() {
            return Ok(false);
        }
    }

    let mut settings = fencefmt::formatters::EngineSettings {
        working_dir: Some(cwd.clone()),
        ..Default::default()
    };
    if let Some(timeout) = cli.timeout {
        settings.timeout_ms = timeout;
    }
    let show_progress = config.output.progress;
    let orchestrator = Orchestrator::with_engine_settings(config, &settings);

    if cli.paths.len() == 1 && cli.paths[0] == Path::new("-") {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input).context("failed to read stdin")?;
        let report = orchestrator.format(&input)?;
        print_warnings("<stdin>", &report);
        if !cli.check {
            io::stdout().write_all(report.content.as_bytes())?;
        }
        return Ok(report.content != input);
    }

    let files = find_markdown_files(&cli.paths, orchestrator.config())?;
    let mut changed_files = 0usize;
    let mut errors = 0usize;

    for file in &files {
        let display = file.display().to_string();
        let original = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("{}: {display}: {e}", "error".red().bold());
                errors += 1;
                continue;
            }
        };
        let report = match orchestrator.format(&original) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{}: {display}: {e}", "error".red().bold());
                errors += 1;
                continue;
            }
        };
        print_warnings(&display, &report);

        if report.content == original {
            continue;
        }
        changed_files += 1;

        if cli.stdout {
            io::stdout().write_all(report.content.as_bytes())?;
        } else if cli.check {
            println!("{} {display}", "Would format".yellow());
        } else {
            fs::write(file, &report.content).with_context(|| format!("failed to write {display}"))?;
            if show_progress {
                println!("{} {display}", "Formatted".green());
            }
        }
    }

    if show_progress || cli.verbose {
        eprintln!(
            "{} file(s) checked, {} changed, {} error(s)",
            files.len(),
            changed_files,
            errors
        );
    }

    if errors > 0 {
        anyhow::bail!("{errors} file(s) could not be formatted");
    }
    Ok(changed_files > 0)
}

fn emit_configs(config: &Config, dir: &Path) -> anyhow::Result<()> {
    let generated = ConfigCompiler::compile(config)?;
    for name in &generated.unknown_engines {
        eprintln!("{}: unknown formatter '{name}', no configuration generated", "warning".yellow().bold());
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for file in generated.files()? {
        let path = dir.join(file.file_name);
        fs::write(&path, file.contents).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("[fencefmt] Wrote {}", path.display());
    }
    Ok(())
}

fn print_warnings(file: &str, report: &FormatReport) {
    for warning in &report.warnings {
        eprintln!("{}: {file}:{warning}", "warning".yellow().bold());
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
}

fn find_markdown_files(paths: &[PathBuf], config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let ignores = config.ignore_set()?;
    let first_path = paths.first().cloned().unwrap_or_else(|| PathBuf::from("."));
    let mut walk_builder = WalkBuilder::new(first_path);
    for path in paths.iter().skip(1) {
        walk_builder.add(path);
    }
    walk_builder.hidden(true).git_ignore(true).require_git(false);

    let mut files = Vec::new();
    for entry in walk_builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("[fencefmt] {e}");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_markdown(path) {
            continue;
        }
        let relative = path.strip_prefix(".").unwrap_or(path);
        if ignores.is_match(relative) {
            log::debug!("[fencefmt] Ignoring {}", path.display());
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    files.dedup();
    Ok(files)
}
