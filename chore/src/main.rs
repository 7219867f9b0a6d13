//! `chore`: run project chores by name.
//!
//! With no task the catalog is printed. Tasks come from the built-in table,
//! optionally customized by `chore.toml` in the project root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chore::catalog::render_catalog;
use chore::core::types::Variant;
use chore::dispatch::{DispatchOptions, Dispatcher, describe_plan, prepare};
use chore::exit_codes;
use chore::io::config::{CONFIG_FILE_NAME, ChoreConfig, load_config};
use chore::io::init::{InitOptions, init_config};
use chore::io::process::ShellRunner;
use chore::io::template::CommandRenderer;
use chore::io::tools::{SearchPath, child_env, venv_bin_dir};
use chore::logging;
use chore::taskfile::{HELP_TASK, build_table, resolve_vars};
use clap::Parser;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "chore",
    version,
    about = "Run project chores: lint, types, format, test, security, deps, hooks, clean"
)]
struct Cli {
    /// Tasks to run, in order. Prints the task catalog when omitted.
    tasks: Vec<String>,

    /// Project root (defaults to the current directory).
    #[arg(short = 'C', long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Config file (defaults to `<root>/chore.toml`, optional).
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Print the plan without running anything.
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print the plan as JSON without running anything.
    #[arg(long, conflicts_with = "dry_run")]
    plan_json: bool,

    /// Continue past failures (lenient variant).
    #[arg(short = 'k', long, conflicts_with = "strict")]
    keep_going: bool,

    /// Halt on the first failure (strict variant).
    #[arg(long)]
    strict: bool,

    /// Do not echo task headers and commands.
    #[arg(short, long)]
    silent: bool,

    /// Print the task catalog.
    #[arg(short, long)]
    list: bool,

    /// Write a starter `chore.toml`.
    #[arg(long)]
    init: bool,

    /// Overwrite an existing config with `--init`.
    #[arg(long, requires = "init")]
    force: bool,

    /// More diagnostics on stderr (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("chore: error: {err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let root = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolve current directory")?,
    };

    if cli.init {
        let path = init_config(&root, cli.file.as_deref(), &InitOptions { force: cli.force })?;
        println!("wrote {}", path.display());
        return Ok(exit_codes::OK);
    }

    let root = std::fs::canonicalize(&root)
        .with_context(|| format!("resolve project root {}", root.display()))?;
    let mut config = load_project_config(&root, cli.file.as_deref())?;
    if cli.keep_going {
        config.variant = Variant::Lenient;
    } else if cli.strict {
        config.variant = Variant::Strict;
    }
    debug!(variant = ?config.variant, root = %root.display(), "config loaded");

    let table = build_table(&config);
    let show_catalog = cli.list || cli.tasks.is_empty() || cli.tasks.iter().any(|t| t == HELP_TASK);
    if show_catalog {
        print!("{}", render_catalog(&table));
    }
    let targets: Vec<String> = cli
        .tasks
        .into_iter()
        .filter(|task| task != HELP_TASK)
        .collect();
    if targets.is_empty() {
        return Ok(exit_codes::OK);
    }

    let vars = resolve_vars(&config);
    let renderer = CommandRenderer::new(vars.clone());
    let prepared = prepare(&table, &targets, &renderer)?;

    if cli.plan_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&prepared).context("serialize plan")?
        );
        return Ok(exit_codes::OK);
    }
    if cli.dry_run {
        print!("{}", describe_plan(&prepared));
        return Ok(exit_codes::OK);
    }

    let extra_dirs: Vec<PathBuf> = if config.venv_on_path {
        let venv_dir = vars.get("venv_dir").map(String::as_str).unwrap_or_default();
        venv_bin_dir(&root, venv_dir).into_iter().collect()
    } else {
        Vec::new()
    };
    let search_path = SearchPath::for_child(&root, &extra_dirs, &config.env);
    let env = child_env(&config.env, &search_path, &extra_dirs);

    let options = DispatchOptions {
        workdir: root,
        env,
        echo: !cli.silent,
    };
    let report = Dispatcher {
        table: &table,
        runner: &ShellRunner,
        probe: &search_path,
        options: &options,
    }
    .run(&prepared);
    Ok(report.exit_code)
}

/// Explicit `--file` must exist; the default `chore.toml` is optional.
fn load_project_config(root: &Path, file: Option<&Path>) -> Result<ChoreConfig> {
    match file {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file {} not found", path.display());
            }
            load_config(path)
        }
        None => load_config(&root.join(CONFIG_FILE_NAME)),
    }
}
