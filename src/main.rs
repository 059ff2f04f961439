mod cli_args;
mod config;
mod gh;
mod git;
mod llm;
mod logging;
mod setup;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::cli_args::{Cli, Command, ConfigAction};
use crate::config::{config_path, read_file_config, write_file_config, Config};
use crate::gh::CreateOptions;
use crate::git::ChangeSet;
use crate::llm::invoke::{InvocationError, Invoker};
use crate::llm::parser::{self, ParsedPr};
use crate::llm::providers::Registry;

/// Ask the provider for a PR description of `changes` and parse it.
fn draft_pr(invoker: &Invoker, cfg: &Config, changes: &ChangeSet) -> Result<ParsedPr, InvocationError> {
    let req = setup::build_request(cfg, changes);
    let raw = invoker.invoke(&req)?;
    Ok(parser::parse(&raw))
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .context("invalid spinner template")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn print_preview(pr: &ParsedPr) {
    println!();
    println!("----- PR Title -----");
    println!("{}", pr.title);
    println!("----- PR Body ------");
    println!("{}", pr.body);
    println!("--------------------");
}

/// Default mode: collect changes, draft the PR with the provider, then open it with `gh`.
fn run_pr(cli: &Cli, registry: &Registry) -> Result<()> {
    let cfg = Config::from_sources(cli, registry)?;

    let branch = git::current_branch()?;
    log::info!(
        "Branch {branch}, diffing against {}",
        cfg.base.as_deref().unwrap_or("HEAD (working tree)")
    );

    let changes = git::collect_changes(cfg.base.as_deref())?;
    if changes.is_empty() {
        println!("No changes found; nothing to describe.");
        return Ok(());
    }
    log::info!("Found {} changed file(s)", changes.files.len());

    let transport = setup::build_transport(&cfg)?;
    let invoker = Invoker::new(registry, &transport, cfg.params);

    let provider_name = registry
        .lookup(&cfg.provider)
        .map(|p| p.name)
        .unwrap_or("provider");
    let pb = spinner(format!("Asking {provider_name} ({})", cfg.model))?;
    let drafted = draft_pr(&invoker, &cfg, &changes);
    pb.finish_and_clear();
    let pr = drafted?;

    print_preview(&pr);

    if cli.dry_run {
        log::info!("Dry run; not creating the pull request");
        return Ok(());
    }

    let opts = CreateOptions {
        base: cfg.base.clone(),
        draft: cli.draft,
    };
    let url = gh::create_pr(&pr, &opts)?;
    println!("{} {url}", "Pull request created:".green().bold());

    Ok(())
}

fn print_providers(registry: &Registry) {
    for provider in registry.iter() {
        println!(
            "{} {:<14} default model: {:<26} key: {}",
            format!("{:<12}", provider.id).bold(),
            provider.name,
            provider.default_model,
            provider.key_env
        );
        println!("{:<12} {}", "", provider.description.bright_black());
    }
}

fn run_config(cli: &Cli, action: &ConfigAction, registry: &Registry) -> Result<()> {
    let path = config_path()?;

    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let file_cfg = read_file_config(&path)?;
            let rendered =
                toml::to_string_pretty(&file_cfg.masked()).context("failed to render config")?;
            println!("# {}", path.display());
            if rendered.trim().is_empty() {
                println!("# (empty; using defaults)");
            } else {
                print!("{rendered}");
            }
        }
        ConfigAction::Set => {
            let mut file_cfg = read_file_config(&path)?;
            file_cfg.apply_set(cli, &|name: &str| std::env::var(name).ok(), registry)?;
            write_file_config(&path, &file_cfg)?;
            println!("Saved configuration to {}", path.display());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let registry = Registry::builtin();

    match &cli.command {
        Some(Command::Providers) => {
            print_providers(&registry);
            Ok(())
        }
        Some(Command::Config { action }) => run_config(&cli, action, &registry),
        None => run_pr(&cli, &registry),
    }
}
