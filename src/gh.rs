use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

use crate::llm::parser::ParsedPr;

/// Options forwarded to `gh pr create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub base: Option<String>,
    pub draft: bool,
}

/// Create the pull request with the GitHub CLI, returning what `gh` printed (the PR URL).
pub fn create_pr(pr: &ParsedPr, opts: &CreateOptions) -> Result<String> {
    let gh = which::which("gh")
        .map_err(|_| anyhow!("GitHub CLI `gh` not found on PATH; install it from https://cli.github.com"))?;

    // Removed when `body_file` drops.
    let mut body_file = NamedTempFile::new().context("failed to create temporary PR body file")?;
    body_file
        .write_all(pr.body.as_bytes())
        .context("failed to write PR body file")?;
    body_file.flush()?;

    let args = create_args(&pr.title, body_file.path(), opts);
    log::info!("Running gh {}", args.join(" "));

    let output = Command::new(gh)
        .args(&args)
        .output()
        .context("failed to run gh pr create")?;

    if !output.status.success() {
        return Err(anyhow!(
            "gh pr create exited with status {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn create_args(title: &str, body_path: &Path, opts: &CreateOptions) -> Vec<String> {
    let mut args = vec![
        "pr".to_string(),
        "create".to_string(),
        "--title".to_string(),
        title.to_string(),
        "--body-file".to_string(),
        body_path.display().to_string(),
    ];

    if let Some(base) = &opts.base {
        args.push("--base".to_string());
        args.push(base.clone());
    }
    if opts.draft {
        args.push("--draft".to_string());
    }

    args
}
