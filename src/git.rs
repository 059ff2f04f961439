use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::process::Command as GitCommand;

/// Changed paths (in git's order) plus the diff text of each.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub files: Vec<String>,
    pub diffs: BTreeMap<String, String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Run a git command and capture stdout as String.
pub fn git_output(args: &[&str]) -> Result<String> {
    let output = GitCommand::new("git")
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {:?}", args))?;

    if !output.status.success() {
        return Err(anyhow!(
            "git {:?} exited with status {:?}: {}",
            args,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Get the current branch name.
pub fn current_branch() -> Result<String> {
    let name = git_output(&["rev-parse", "--abbrev-ref", "HEAD"])?
        .trim()
        .to_string();
    Ok(name)
}

/// Revision spec to diff against: `<base>...HEAD` when a base branch is
/// given, otherwise the working tree against `HEAD`.
fn diff_target(base: Option<&str>) -> String {
    match base {
        Some(base) => format!("{base}...HEAD"),
        None => "HEAD".to_string(),
    }
}

/// List changed files relative to the diff target.
pub fn changed_files(base: Option<&str>) -> Result<Vec<String>> {
    let target = diff_target(base);
    let output = git_output(&["diff", "--name-only", &target])?;
    Ok(parse_name_list(&output))
}

/// Get the diff of one file relative to the diff target.
pub fn diff_for_file(base: Option<&str>, path: &str) -> Result<String> {
    let target = diff_target(base);
    git_output(&["diff", &target, "--", path])
}

/// Collect every changed file and its diff.
pub fn collect_changes(base: Option<&str>) -> Result<ChangeSet> {
    let files = changed_files(base)?;
    let mut diffs = BTreeMap::new();

    for path in &files {
        let diff = diff_for_file(base, path)?;
        log::debug!("Collected diff for {path} ({} bytes)", diff.len());
        diffs.insert(path.clone(), diff);
    }

    Ok(ChangeSet { files, diffs })
}

fn parse_name_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
