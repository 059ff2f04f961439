use std::collections::BTreeMap;

use crate::llm::prompts;
use crate::llm::ChatMessage;

/// Build the full PR-writing instructions for a set of changed files.
///
/// Files are rendered in the given order; a path without an entry in
/// `changes` is still listed, with a placeholder diff.
pub fn build(files: &[String], changes: &BTreeMap<String, String>) -> String {
    let mut out = String::from(prompts::PR_INSTRUCTIONS);

    out.push_str("\n\nChanged files:\n");
    for path in files {
        out.push_str(&format!("- {path}\n"));
    }

    out.push_str("\nDiffs:\n");
    for path in files {
        let diff = changes
            .get(path)
            .map(|d| d.trim_end())
            .filter(|d| !d.is_empty())
            .unwrap_or("(no diff available)");
        out.push_str(&format!("\nFile: {path}\n```diff\n{diff}\n```\n"));
    }

    out
}

/// Wrap built instructions into the system/user exchange sent to a provider.
pub fn messages(prompt: String) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(prompt),
        ChatMessage::user(prompts::PR_TRIGGER),
    ]
}
