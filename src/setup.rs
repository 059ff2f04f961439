use anyhow::Result;
use log::debug;

use crate::config::Config;
use crate::git::ChangeSet;
use crate::llm::invoke::{HttpTransport, InvocationRequest};
use crate::llm::{prompt_builder, truncate};

/// Build the HTTP transport based on config.
pub fn build_transport(cfg: &Config) -> Result<HttpTransport> {
    debug!("Using HTTP transport with {:?} timeout", cfg.timeout);
    HttpTransport::new(cfg.timeout)
}

/// Build the provider request for a set of changes.
pub fn build_request(cfg: &Config, changes: &ChangeSet) -> InvocationRequest {
    let prompt = prompt_builder::build(&changes.files, &changes.diffs);
    debug!("PR prompt:\n{}", truncate(&prompt, 3500));

    InvocationRequest {
        provider: cfg.provider.clone(),
        model: cfg.model.clone(),
        credential: cfg.api_key.clone(),
        messages: prompt_builder::messages(prompt),
    }
}
