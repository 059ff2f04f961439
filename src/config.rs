use crate::cli_args::Cli;
use crate::llm::invoke::InvocationError;
use crate::llm::providers::Registry;
use crate::llm::GenerationParams;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Final resolved configuration for one prbot run.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub base: Option<String>,
    pub timeout: Duration,
    pub params: GenerationParams,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--provider`, `--model`, `--api-key`, `--base`)
    ///   2. Env vars `PRBOT_PROVIDER`, `PRBOT_MODEL`, `PRBOT_API_KEY`, then the
    ///      provider's own key variable (e.g. `DEEPSEEK_API_KEY`)
    ///   3. TOML `~/.config/prbot.toml`
    ///   4. Built-in defaults (provider "openai", the provider's default model)
    pub fn from_sources(cli: &Cli, registry: &Registry) -> Result<Self> {
        let file_cfg = read_file_config(&config_path()?)?;
        Self::resolve(cli, &|name: &str| env::var(name).ok(), file_cfg, registry)
    }

    fn resolve(
        cli: &Cli,
        env_var: &dyn Fn(&str) -> Option<String>,
        file_cfg: FileConfig,
        registry: &Registry,
    ) -> Result<Self> {
        let env = |name: &str| env_var(name).filter(|v| !v.trim().is_empty());

        let provider_id = cli
            .provider
            .clone()
            .or_else(|| env("PRBOT_PROVIDER"))
            .or_else(|| file_cfg.provider.clone())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        let provider = registry
            .lookup(&provider_id)
            .ok_or_else(|| unknown_provider(&provider_id, registry))?;

        let model = cli
            .model
            .clone()
            .or_else(|| env("PRBOT_MODEL"))
            .or_else(|| file_cfg.models.get(provider.id).cloned())
            .unwrap_or_else(|| provider.default_model.to_string());

        let api_key = cli
            .api_key
            .clone()
            .or_else(|| env("PRBOT_API_KEY"))
            .or_else(|| env(provider.key_env))
            .or_else(|| file_cfg.api_keys.get(provider.id).cloned())
            .ok_or_else(|| {
                anyhow!(
                    "no API key for provider '{id}'; pass --api-key, set PRBOT_API_KEY or {var}, \
                     or run `prbot config set --provider {id} --api-key <KEY>`",
                    id = provider.id,
                    var = provider.key_env
                )
            })?;

        let defaults = GenerationParams::default();
        let params = GenerationParams {
            temperature: file_cfg.temperature.unwrap_or(defaults.temperature),
            max_tokens: file_cfg.max_tokens.unwrap_or(defaults.max_tokens),
        };

        Ok(Config {
            provider: provider.id.to_string(),
            model,
            api_key,
            base: cli.base.clone().or(file_cfg.base),
            timeout: Duration::from_secs(file_cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            params,
        })
    }
}

/// Contents of `~/.config/prbot.toml`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Provider used when none is given on the command line or in env.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Preferred model per provider id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, String>,
    /// API key per provider id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub api_keys: BTreeMap<String, String>,
}

impl FileConfig {
    /// Apply `prbot config set` flags. Model and key are stored under the
    /// provider a run would select: flag, then `PRBOT_PROVIDER`, then the
    /// stored provider, then the default. Only the flag is persisted.
    pub fn apply_set(
        &mut self,
        cli: &Cli,
        env_var: &dyn Fn(&str) -> Option<String>,
        registry: &Registry,
    ) -> Result<()> {
        if cli.provider.is_none() && cli.model.is_none() && cli.api_key.is_none() && cli.base.is_none() {
            return Err(anyhow!(
                "nothing to set; pass --provider, --model, --api-key or --base"
            ));
        }

        if let Some(id) = &cli.provider {
            if !registry.is_valid(id) {
                return Err(unknown_provider(id, registry));
            }
            self.provider = Some(id.clone());
        }

        let target = match env_var("PRBOT_PROVIDER").filter(|v| !v.trim().is_empty()) {
            Some(id) if cli.provider.is_none() => {
                if !registry.is_valid(&id) {
                    return Err(unknown_provider(&id, registry));
                }
                id
            }
            _ => self
                .provider
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        };

        if let Some(model) = &cli.model {
            self.models.insert(target.clone(), model.clone());
        }
        if let Some(key) = &cli.api_key {
            self.api_keys.insert(target, key.clone());
        }
        if let Some(base) = &cli.base {
            self.base = Some(base.clone());
        }

        Ok(())
    }

    /// Copy of this config with API keys masked, for display.
    pub fn masked(&self) -> FileConfig {
        let mut out = self.clone();
        for key in out.api_keys.values_mut() {
            *key = mask_key(key);
        }
        out
    }
}

fn unknown_provider(id: &str, registry: &Registry) -> anyhow::Error {
    anyhow!(
        "{} (supported: {})",
        InvocationError::UnknownProvider(id.to_string()),
        registry.list().join(", ")
    )
}

fn mask_key(key: &str) -> String {
    if key.chars().count() <= 8 {
        return "****".to_string();
    }
    let head: String = key.chars().take(4).collect();
    format!("{head}****")
}

/// Return `$PRBOT_CONFIG` if set, else `~/.config/prbot.toml`.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os("PRBOT_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(home.join(".config").join("prbot.toml"))
}

/// Read the config file; a missing file is an empty config.
pub fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        log::debug!("No config file at {}", path.display());
        return Ok(FileConfig::default());
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str::<FileConfig>(&data)
        .with_context(|| format!("invalid config file {}", path.display()))
}

pub fn write_file_config(path: &Path, cfg: &FileConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let data = toml::to_string_pretty(cfg).context("failed to serialize config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}
