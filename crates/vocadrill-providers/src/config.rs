//! Configuration and translator factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vocadrill_core::engine::TranslationEngineConfig;
use vocadrill_core::grading::GradingConfig;
use vocadrill_core::model::Deck;
use vocadrill_core::producer::ProducerConfig;
use vocadrill_core::scheduler::SchedulerConfig;
use vocadrill_core::traits::Translator;

use crate::command::CommandTranslator;
use crate::glossary::{GlossaryTranslator, DEFAULT_MIN_COVERAGE};

/// Configuration for a single translator.
///
/// Note: Custom Debug impl masks environment values, which often carry API keys.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TranslatorConfig {
    /// Offline glossary built from the deck's words, plus an optional file.
    Glossary {
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default = "default_min_coverage")]
        min_coverage: f64,
    },
    /// External program reading text on stdin.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl std::fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslatorConfig::Glossary { path, min_coverage } => f
                .debug_struct("Glossary")
                .field("path", path)
                .field("min_coverage", min_coverage)
                .finish(),
            TranslatorConfig::Command {
                program,
                args,
                env,
                timeout_secs,
            } => {
                let masked: Vec<(&String, &str)> = env.keys().map(|k| (k, "***")).collect();
                f.debug_struct("Command")
                    .field("program", program)
                    .field("args", args)
                    .field("env", &masked)
                    .field("timeout_secs", timeout_secs)
                    .finish()
            }
        }
    }
}

fn default_min_coverage() -> f64 {
    DEFAULT_MIN_COVERAGE
}
fn default_timeout_secs() -> u64 {
    30
}

/// Top-level vocadrill configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocadrillConfig {
    /// Translator configurations keyed by name.
    #[serde(default)]
    pub translators: HashMap<String, TranslatorConfig>,
    /// Order in which translators are tried.
    #[serde(default = "default_translator_order")]
    pub translator_order: Vec<String>,
    /// Retries per translator on transient errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent translations.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Where answer history is kept.
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    /// Output directory for session reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub producer: ProducerConfig,
}

fn default_translator_order() -> Vec<String> {
    vec!["glossary".to_string()]
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}
fn default_parallelism() -> usize {
    4
}
fn default_history_path() -> PathBuf {
    PathBuf::from("./vocadrill-data/history.json")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./vocadrill-data/sessions")
}

impl Default for VocadrillConfig {
    fn default() -> Self {
        Self {
            translators: HashMap::new(),
            translator_order: default_translator_order(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            history_path: default_history_path(),
            output_dir: default_output_dir(),
            grading: GradingConfig::default(),
            scheduler: SchedulerConfig::default(),
            producer: ProducerConfig::default(),
        }
    }
}

impl VocadrillConfig {
    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> TranslationEngineConfig {
        TranslationEngineConfig {
            parallelism: self.parallelism,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a translator config.
fn resolve_translator_config(config: &TranslatorConfig) -> TranslatorConfig {
    match config {
        TranslatorConfig::Glossary { path, min_coverage } => TranslatorConfig::Glossary {
            path: path
                .as_ref()
                .map(|p| PathBuf::from(resolve_env_vars(&p.to_string_lossy()))),
            min_coverage: *min_coverage,
        },
        TranslatorConfig::Command {
            program,
            args,
            env,
            timeout_secs,
        } => TranslatorConfig::Command {
            program: resolve_env_vars(program),
            args: args.iter().map(|a| resolve_env_vars(a)).collect(),
            env: env
                .iter()
                .map(|(k, v)| (k.clone(), resolve_env_vars(v)))
                .collect(),
            timeout_secs: *timeout_secs,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `vocadrill.toml` in the current directory
/// 2. `~/.config/vocadrill/config.toml`
///
/// `VOCADRILL_HISTORY` overrides the history path.
pub fn load_config() -> Result<VocadrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VocadrillConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("vocadrill.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<VocadrillConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => VocadrillConfig::default(),
    };

    if let Ok(history) = std::env::var("VOCADRILL_HISTORY") {
        config.history_path = PathBuf::from(history);
    }

    let resolved: HashMap<String, TranslatorConfig> = config
        .translators
        .iter()
        .map(|(k, v)| (k.clone(), resolve_translator_config(v)))
        .collect();
    config.translators = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("vocadrill"))
}

/// Create a translator from its configuration.
///
/// A translator named `glossary` with no configuration gets the defaults.
pub fn create_translator(
    name: &str,
    config: Option<&TranslatorConfig>,
    deck: &Deck,
) -> Result<Arc<dyn Translator>> {
    match config {
        Some(TranslatorConfig::Glossary { path, min_coverage }) => {
            let mut glossary = GlossaryTranslator::from_deck(deck, *min_coverage).with_name(name);
            if let Some(path) = path {
                glossary.load_file(path)?;
            }
            Ok(Arc::new(glossary))
        }
        Some(TranslatorConfig::Command {
            program,
            args,
            env,
            timeout_secs,
        }) => Ok(Arc::new(
            CommandTranslator::new(name, program, args.clone(), *timeout_secs)
                .with_env(env.clone()),
        )),
        None if name == "glossary" => Ok(Arc::new(GlossaryTranslator::from_deck(
            deck,
            DEFAULT_MIN_COVERAGE,
        ))),
        None => anyhow::bail!("translator '{name}' is not configured"),
    }
}

/// Create the translators in `translator_order`.
pub fn build_translators(config: &VocadrillConfig, deck: &Deck) -> Result<Vec<Arc<dyn Translator>>> {
    config
        .translator_order
        .iter()
        .map(|name| create_translator(name, config.translators.get(name), deck))
        .collect()
}
