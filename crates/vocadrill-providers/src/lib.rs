//! vocadrill-providers: translator backends.
//!
//! Implements the `Translator` trait with an offline glossary, an external
//! command, and a scriptable mock, and loads the `vocadrill.toml`
//! configuration that wires them into a fallback chain.

pub mod command;
pub mod config;
pub mod glossary;
pub mod mock;

pub use config::{build_translators, load_config, TranslatorConfig, VocadrillConfig};
pub use vocadrill_core::error::TranslateError;
