#![forbid(unsafe_code)]

//! Configuration for link generation and state embedding.
//!
//! Configuration is an explicit value: it is loaded once (from a TOML file, from the
//! environment, or built in code) and then passed down to the link and embed passes
//! rather than read from ambient global state.

pub mod errors;

use crate::errors::PaneConfigError;
use config::{Case, Config, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{env::VarError, fs, io, path::Path, path::PathBuf, str::FromStr};
use typed_builder::TypedBuilder;

/// The CSS class toggled next to `pn-loading` when nothing else is configured.
pub const DEFAULT_LOADING_SPINNER: &str = "pn-arc";

/// Top-level settings shared by the link generators and the state embedder.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaneConfig {
    /// Error mode. When set, a failure while generating one callback aborts the whole
    /// discovery pass instead of being logged and skipped.
    #[builder(default)]
    #[serde(default)]
    pub strict: bool,
    /// The class added to (and removed from) a target's `css_classes` by loading links.
    #[builder(setter(into), default = DEFAULT_LOADING_SPINNER.to_string())]
    #[serde(default = "default_loading_spinner")]
    pub loading_spinner: String,
    /// Set when running inside an automated documentation build. Embeds that would exceed
    /// `embed.max_states` are abandoned silently instead of warning.
    #[builder(default)]
    #[serde(default)]
    pub doc_build: bool,
    /// Defaults for [`embed_state`](https://docs.rs/pane_embed).
    #[builder(default)]
    #[serde(default)]
    pub embed: EmbedOptions,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Options controlling how the state space of an application is explored and exported.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EmbedOptions {
    /// The maximum number of full widget-value combinations to explore.
    #[builder(default = 1000)]
    pub max_states: usize,
    /// The maximum number of ticks sampled from a continuous widget such as a slider.
    #[builder(default = 3)]
    pub max_opts: usize,
    /// Write every recorded state to its own JSON file instead of embedding it inline.
    #[builder(default)]
    pub json: bool,
    /// Prefix of the generated JSON subdirectory.
    #[builder(setter(into), default)]
    pub json_prefix: String,
    /// Directory the JSON files are written to.
    #[builder(setter(into), default = PathBuf::from("./"))]
    pub save_path: PathBuf,
    /// Path or URL the JSON files will be loaded from, if different from `save_path`.
    #[builder(setter(strip_option, into), default)]
    pub load_path: Option<String>,
    /// Whether to draw a progress bar while exploring.
    #[builder(default = true)]
    pub progress: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_loading_spinner() -> String {
    DEFAULT_LOADING_SPINNER.to_string()
}

impl PaneConfig {
    /// Builds a configuration purely from `PANE_*` environment variables, falling back to
    /// the defaults for anything unset.
    pub fn try_from_env() -> Result<Self, PaneConfigError> {
        let embed = EmbedOptions::default();
        Ok(PaneConfig {
            strict: env_flag("PANE_STRICT", false)?,
            loading_spinner: env_w_default(
                "PANE_LOADING_SPINNER",
                DEFAULT_LOADING_SPINNER,
            )?,
            doc_build: env_flag("PANE_DOC_BUILD", false)?,
            embed: EmbedOptions {
                max_states: env_parse("PANE_MAX_STATES", embed.max_states)?,
                max_opts: env_parse("PANE_MAX_OPTS", embed.max_opts)?,
                ..embed
            },
        })
    }
}

fn env_wo_default(key: &str) -> Result<Option<String>, PaneConfigError> {
    match std::env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(PaneConfigError::EnvError(format!("{key}: {e}"))),
    }
}

fn env_w_default(key: &str, default: &str) -> Result<String, PaneConfigError> {
    Ok(env_wo_default(key)?.unwrap_or_else(|| default.to_string()))
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, PaneConfigError> {
    match env_wo_default(key)? {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|_| PaneConfigError::EnvError(format!("{key}: {val}"))),
        None => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> Result<bool, PaneConfigError> {
    match env_wo_default(key)? {
        Some(val) => flag_from_str(&val)
            .map_err(|_| PaneConfigError::EnvError(format!("{key}: {val}"))),
        None => Ok(default),
    }
}

fn flag_from_str(input: &str) -> Result<bool, String> {
    match input.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!(
            "{input} is not a supported flag. Use 'true' or 'false'.",
        )),
    }
}

/// Loads [`PaneConfig`] from the `[pane]` section of the given TOML file, or purely from
/// the environment when no path is given.
pub fn get_configuration(
    path: Option<&str>,
) -> Result<PaneConfig, PaneConfigError> {
    match path {
        Some(path) => get_config_from_file(path),
        None => PaneConfig::try_from_env(),
    }
}

/// Loads [`PaneConfig`] from the `[pane]` section of a TOML file.
pub fn get_config_from_file<P: AsRef<Path>>(
    path: P,
) -> Result<PaneConfig, PaneConfigError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PaneConfigError::ConfigNotFound,
        _ => PaneConfigError::ConfigError(e.to_string()),
    })?;
    get_config_from_str(&text)
}

/// Loads [`PaneConfig`] from the `[pane]` section of TOML text. Top-level `PANE_*`
/// environment variables override values from the file.
pub fn get_config_from_str(text: &str) -> Result<PaneConfig, PaneConfigError> {
    let section = regex(r"(?m)^\[pane\]")?;
    let nested = regex(r"(?m)^\[pane\.")?;

    let start = section
        .find(text)
        .map(|found| found.start())
        .ok_or(PaneConfigError::ConfigSectionNotFound)?;

    // keep line numbers in serde errors pointing at the original file
    let newlines = text[..start].matches('\n').count();
    let input = "\n".repeat(newlines) + &text[start..];
    // so the settings will be interpreted as root level settings
    let input = nested.replace_all(&input, "[");
    let input = section.replace_all(&input, "");

    let settings = Config::builder()
        .add_source(File::from_str(&input, FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix("PANE")
                .convert_case(Case::Kebab)
                .keep_prefix(false),
        )
        .build()?;

    settings
        .try_deserialize()
        .map_err(|e| PaneConfigError::ConfigError(e.to_string()))
}

fn regex(pattern: &str) -> Result<Regex, PaneConfigError> {
    Regex::new(pattern).map_err(|e| PaneConfigError::ConfigError(e.to_string()))
}

#[cfg(test)]
mod tests;
