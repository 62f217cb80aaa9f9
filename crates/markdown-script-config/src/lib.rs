//! Configuration loader for markdown-script.
//!
//! Settings are resolved with the precedence
//! override flag → working directory → git root → built-in defaults,
//! one key at a time, and compiled into a ready-to-use [`Transformer`].

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use markdown_script::{Bucket, Dialect, DialectError, Transformer};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".markdown-script.toml";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub transformer: Transformer,
    pub sources: ConfigSources,
}

impl Config {
    pub fn dialect(&self) -> &Dialect {
        self.transformer.dialect()
    }
}

/// Provenance metadata for the resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn defaults() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} {}", self.kind, path.display()),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid dialect from {origin}: {source}")]
    Dialect {
        origin: ConfigSource,
        source: DialectError,
    },
}

impl Config {
    /// Loads configuration using the precedence rules and compiles the dialect.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = PartialConfig::defaults();
        let mut source_layers = vec![ConfigSource::defaults()];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        for layer in &source_layers {
            debug!(layer = %layer, "applied configuration layer");
        }

        let transformer = merged.finalize()?;
        Ok(Config {
            transformer,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Parses a single TOML document on top of the built-in defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let source = ConfigSource::for_file(ConfigSourceKind::Override, PathBuf::from("<inline>"));
        let mut merged = PartialConfig::defaults();
        merged.merge(parse_layer(contents, source.clone()).map_err(|err| match err {
            LayerParseError::Parse { source } => ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            },
        })?);

        let transformer = merged.finalize()?;
        Ok(Config {
            transformer,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::defaults(), source],
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            transformer: Transformer::default(),
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::defaults()],
            },
        }
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    parse_layer(&contents, source).map_err(|err| match err {
        LayerParseError::Parse { source } => ConfigError::Parse {
            path: path.into(),
            source,
        },
    })
}

fn parse_layer(contents: &str, source: ConfigSource) -> Result<PartialConfig, LayerParseError> {
    let raw: RawConfig =
        toml::from_str(contents).map_err(|source| LayerParseError::Parse { source })?;
    Ok(raw.into_partial(source))
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Debug)]
enum LayerParseError {
    Parse { source: toml::de::Error },
}

/// A value together with the layer that supplied it.
#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    comment_prefix: Option<Located<String>>,
    shell_open: Option<Located<String>>,
    shell_close: Option<Located<String>>,
    script_tags: Option<Located<Vec<String>>>,
    shell_tags: Option<Located<Vec<String>>>,
}

impl PartialConfig {
    fn defaults() -> Self {
        let source = ConfigSource::defaults();
        let dialect = Dialect::default();
        PartialConfig {
            comment_prefix: Some(Located::new(dialect.comment_prefix, source.clone())),
            shell_open: Some(Located::new(dialect.shell_open, source.clone())),
            shell_close: Some(Located::new(dialect.shell_close, source.clone())),
            script_tags: Some(Located::new(dialect.script_tags, source.clone())),
            shell_tags: Some(Located::new(dialect.shell_tags, source)),
        }
    }

    fn merge(&mut self, other: PartialConfig) {
        merge_field(&mut self.comment_prefix, other.comment_prefix);
        merge_field(&mut self.shell_open, other.shell_open);
        merge_field(&mut self.shell_close, other.shell_close);
        merge_field(&mut self.script_tags, other.script_tags);
        merge_field(&mut self.shell_tags, other.shell_tags);
    }

    fn finalize(self) -> Result<Transformer, ConfigError> {
        let script_origin = origin_of(&self.script_tags);
        let shell_origin = origin_of(&self.shell_tags);

        let dialect = Dialect {
            comment_prefix: value_or_default(self.comment_prefix),
            shell_open: value_or_default(self.shell_open),
            shell_close: value_or_default(self.shell_close),
            script_tags: value_or_default(self.script_tags),
            shell_tags: value_or_default(self.shell_tags),
        };

        Transformer::new(dialect).map_err(|source| {
            let origin = match &source {
                DialectError::EmptyTag { bucket } | DialectError::Pattern { bucket, .. } => {
                    match bucket {
                        Bucket::Shell => shell_origin,
                        _ => script_origin,
                    }
                }
            };
            ConfigError::Dialect { origin, source }
        })
    }
}

fn merge_field<T>(target: &mut Option<Located<T>>, incoming: Option<Located<T>>) {
    if incoming.is_some() {
        *target = incoming;
    }
}

fn origin_of<T>(field: &Option<Located<T>>) -> ConfigSource {
    field
        .as_ref()
        .map(|located| located.source.clone())
        .unwrap_or_else(ConfigSource::defaults)
}

fn value_or_default<T: Default>(field: Option<Located<T>>) -> T {
    field.map(|located| located.value).unwrap_or_default()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    output: RawOutput,
    #[serde(default)]
    languages: RawLanguages,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    comment_prefix: Option<String>,
    shell_open: Option<String>,
    shell_close: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLanguages {
    script: Option<Vec<String>>,
    shell: Option<Vec<String>>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let located = |value| Located::new(value, source.clone());
        let located_tags = |value| Located::new(value, source.clone());
        PartialConfig {
            comment_prefix: self.output.comment_prefix.map(located),
            shell_open: self.output.shell_open.map(located),
            shell_close: self.output.shell_close.map(located),
            script_tags: self.languages.script.map(located_tags),
            shell_tags: self.languages.shell.map(located_tags),
        }
    }
}
