//! Workspace configuration for kopi, loaded from `kopi.toml`.
//!
//! ```toml
//! [parse]
//! implicit_imports = ["java.lang", "java.util"]
//! parse_bodies = true
//! max_diagnostics_per_document = 100
//!
//! [logging]
//! level = "debug"   # or a full `EnvFilter` directive string
//! json = false
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

use kopi_parse::ParseOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const KOPI_CONFIG_ENV_VAR: &str = "KOPI_CONFIG_PATH";

const CONFIG_FILE_NAMES: [&str; 2] = ["kopi.toml", ".kopi.toml"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KopiConfig {
    #[serde(default)]
    pub parse: ParseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseConfig {
    /// Packages every document imports on demand.
    #[serde(default = "ParseConfig::default_implicit_imports")]
    pub implicit_imports: Vec<String>,

    /// Parse method bodies and initializers, not just declarations.
    #[serde(default = "ParseConfig::default_parse_bodies")]
    pub parse_bodies: bool,

    #[serde(default)]
    pub max_diagnostics_per_document: Option<usize>,
}

impl ParseConfig {
    fn default_implicit_imports() -> Vec<String> {
        vec!["java.lang".to_owned()]
    }

    fn default_parse_bodies() -> bool {
        true
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            implicit_imports: self.implicit_imports.clone(),
            parse_bodies: self.parse_bodies,
            diagnostic_limit: self.max_diagnostics_per_document,
        }
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            implicit_imports: Self::default_implicit_imports(),
            parse_bodies: Self::default_parse_bodies(),
            max_diagnostics_per_document: None,
        }
    }
}

impl From<&ParseConfig> for ParseOptions {
    fn from(config: &ParseConfig) -> Self {
        config.parse_options()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or an `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured level with `RUST_LOG` merged on
    /// top when it is set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        match env_directives {
            Some(env_directives) => {
                let config_directives = Self::normalize_level_directives(&self.level);
                tracing_subscriber::EnvFilter::try_new(format!("{config_directives},{env_directives}"))
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The `Display` form embeds a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl KopiConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn parse_options(&self) -> ParseOptions {
        self.parse.parse_options()
    }
}

/// Finds the config file for `workspace_root`.
///
/// Search order:
/// 1) `KOPI_CONFIG_PATH` (absolute or relative to `workspace_root`)
/// 2) `kopi.toml`
/// 3) `.kopi.toml`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(KOPI_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path);
    }

    CONFIG_FILE_NAMES
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
}

/// Loads the configuration for `workspace_root`, falling back to
/// [`KopiConfig::default`] when no file is present.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(KopiConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((KopiConfig::default(), None));
    };
    let config = KopiConfig::load_from_path(&path)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}

static TRACING_INIT: Once = Once::new();

/// Installs the global stderr subscriber. Later calls are no-ops.
pub fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Layer;

    TRACING_INIT.call_once(|| {
        let filter = logging.env_filter();
        let layer: Box<dyn Layer<_> + Send + Sync> = if logging.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = KopiConfig::load_from_str("").expect("empty config");
        assert_eq!(config, KopiConfig::default());
        assert_eq!(config.parse_options(), ParseOptions::default());
    }

    #[test]
    fn parse_section_maps_onto_parse_options() {
        let config = KopiConfig::load_from_str(
            "[parse]\n\
             implicit_imports = [\"java.lang\", \"java.util\"]\n\
             parse_bodies = false\n\
             max_diagnostics_per_document = 10\n",
        )
        .expect("valid config");
        assert_eq!(
            config.parse_options(),
            ParseOptions {
                implicit_imports: vec!["java.lang".into(), "java.util".into()],
                parse_bodies: false,
                diagnostic_limit: Some(10),
            }
        );
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = KopiConfig::load_from_str("[parse]\nbodies = true\n").unwrap_err();
        let ConfigError::Toml(message) = err else {
            panic!("expected toml error, got {err:?}");
        };
        assert!(message.contains("unknown field"), "{message}");
    }

    #[test]
    fn toml_errors_do_not_echo_the_input() {
        let err = KopiConfig::load_from_str("[logging]\nlevel = 3 # secret-comment\n").unwrap_err();
        assert!(!err.to_string().contains("secret-comment"), "{err}");
    }

    #[test]
    fn missing_files_report_their_path() {
        let err = KopiConfig::load_from_path("/definitely/not/here/kopi.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("kopi.toml")));
    }

    #[test]
    fn level_synonyms_normalize() {
        assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
        assert_eq!(
            LoggingConfig::normalize_level_directives("kopi_parse=trace"),
            "kopi_parse=trace"
        );
    }
}
