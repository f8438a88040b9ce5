//! # Defaults Module
//!
//! Loads the process-wide defaults applied to every recursive comparison from
//! `fieldwise.toml` and `FIELDWISE_*` environment variables. Explicit builder
//! calls always win over these defaults.
//!
//! ## Loading Flow (block diagram)
//!
//! ```text
//! +-------------------+     +-------------------+     +-------------------+
//! | FIELDWISE_CONFIG  | --> | Path resolution   | --> | fieldwise.toml    |
//! | (optional)        |     | or default ./     |     |                   |
//! +-------------------+     +-------------------+     +-------------------+
//!                                                              |
//!                                                              v
//! +-------------------+     +-------------------+     +-------------------+
//! | Environment vars  | --> | FIELDWISE_* keys  | --> | Defaults struct   |
//! | FIELDWISE_KEY=v   |     | parsed and merged |     | (process-wide)    |
//! +-------------------+     +-------------------+     +-------------------+
//! ```
//!
//! ## Config File
//!
//! ```toml
//! [recursive_comparison]
//! strict_type_checking = false
//! ignore_collection_order = false
//! allow_expected_array = false
//! report_configuration = true
//!
//! [representation]
//! max_length = 1000
//! ```
//!
//! Every key can be overridden with an environment variable named after it,
//! e.g. `FIELDWISE_IGNORE_COLLECTION_ORDER=true` or `FIELDWISE_MAX_LENGTH=200`.
//!
//! **Note:** `FIELDWISE_CONFIG` is reserved for the config file path. A value that
//! does not look like a path (e.g. `FIELDWISE_CONFIG=true`) is rejected.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{
    fmt::Display,
    io::Read,
    path::Path,
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::*;

use crate::{report::StandardRepresentation, Error, Result};

/// Environment variable name for specifying the config file path.
const FIELDWISE_CONFIG_ENV: &str = "FIELDWISE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "fieldwise.toml";

static LOADED: Lazy<Defaults> = Lazy::new(|| {
    let _ = dotenv::dotenv();
    Defaults::load().unwrap_or_else(|e| {
        error!("{e}, built-in defaults are used instead");
        Defaults::default()
    })
});

static CURRENT: Lazy<RwLock<Arc<Defaults>>> = Lazy::new(|| RwLock::new(Arc::new(LOADED.clone())));

/// Defaults currently in effect.
pub fn defaults() -> Arc<Defaults> {
    let current = CURRENT.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&*current)
}

/// Replaces the defaults in effect for the whole process.
pub fn set_defaults(defaults: Defaults) {
    *CURRENT.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(defaults);
}

/// Restores the defaults loaded from `fieldwise.toml` and the environment.
pub fn reset_defaults() {
    set_defaults(LOADED.clone());
}

/// fieldwise's process-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub recursive_comparison: RecursiveComparisonDefaults,
    pub representation: RepresentationDefaults,
}

/// Policies every recursive comparison starts from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecursiveComparisonDefaults {
    pub strict_type_checking: bool,
    pub ignore_collection_order: bool,
    pub allow_expected_array: bool,
    /// Append the configuration description to failure reports.
    pub report_configuration: bool,
}

impl Default for RecursiveComparisonDefaults {
    fn default() -> Self {
        RecursiveComparisonDefaults {
            strict_type_checking: false,
            ignore_collection_order: false,
            allow_expected_array: false,
            report_configuration: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepresentationDefaults {
    /// Rendered values longer than this many characters are truncated.
    pub max_length: usize,
}

impl Default for RepresentationDefaults {
    fn default() -> Self {
        RepresentationDefaults {
            max_length: StandardRepresentation::DEFAULT_MAX_LENGTH,
        }
    }
}

impl RepresentationDefaults {
    pub fn representation(&self) -> StandardRepresentation {
        StandardRepresentation::new(self.max_length)
    }
}

fn looks_like_path(value: &str) -> bool {
    Path::new(value).extension().is_some_and(|ext| ext == "toml")
        || value.contains(std::path::MAIN_SEPARATOR)
        || value.contains('/')
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| {
        Error::LoadError(format!(
            "invalid value {value:?} for FIELDWISE_{}: {e}",
            key.to_uppercase()
        ))
    })
}

impl Defaults {
    /// Load defaults from path. A missing file yields the built-in defaults.
    pub fn load_from(path: &Path) -> Result<Defaults> {
        let Ok(mut file) = std::fs::File::open(path) else {
            return Ok(Defaults::default());
        };

        let mut buf = String::new();
        file.read_to_string(&mut buf)
            .map_err(|e| Error::LoadError(e.to_string()))?;

        let defaults: Defaults = toml::from_str(&buf).map_err(|e| {
            Error::LoadError(format!(
                "failed to deserialize {} into fieldwise::Defaults: {e}",
                path.display()
            ))
        })?;
        debug!("{} was successfully loaded: {defaults:#?}", path.display());

        Ok(defaults)
    }

    /// Load defaults.
    ///
    /// Loading order:
    /// 1. If `FIELDWISE_CONFIG` env var is set, load from that path
    /// 2. Otherwise, load from `fieldwise.toml` in the current directory
    /// 3. Apply `FIELDWISE_*` environment overrides
    fn load() -> Result<Defaults> {
        let mut defaults = match std::env::var(FIELDWISE_CONFIG_ENV) {
            Ok(value) => {
                if !looks_like_path(&value) {
                    return Err(Error::LoadError(format!(
                        "{FIELDWISE_CONFIG_ENV} should be a path to a config file, not a config value. \
                         Got: {value:?}. Use FIELDWISE_<KEY>=value for config values instead."
                    )));
                }

                let path = Path::new(&value);
                if !path.exists() {
                    return Err(Error::LoadError(format!(
                        "Config file specified by {FIELDWISE_CONFIG_ENV} not found: {path:?}"
                    )));
                }

                debug!("Loading defaults from {FIELDWISE_CONFIG_ENV}={path:?}");
                Defaults::load_from(path)?
            }
            Err(_) => Defaults::load_from(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        defaults.load_env(std::env::vars())?;
        Ok(defaults)
    }

    /// Applies `FIELDWISE_<KEY>=value` overrides. Unknown keys are skipped.
    fn load_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) -> Result<()> {
        static PREFIX: &str = "FIELDWISE_";

        for (key, value) in vars {
            if key == FIELDWISE_CONFIG_ENV {
                continue;
            }
            let Some(name) = key.strip_prefix(PREFIX) else {
                continue;
            };

            let name = name.to_lowercase();
            let comparison = &mut self.recursive_comparison;
            match name.as_str() {
                "strict_type_checking" => comparison.strict_type_checking = parse(&name, &value)?,
                "ignore_collection_order" => {
                    comparison.ignore_collection_order = parse(&name, &value)?
                }
                "allow_expected_array" => comparison.allow_expected_array = parse(&name, &value)?,
                "report_configuration" => comparison.report_configuration = parse(&name, &value)?,
                "max_length" => self.representation.max_length = parse(&name, &value)?,
                _ => {
                    trace!("{key} is not a fieldwise setting, skipped");
                    continue;
                }
            }
            debug!("{key}={value:?} applied to defaults");
        }
        Ok(())
    }
}
