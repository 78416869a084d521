//! Active environment selection.
//!
//! Each environment has its own monitored-service file. The active one is
//! owned by an [`EnvironmentHandle`] that is cloned into whichever component
//! needs to resolve the current file; there is no process-wide static.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;

use crate::config::{CONFIG_FILE_HOMOLOG, CONFIG_FILE_PROD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Homolog,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Homolog, Environment::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Homolog => "homolog",
            Environment::Prod => "prod",
        }
    }

    pub fn config_file_name(&self) -> &'static str {
        match self {
            Environment::Homolog => CONFIG_FILE_HOMOLOG,
            Environment::Prod => CONFIG_FILE_PROD,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}', expected 'homolog' or 'prod'")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    /// Case-insensitive; surrounding whitespace and quotes are ignored.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let name = text
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'')
            .trim()
            .to_ascii_lowercase();
        match name.as_str() {
            "homolog" => Ok(Environment::Homolog),
            "prod" => Ok(Environment::Prod),
            _ => Err(UnknownEnvironment(name)),
        }
    }
}

/// Shared, lock-guarded owner of the active environment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentHandle {
    active: Arc<RwLock<Environment>>,
}

impl EnvironmentHandle {
    pub fn new(initial: Environment) -> Self {
        Self {
            active: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn current(&self) -> Environment {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch the active environment, returning the previous one.
    pub fn set(&self, environment: Environment) -> Environment {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *active, environment)
    }

    /// Path of the active environment's service file inside `dir`.
    pub fn config_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.current().config_file_name())
    }
}
