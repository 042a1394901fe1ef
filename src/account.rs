//! Account resolution from the `op` configuration file.

use crate::{OpError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Location of the `op` configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "~/.op/config";

/// Supplies the raw bytes of the `op` configuration file.
pub trait ConfigSource: Send + Sync {
    /// Reads the configuration record.
    ///
    /// # Errors
    ///
    /// - [`OpError::ConfigMissing`]: the record does not exist
    /// - [`OpError::ConfigRead`]: the record exists but cannot be read
    fn read(&self) -> Result<Vec<u8>>;
}

/// Reads the configuration from a file on disk.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    /// Creates a source reading `path`; a leading `~/` is expanded on read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The unexpanded path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigSource {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigSource for FileConfigSource {
    fn read(&self) -> Result<Vec<u8>> {
        let path = expand_home(&self.path)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OpError::ConfigMissing(path)),
            Err(source) => Err(OpError::ConfigRead { path, source }),
        }
    }
}

/// Expands a leading `~` to the current user's home directory.
///
/// # Errors
///
/// Returns [`OpError::HomeDirUnavailable`] if the path starts with `~` and
/// the home directory cannot be determined.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };

    let home = dirs::home_dir()
        .ok_or_else(|| OpError::HomeDirUnavailable(path.display().to_string()))?;
    Ok(home.join(rest))
}

#[derive(Debug, Deserialize)]
struct OpConfig {
    #[serde(default)]
    latest_signin: Option<String>,
    #[serde(default)]
    accounts: Vec<OpAccount>,
}

#[derive(Debug, Deserialize)]
struct OpAccount {
    #[serde(default)]
    shorthand: String,
}

/// Determines which account to sign in to.
#[derive(Clone)]
pub struct AccountResolver {
    source: Arc<dyn ConfigSource>,
}

impl AccountResolver {
    /// Creates a resolver reading configuration from `source`.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    /// Returns `explicit` if it is non-empty, otherwise the account named
    /// by the configuration record.
    ///
    /// From the configuration, the most recent sign-in wins, then a sole
    /// configured account. An explicit account is not checked against the
    /// configuration; a bad name surfaces when signing in.
    ///
    /// # Errors
    ///
    /// - [`OpError::ConfigMissing`] / [`OpError::ConfigRead`]: no readable record
    /// - [`OpError::ConfigParse`]: the record is not valid JSON
    /// - [`OpError::AmbiguousAccount`]: several accounts and no recent sign-in
    /// - [`OpError::UndeterminedAccount`]: no accounts at all
    pub fn resolve(&self, explicit: &str) -> Result<String> {
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }

        let data = self.source.read()?;
        let config: OpConfig = serde_json::from_slice(&data).map_err(OpError::ConfigParse)?;

        if let Some(latest) = config.latest_signin.filter(|l| !l.is_empty()) {
            debug!(account = %latest, "using most recent sign-in from op config");
            return Ok(latest);
        }

        match config.accounts.as_slice() {
            [only] => {
                debug!(account = %only.shorthand, "using sole account from op config");
                Ok(only.shorthand.clone())
            }
            [] => Err(OpError::UndeterminedAccount),
            many => Err(OpError::AmbiguousAccount(many.len())),
        }
    }
}
