//! Error types for opsession operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`OpError`].
pub type Result<T> = std::result::Result<T, OpError>;

/// Errors that can occur while talking to the `op` CLI.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum OpError {
    /// The `op` configuration file does not exist.
    #[error("the op config file {} does not exist, please sign in first", .0.display())]
    ConfigMissing(PathBuf),

    /// The `op` configuration file exists but could not be read.
    #[error("unable to read op config {}: {source}", .path.display())]
    ConfigRead {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The `op` configuration file is not valid JSON.
    #[error("unable to parse op config: {0}")]
    ConfigParse(#[source] serde_json::Error),

    /// Several accounts are configured and none was selected.
    #[error("found {0} accounts, please supply an explicit account name")]
    AmbiguousAccount(usize),

    /// No account could be derived from the configuration.
    #[error("cannot determine which 1Password account to use")]
    UndeterminedAccount,

    /// The home directory is needed to expand a path but is unknown.
    #[error("unable to expand '{0}': home directory unavailable")]
    HomeDirUnavailable(String),

    /// Settings are inconsistent.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Signing in to the account failed.
    #[error("unable to sign in to {account}: {source}")]
    SignIn {
        /// Account being signed in to
        account: String,
        /// Underlying error
        #[source]
        source: Box<OpError>,
    },

    /// Sign-in succeeded but its output did not carry a session token.
    #[error("couldn't find {env_var} in op output")]
    TokenNotFound {
        /// Environment variable that was searched for
        env_var: String,
    },

    /// `op` reported that it needs authentication: the cached token is stale.
    #[error("found stale {env_var} variable in environment")]
    SessionExpired {
        /// Environment variable holding the stale token
        env_var: String,
    },

    /// Item was not found in the vault.
    #[error("item not found: {0}")]
    NotFound(String),

    /// Item exists but lacks a username or password.
    #[error("couldn't find username and password in '{0}'")]
    MissingCredentials(String),

    /// Item name cannot be passed to `op`.
    #[error("invalid item name: {0}")]
    InvalidItemName(String),

    /// `op` exited non-zero with output matching no known signature.
    #[error("error running {command}: {output}")]
    CommandFailed {
        /// Command line that failed (secrets elided)
        command: String,
        /// Raw combined output of the command
        output: String,
    },

    /// The `op` binary could not be started.
    #[error("op CLI not installed: {0}")]
    ToolNotInstalled(String),

    /// Operation failed with context.
    #[error("cannot {operation} {item}: {source}")]
    Operation {
        /// Operation name (get totp, set secure note, ...)
        operation: String,
        /// Item name
        item: String,
        /// Underlying error
        #[source]
        source: Box<OpError>,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OpError {
    /// Wraps an error with the operation and item that produced it.
    ///
    /// # Example
    ///
    /// ```
    /// use opsession::OpError;
    ///
    /// let err = OpError::NotFound("github".to_string());
    /// let wrapped = OpError::operation("get totp for", "github", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "cannot get totp for github: item not found: github"
    /// );
    /// ```
    pub fn operation(
        operation: impl Into<String>,
        item: impl Into<String>,
        err: OpError,
    ) -> Self {
        Self::Operation {
            operation: operation.into(),
            item: item.into(),
            source: Box::new(err),
        }
    }

    /// Returns the innermost error, looking through context wrappers.
    pub fn root(&self) -> &OpError {
        match self {
            Self::Operation { source, .. } | Self::SignIn { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the referenced item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound(_))
    }

    /// True when `op` rejected the cached session token.
    ///
    /// A fresh [`Op`](crate::Op) must be constructed (after clearing the
    /// stale environment variable) to recover.
    pub fn is_session_expired(&self) -> bool {
        matches!(self.root(), Self::SessionExpired { .. })
    }
}
