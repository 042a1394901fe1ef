//! Settings for constructing an [`Op`](crate::Op).

use crate::account::{ConfigSource, FileConfigSource};
use crate::cli::{CommandRunner, SystemRunner};
use crate::{OpError, Result};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable naming the account shorthand.
pub const ACCOUNT_ENV: &str = "OP_ACCOUNT";
/// Environment variable holding the sign-in password.
pub const PASSWORD_ENV: &str = "OP_PASSWORD";
/// Environment variable holding the sign-in address.
pub const URL_ENV: &str = "OP_SIGNIN_URL";
/// Environment variable holding the account email.
pub const EMAIL_ENV: &str = "OP_EMAIL";
/// Environment variable holding the account secret key.
pub const SECRET_KEY_ENV: &str = "OP_SECRET_KEY";

/// How `op signin` is driven when no session token is cached.
#[derive(Clone, PartialEq, Eq)]
pub enum SignInMode {
    /// `op signin <account>`, reading the password from the terminal.
    Interactive,
    /// `op signin <account>`, with the password piped to standard input.
    Password(String),
    /// `op signin <url> <email> <secret-key>`, without `~/.op/config`.
    ConfigFree {
        /// Sign-in address, e.g. `my.1password.com`
        url: String,
        /// Account email
        email: String,
        /// Account secret key
        secret_key: String,
        /// Password piped to standard input, if known
        password: Option<String>,
    },
}

impl fmt::Debug for SignInMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interactive => write!(f, "Interactive"),
            Self::Password(_) => write!(f, "Password(<redacted>)"),
            Self::ConfigFree { url, email, password, .. } => f
                .debug_struct("ConfigFree")
                .field("url", url)
                .field("email", email)
                .field("secret_key", &"<redacted>")
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Configuration for an [`Op`](crate::Op) session.
///
/// Use the builder methods for ergonomic configuration:
///
/// ```
/// use opsession::Settings;
///
/// let settings = Settings::new()
///     .with_account("my")
///     .with_password("correct horse battery staple");
///
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct Settings {
    /// Account shorthand; resolved from `~/.op/config` when empty
    pub account: String,

    /// Password piped to `op signin`
    pub password: Option<String>,

    /// Run `op` as this user id (requires privileges to switch uid)
    pub uid: Option<u32>,

    /// Sign-in address for config-free sign-in
    pub url: String,

    /// Account email for config-free sign-in
    pub email: String,

    /// Account secret key for config-free sign-in
    pub secret_key: String,

    config_source: Arc<dyn ConfigSource>,
    runner: Arc<dyn CommandRunner>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account: String::new(),
            password: None,
            uid: None,
            url: String::new(),
            email: String::new(),
            secret_key: String::new(),
            config_source: Arc::new(FileConfigSource::default()),
            runner: Arc::new(SystemRunner),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("account", &self.account)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("uid", &self.uid)
            .field("url", &self.url)
            .field("email", &self.email)
            .field(
                "secret_key",
                &(!self.secret_key.is_empty()).then_some("<redacted>"),
            )
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Creates default settings: account from `~/.op/config`, interactive
    /// sign-in, real `op` processes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates settings from `OP_ACCOUNT`, `OP_PASSWORD`, `OP_SIGNIN_URL`,
    /// `OP_EMAIL` and `OP_SECRET_KEY`.
    ///
    /// Unset or empty variables leave the corresponding setting at its
    /// default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(account) = get(ACCOUNT_ENV) {
            settings.account = account;
        }
        settings.password = get(PASSWORD_ENV);
        settings.url = get(URL_ENV).unwrap_or_default();
        settings.email = get(EMAIL_ENV).unwrap_or_default();
        settings.secret_key = get(SECRET_KEY_ENV).unwrap_or_default();
        settings
    }

    /// Sets the account shorthand to sign in to.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    /// Sets the password piped to `op signin`.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Runs `op` as the given user id.
    ///
    /// The calling process must be allowed to switch user ids.
    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Sets the sign-in address for config-free sign-in.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the account email for config-free sign-in.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Sets the secret key for config-free sign-in.
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = secret_key.into();
        self
    }

    /// Reads the `op` configuration from `path` instead of `~/.op/config`.
    ///
    /// A leading `~/` is expanded to the home directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_source = Arc::new(FileConfigSource::new(path));
        self
    }

    /// Reads the `op` configuration through a custom source.
    pub fn with_config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.config_source = source;
        self
    }

    /// Runs commands through a custom runner instead of real processes.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// The configured configuration source.
    pub fn config_source(&self) -> Arc<dyn ConfigSource> {
        Arc::clone(&self.config_source)
    }

    /// The configured command runner.
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }

    /// True when url, email and secret key are all set.
    pub fn is_config_free(&self) -> bool {
        !self.url.is_empty() && !self.email.is_empty() && !self.secret_key.is_empty()
    }

    /// Checks that the settings describe exactly one way of signing in.
    ///
    /// # Errors
    ///
    /// Returns [`OpError::InvalidSettings`] if only some of url, email and
    /// secret key are set.
    pub fn validate(&self) -> Result<()> {
        let set = [&self.url, &self.email, &self.secret_key]
            .iter()
            .filter(|v| !v.is_empty())
            .count();

        if set != 0 && set != 3 {
            return Err(OpError::InvalidSettings(
                "url, email and secret key must be supplied together".to_string(),
            ));
        }

        Ok(())
    }

    /// The sign-in mode these settings select.
    ///
    /// Config-free sign-in takes precedence over password and interactive
    /// sign-in.
    pub fn sign_in_mode(&self) -> SignInMode {
        if self.is_config_free() {
            SignInMode::ConfigFree {
                url: self.url.clone(),
                email: self.email.clone(),
                secret_key: self.secret_key.clone(),
                password: self.password.clone(),
            }
        } else if let Some(password) = self.password.clone().filter(|p| !p.is_empty()) {
            SignInMode::Password(password)
        } else {
            SignInMode::Interactive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_settings_builder() {
        let settings = Settings::new()
            .with_account("work")
            .with_password("pw")
            .with_uid(501);

        assert_eq!(settings.account, "work");
        assert_eq!(settings.password.as_deref(), Some("pw"));
        assert_eq!(settings.uid, Some(501));
        assert_eq!(settings.sign_in_mode(), SignInMode::Password("pw".to_string()));
    }

    #[test]
    fn test_default_is_interactive() {
        let settings = Settings::default();
        assert!(settings.account.is_empty());
        assert_eq!(settings.sign_in_mode(), SignInMode::Interactive);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_password_is_interactive() {
        let settings = Settings::new().with_password("");
        assert_eq!(settings.sign_in_mode(), SignInMode::Interactive);
    }

    #[test]
    fn test_config_free_takes_precedence() {
        let settings = Settings::new()
            .with_account("work")
            .with_password("pw")
            .with_url("my.1password.com")
            .with_email("me@example.com")
            .with_secret_key("A3-XXXX");

        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.sign_in_mode(),
            SignInMode::ConfigFree {
                url: "my.1password.com".to_string(),
                email: "me@example.com".to_string(),
                secret_key: "A3-XXXX".to_string(),
                password: Some("pw".to_string()),
            }
        );
    }

    #[test]
    fn test_partial_triple_rejected() {
        let settings = Settings::new()
            .with_account("work")
            .with_url("my.1password.com")
            .with_email("me@example.com");

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("supplied together"));
        assert_eq!(settings.sign_in_mode(), SignInMode::Interactive);
    }

    #[test]
    fn test_config_free_without_account_is_valid() {
        let settings = Settings::new()
            .with_url("my.1password.com")
            .with_email("me@example.com")
            .with_secret_key("A3-XXXX");

        settings.validate().unwrap();
        assert!(settings.is_config_free());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ACCOUNT_ENV, "work"),
            (PASSWORD_ENV, ""),
            (URL_ENV, "my.1password.com"),
            (EMAIL_ENV, "me@example.com"),
            (SECRET_KEY_ENV, "A3-XXXX"),
        ]
        .into_iter()
        .collect();

        let settings = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(settings.account, "work");
        assert_eq!(settings.password, None);
        assert!(settings.is_config_free());
    }

    #[test]
    fn test_from_lookup_config_free_without_account() {
        let vars: HashMap<&str, &str> = [
            (URL_ENV, "my.1password.com"),
            (EMAIL_ENV, "me@example.com"),
            (SECRET_KEY_ENV, "A3-XXXX"),
        ]
        .into_iter()
        .collect();

        let settings = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert!(settings.account.is_empty());
        settings.validate().unwrap();
        assert!(matches!(settings.sign_in_mode(), SignInMode::ConfigFree { .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = Settings::new()
            .with_password("hunter2")
            .with_secret_key("A3-SECRET");
        let debug = format!("{:?}", settings);

        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("A3-SECRET"));
        assert!(debug.contains("<redacted>"));
    }
}
