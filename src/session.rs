//! Session discovery and sign-in.
//!
//! A session token for account `A` lives in the `OP_SESSION_A` environment
//! variable by `op` convention. [`SessionTokenStore::ensure`] reuses a token
//! exported by a parent shell and otherwise runs `op signin`, capturing the
//! token from the `export` line it prints. The token is held in the returned
//! [`Session`] and handed to each child process; this process's environment
//! is never modified.

use crate::cli::{CommandRunner, OpCommand, Stdin};
use crate::config::SignInMode;
use crate::{OpError, Result};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Prefix of the environment variable holding a session token.
pub const ENV_PREFIX: &str = "OP_SESSION_";

/// Returns the session environment variable name for `account`.
///
/// ```
/// assert_eq!(opsession::session::env_var_name("my"), "OP_SESSION_my");
/// ```
pub fn env_var_name(account: &str) -> String {
    format!("{}{}", ENV_PREFIX, account)
}

/// An authenticated `op` session for one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    account: String,
    env_var: String,
    token: String,
}

impl Session {
    /// Creates a session from an account shorthand and its token.
    pub fn new(account: impl Into<String>, token: impl Into<String>) -> Self {
        let account = account.into();
        Self {
            env_var: env_var_name(&account),
            account,
            token: token.into(),
        }
    }

    /// The account shorthand.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The environment variable `op` reads the token from.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// The session token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("env_var", &self.env_var)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Finds the token `op signin` exported for `env_var`.
///
/// Scans line by line for `export <env_var>="<token>"`; the first matching
/// line decides.
pub fn find_token(output: &str, env_var: &str) -> Option<String> {
    let pattern = format!(r#"export {}="(.*)""#, regex::escape(env_var));
    let re = Regex::new(&pattern).ok()?;

    output
        .lines()
        .find_map(|line| re.captures(line).map(|caps| caps[1].to_string()))
        .filter(|token| !token.is_empty())
}

/// Produces sessions, from the environment or by signing in.
#[derive(Clone)]
pub struct SessionTokenStore {
    runner: Arc<dyn CommandRunner>,
    uid: Option<u32>,
}

impl SessionTokenStore {
    /// Creates a store that signs in through `runner`.
    ///
    /// `uid` applies to account-based sign-in only.
    pub fn new(runner: Arc<dyn CommandRunner>, uid: Option<u32>) -> Self {
        Self { runner, uid }
    }

    /// Returns a session for `account`.
    ///
    /// A non-empty `OP_SESSION_<account>` in the environment is used as is,
    /// without running anything. Otherwise `op signin` runs according to
    /// `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`OpError::SignIn`] wrapping the cause when `op signin` fails
    /// or its output carries no token ([`OpError::TokenNotFound`]).
    pub async fn ensure(&self, account: &str, mode: &SignInMode) -> Result<Session> {
        let env_var = env_var_name(account);

        if let Some(token) = std::env::var(&env_var).ok().filter(|t| !t.is_empty()) {
            debug!(account, env_var = %env_var, "reusing session token from environment");
            return Ok(Session::new(account, token));
        }

        self.sign_in(account, &env_var, mode)
            .await
            .map_err(|e| OpError::SignIn {
                account: account.to_string(),
                source: Box::new(e),
            })
    }

    async fn sign_in(&self, account: &str, env_var: &str, mode: &SignInMode) -> Result<Session> {
        let command = match mode {
            SignInMode::ConfigFree {
                url,
                email,
                secret_key,
                password,
            } => {
                info!(
                    account,
                    url = %url,
                    email = %email,
                    "signing in with url, email and secret key"
                );
                OpCommand::op(&[
                    "signin",
                    url.as_str(),
                    email.as_str(),
                    secret_key.as_str(),
                ])
                .redact(3)
                .with_stdin(password_stdin(password.as_deref()))
            }
            SignInMode::Password(password) => {
                info!(account, "signing in with supplied password");
                OpCommand::op(&["signin", account])
                    .with_stdin(Stdin::Password(password.clone()))
                    .with_uid(self.uid)
            }
            SignInMode::Interactive => {
                info!(account, "signing in interactively");
                OpCommand::op(&["signin", account])
                    .with_stdin(Stdin::Inherit)
                    .with_uid(self.uid)
            }
        };

        let output = self.runner.run(&command).await?;
        if !output.success {
            return Err(OpError::CommandFailed {
                command: command.describe(),
                output: String::from_utf8_lossy(&output.combined()).trim_end().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let token = find_token(&stdout, env_var).ok_or_else(|| OpError::TokenNotFound {
            env_var: env_var.to_string(),
        })?;

        debug!(account, "sign-in issued a session token");
        Ok(Session::new(account, token))
    }
}

fn password_stdin(password: Option<&str>) -> Stdin {
    match password {
        Some(p) if !p.is_empty() => Stdin::Password(p.to_string()),
        _ => Stdin::Inherit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CommandOutput;
    use crate::mock::MockRunner;

    fn store(runner: &Arc<MockRunner>) -> SessionTokenStore {
        SessionTokenStore::new(runner.clone(), Some(501))
    }

    #[test]
    fn test_find_token() {
        let output = "# This command is meant to be used with your shell's eval function.\n\
                      export OP_SESSION_work=\"tok123\"\n\
                      # Run:  eval $(op signin work)\n";
        assert_eq!(find_token(output, "OP_SESSION_work").as_deref(), Some("tok123"));
    }

    #[test]
    fn test_find_token_ignores_other_accounts() {
        let output = "export OP_SESSION_personal=\"nope\"\nexport OP_SESSION_work=\"yes\"";
        assert_eq!(find_token(output, "OP_SESSION_work").as_deref(), Some("yes"));
        assert_eq!(find_token(output, "OP_SESSION_other"), None);
    }

    #[test]
    fn test_find_token_first_match_wins() {
        let output = "export OP_SESSION_w=\"first\"\nexport OP_SESSION_w=\"second\"";
        assert_eq!(find_token(output, "OP_SESSION_w").as_deref(), Some("first"));
    }

    #[test]
    fn test_find_token_escapes_account() {
        assert_eq!(find_token("export OP_SESSION_aXb=\"t\"", "OP_SESSION_a.b"), None);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("work", "super-secret-token");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("super-secret-token"));
        assert_eq!(session.env_var(), "OP_SESSION_work");
    }

    #[tokio::test]
    async fn test_cached_token_skips_sign_in() {
        let account = "opsession_unit_cached";
        std::env::set_var(env_var_name(account), "from-env");

        let runner = Arc::new(MockRunner::new());
        let session = store(&runner)
            .ensure(account, &SignInMode::Interactive)
            .await
            .unwrap();

        assert_eq!(session.token(), "from-env");
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_cached_token_signs_in() {
        let account = "opsession_unit_empty";
        std::env::set_var(env_var_name(account), "");

        let runner = Arc::new(MockRunner::new());
        runner.push_output(CommandOutput::success(format!(
            "export OP_SESSION_{account}=\"fresh\"\n"
        )));

        let session = store(&runner)
            .ensure(account, &SignInMode::Interactive)
            .await
            .unwrap();

        assert_eq!(session.token(), "fresh");
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let account = "opsession_unit_pw";
        let runner = Arc::new(MockRunner::new());
        runner.push_output(CommandOutput::success(format!(
            "export OP_SESSION_{account}=\"tok123\"\n"
        )));

        let session = store(&runner)
            .ensure(account, &SignInMode::Password("hunter2".to_string()))
            .await
            .unwrap();

        assert_eq!(session.token(), "tok123");
        assert_eq!(session.account(), account);

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["signin", account]);
        assert_eq!(calls[0].stdin, Stdin::Password("hunter2".to_string()));
        assert_eq!(calls[0].uid, Some(501));
        assert!(calls[0].env.is_empty());
    }

    #[tokio::test]
    async fn test_interactive_sign_in_inherits_stdin() {
        let account = "opsession_unit_interactive";
        let runner = Arc::new(MockRunner::new());
        runner.push_output(CommandOutput::success(format!(
            "export OP_SESSION_{account}=\"tok\""
        )));

        store(&runner)
            .ensure(account, &SignInMode::Interactive)
            .await
            .unwrap();

        assert_eq!(runner.calls()[0].stdin, Stdin::Inherit);
    }

    #[tokio::test]
    async fn test_config_free_sign_in() {
        let account = "opsession_unit_config_free";
        let runner = Arc::new(MockRunner::new());
        runner.push_output(CommandOutput::success(format!(
            "export OP_SESSION_{account}=\"tok\""
        )));

        let mode = SignInMode::ConfigFree {
            url: "my.1password.com".to_string(),
            email: "me@example.com".to_string(),
            secret_key: "A3-SECRET".to_string(),
            password: Some("hunter2".to_string()),
        };
        store(&runner).ensure(account, &mode).await.unwrap();

        let calls = runner.calls();
        assert_eq!(
            calls[0].args,
            vec!["signin", "my.1password.com", "me@example.com", "A3-SECRET"]
        );
        assert_eq!(calls[0].stdin, Stdin::Password("hunter2".to_string()));
        assert_eq!(calls[0].uid, None);
        assert!(!calls[0].describe().contains("A3-SECRET"));
    }

    #[tokio::test]
    async fn test_missing_export_line_is_an_error() {
        let account = "opsession_unit_no_export";
        let runner = Arc::new(MockRunner::new());
        runner.push_output(CommandOutput::success("Signed in.\n"));

        let err = store(&runner)
            .ensure(account, &SignInMode::Interactive)
            .await
            .unwrap_err();

        assert!(matches!(err, OpError::SignIn { .. }));
        assert!(matches!(err.root(), OpError::TokenNotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_sign_in_names_account() {
        let account = "opsession_unit_fail";
        let runner = Arc::new(MockRunner::new());
        runner.push_output(CommandOutput::failure("[ERROR] 401: Unauthorized\n"));

        let err = store(&runner)
            .ensure(account, &SignInMode::Password("wrong".to_string()))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(account), "{message}");
        assert!(message.contains("Unauthorized"), "{message}");
    }
}
