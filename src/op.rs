//! The [`Op`] session facade.

use crate::account::AccountResolver;
use crate::cli::Invoker;
use crate::item::{ItemCategory, ItemDetails};
use crate::session::{Session, SessionTokenStore};
use crate::store::{ItemStore, ITEM};
use crate::{OpError, Result, Settings};
use tracing::info;

/// A signed-in 1Password session.
///
/// Construction resolves the account, then reuses an `OP_SESSION_<account>`
/// token from the environment or signs in. Every method afterwards runs
/// `op` with that token. Nothing is retried: if `op` later rejects the
/// token, methods return [`OpError::SessionExpired`] and a new `Op` has to
/// be built.
///
/// # Example
///
/// ```no_run
/// use opsession::{Op, Settings};
///
/// #[tokio::main]
/// async fn main() -> opsession::Result<()> {
///     let op = Op::new(Settings::new().with_account("my")).await?;
///
///     let (user, pass) = op.get_user_pass("github").await?;
///     let code = op.get_totp("github").await?;
///     println!("{} / {} / {}", user, pass.len(), code);
///
///     op.set_secure_note("deploy-notes", "rotate keys on friday").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Op {
    store: ItemStore,
}

impl Op {
    /// Resolves the account and establishes a session.
    ///
    /// # Errors
    ///
    /// - [`OpError::InvalidSettings`]: inconsistent sign-in settings
    /// - configuration errors from [`AccountResolver::resolve`]
    /// - [`OpError::SignIn`]: `op signin` failed or printed no token
    pub async fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let account = AccountResolver::new(settings.config_source()).resolve(&settings.account)?;

        let runner = settings.runner();
        let session = SessionTokenStore::new(runner.clone(), settings.uid)
            .ensure(&account, &settings.sign_in_mode())
            .await?;

        Ok(Self {
            store: ItemStore::new(Invoker::new(runner, settings.uid), session),
        })
    }

    /// The account shorthand this session belongs to.
    pub fn account(&self) -> &str {
        self.store.session().account()
    }

    /// The environment variable carrying the session token.
    pub fn env_var(&self) -> &str {
        self.store.session().env_var()
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        self.store.session()
    }

    /// The item store used by this session.
    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Returns the username and password of a login item.
    ///
    /// # Errors
    ///
    /// Returns [`OpError::MissingCredentials`] unless the item has both a
    /// non-empty `username` and a non-empty `password` field.
    pub async fn get_user_pass(&self, item: &str) -> Result<(String, String)> {
        let fetched = self.store.get(ITEM, item).await?;

        match (fetched.field("username"), fetched.field("password")) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Ok((user.to_string(), pass.to_string()))
            }
            _ => Err(OpError::MissingCredentials(item.to_string())),
        }
    }

    /// Returns the current one-time code of an item.
    pub async fn get_totp(&self, item: &str) -> Result<String> {
        self.store
            .totp(item)
            .await
            .map_err(|e| OpError::operation("get totp for", item, e))
    }

    /// Returns username, password and current one-time code.
    ///
    /// The one-time code is only requested once the credentials were found.
    pub async fn get_user_pass_totp(&self, item: &str) -> Result<(String, String, String)> {
        let (user, pass) = self.get_user_pass(item).await?;
        let totp = self.get_totp(item).await?;
        Ok((user, pass, totp))
    }

    /// Returns the notes of a secure note; an item without notes yields an
    /// empty string.
    pub async fn get_secure_note(&self, item: &str) -> Result<String> {
        let fetched = self.store.get(ITEM, item).await?;
        Ok(fetched.details.notes_plain)
    }

    /// Creates or replaces a secure note.
    ///
    /// Any existing item with this title is deleted first.
    pub async fn set_secure_note(&self, item: &str, note: &str) -> Result<()> {
        info!(account = %self.account(), item, "replacing secure note");

        self.store.delete(ITEM, item).await?;
        self.store
            .create(ITEM, item, ItemCategory::SecureNote, &ItemDetails::secure_note(note))
            .await
    }
}
