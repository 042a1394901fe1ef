//! opsession - typed access to 1Password through the `op` CLI.
//!
//! opsession runs the 1Password command-line tool on your behalf and hands
//! back typed results: username/password pairs, one-time codes and secure
//! notes. It takes care of the session along the way.
//!
//! # Features
//!
//! - **Session reuse**: an `OP_SESSION_<account>` token exported by the
//!   parent shell is picked up without signing in again
//! - **Three sign-in modes**: interactive, piped password, or
//!   url/email/secret key without `~/.op/config` (containers)
//! - **Isolated environment**: the token is passed to each `op` child
//!   process only; the calling process's environment is never modified
//! - **Classified failures**: stale sessions and missing items are distinct
//!   error variants
//! - **Testable**: swap in [`mock::MockRunner`] to script `op`'s output
//!
//! # Quick Start
//!
//! ```no_run
//! use opsession::{Op, Settings};
//!
//! #[tokio::main]
//! async fn main() -> opsession::Result<()> {
//!     // Account from ~/.op/config, password prompted on the terminal
//!     let op = Op::new(Settings::new()).await?;
//!
//!     let (user, pass) = op.get_user_pass("github").await?;
//!     let code = op.get_totp("github").await?;
//!
//!     op.set_secure_note("build-notes", "ship it").await?;
//!     let notes = op.get_secure_note("build-notes").await?;
//!
//!     println!("{} {} {} {}", user, pass.len(), code, notes);
//!     Ok(())
//! }
//! ```
//!
//! For one-off lookups the free functions [`get_user_pass`], [`get_totp`],
//! [`get_user_pass_totp`], [`get_secure_note`] and [`set_secure_note`]
//! build a default [`Op`] and call it once.
//!
//! # Logging
//!
//! opsession emits [`tracing`] events for sign-in and each `op` invocation.
//! Tokens, passwords, secret keys and item payloads are never logged.
//! Install a subscriber in your application to see them.

pub mod account;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod item;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod op;
pub mod session;
pub mod store;
pub mod validation;

pub use account::{AccountResolver, ConfigSource, FileConfigSource};
pub use classify::Classification;
pub use cli::{CommandOutput, CommandRunner, OpCommand, SystemRunner};
pub use config::{Settings, SignInMode};
pub use error::{OpError, Result};
pub use item::{Item, ItemCategory, ItemDetails, ItemField};
pub use op::Op;
pub use session::Session;

/// Returns the username and password of a login item using default
/// settings.
pub async fn get_user_pass(item: &str) -> Result<(String, String)> {
    Op::new(Settings::default()).await?.get_user_pass(item).await
}

/// Returns the current one-time code of an item using default settings.
pub async fn get_totp(item: &str) -> Result<String> {
    Op::new(Settings::default()).await?.get_totp(item).await
}

/// Returns username, password and one-time code using default settings.
pub async fn get_user_pass_totp(item: &str) -> Result<(String, String, String)> {
    Op::new(Settings::default())
        .await?
        .get_user_pass_totp(item)
        .await
}

/// Returns the notes of a secure note using default settings.
pub async fn get_secure_note(item: &str) -> Result<String> {
    Op::new(Settings::default()).await?.get_secure_note(item).await
}

/// Creates or replaces a secure note using default settings.
pub async fn set_secure_note(item: &str, note: &str) -> Result<()> {
    Op::new(Settings::default())
        .await?
        .set_secure_note(item, note)
        .await
}
