//! Item operations against a signed-in session.

use crate::classify::{classify, Classification};
use crate::cli::{Invoker, OpCommand};
use crate::item::{Item, ItemCategory, ItemDetails};
use crate::session::Session;
use crate::validation::validate_item_name;
use crate::{OpError, Result};
use tracing::{debug, warn};

/// The `op` object type for vault items.
pub const ITEM: &str = "item";

/// Gets, creates and deletes items with one session.
///
/// `op` has no update-in-place for the payloads used here; replacing an item
/// means [`delete`](Self::delete) followed by [`create`](Self::create), and
/// `create` refuses a title that already exists.
#[derive(Debug, Clone)]
pub struct ItemStore {
    invoker: Invoker,
    session: Session,
}

impl ItemStore {
    /// Creates a store running commands through `invoker` as `session`.
    pub fn new(invoker: Invoker, session: Session) -> Self {
        Self { invoker, session }
    }

    /// The session commands run with.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs `op get <kind> <name>` and parses the item.
    ///
    /// # Errors
    ///
    /// - [`OpError::SessionExpired`]: the session token was rejected
    /// - [`OpError::NotFound`]: no such item
    /// - [`OpError::Operation`] wrapping [`OpError::Json`]: `op` printed
    ///   something that is not an item
    pub async fn get(&self, kind: &str, name: &str) -> Result<Item> {
        validate_item_name(name)?;

        let out = self
            .invoker
            .run(&self.session, &["get", kind, name])
            .await
            .map_err(|e| self.interpret(e, name, true))?;

        serde_json::from_slice(&out).map_err(|e| OpError::operation("parse", name, e.into()))
    }

    /// Runs `op get totp <name>` and returns the current code.
    pub async fn totp(&self, name: &str) -> Result<String> {
        validate_item_name(name)?;

        let out = self
            .invoker
            .run(&self.session, &["get", "totp", name])
            .await
            .map_err(|e| self.interpret(e, name, true))?;

        String::from_utf8(out)
            .map_err(|e| OpError::Other(anyhow::anyhow!("invalid UTF-8 in op output: {}", e)))
    }

    /// Runs `op delete <kind> <name>`.
    ///
    /// Deleting an item that does not exist succeeds.
    pub async fn delete(&self, kind: &str, name: &str) -> Result<()> {
        validate_item_name(name)?;

        match self.invoker.run(&self.session, &["delete", kind, name]).await {
            Ok(_) => Ok(()),
            Err(e) => match self.interpret(e, name, true) {
                OpError::NotFound(_) => {
                    debug!(item = name, "nothing to delete");
                    Ok(())
                }
                other => Err(other),
            },
        }
    }

    /// Runs `op create <kind> <category> <payload> --title <name>`.
    ///
    /// The payload is `details` encoded with [`ItemDetails::encode`].
    pub async fn create(
        &self,
        kind: &str,
        name: &str,
        category: ItemCategory,
        details: &ItemDetails,
    ) -> Result<()> {
        validate_item_name(name)?;

        let encoded = details.encode()?;
        let category = category.to_string();
        let command = OpCommand::op(&[
            "create",
            kind,
            category.as_str(),
            encoded.as_str(),
            "--title",
            name,
        ])
        .redact(3);

        self.invoker
            .run_command(&self.session, command)
            .await
            .map_err(|e| self.interpret(e, name, false))?;

        Ok(())
    }

    /// Turns a failed command into the error its output describes.
    fn interpret(&self, err: OpError, item: &str, not_found: bool) -> OpError {
        let OpError::CommandFailed { ref output, .. } = err else {
            return err;
        };

        match classify(output) {
            Classification::AuthRequired => {
                warn!(
                    account = %self.session.account(),
                    env_var = %self.session.env_var(),
                    "op rejected the session token"
                );
                OpError::SessionExpired {
                    env_var: self.session.env_var().to_string(),
                }
            }
            Classification::NotFound if not_found => OpError::NotFound(item.to_string()),
            _ => err,
        }
    }
}
