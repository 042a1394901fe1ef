//! Item data structures as exchanged with the `op` CLI.

use crate::{OpError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// An item as printed by `op get item`.
///
/// Fetched items are read-only snapshots; changing one does not change the
/// vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item title
    #[serde(default)]
    pub title: String,

    /// Fields and notes
    #[serde(default)]
    pub details: ItemDetails,
}

impl Item {
    /// Returns the value of the named field.
    ///
    /// When several fields share a name the last one wins.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.details
            .fields
            .iter()
            .rev()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// The plain-text notes, empty if the item has none.
    pub fn notes(&self) -> &str {
        &self.details.notes_plain
    }
}

/// The detail payload of an item: ordered fields plus notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    /// Named fields, in vault order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ItemField>,

    /// Plain-text notes
    #[serde(
        rename = "notesPlain",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub notes_plain: String,
}

impl ItemDetails {
    /// Details of a secure note holding `notes`.
    ///
    /// # Example
    ///
    /// ```
    /// use opsession::ItemDetails;
    ///
    /// let details = ItemDetails::secure_note("line one\nline two");
    /// assert!(details.fields.is_empty());
    /// assert_eq!(details.notes_plain, "line one\nline two");
    /// ```
    pub fn secure_note(notes: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            notes_plain: notes.into(),
        }
    }

    /// Encodes the details the way `op create` expects them: JSON, then
    /// URL-safe base64 without padding.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes details produced by [`encode`](Self::encode).
    pub fn decode(encoded: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|e| OpError::Other(anyhow::anyhow!("invalid base64 payload: {}", e)))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// One named field of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemField {
    /// Field name (e.g. `username`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Field value
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl ItemField {
    /// Creates a field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Category of a vault item, as named by `op create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemCategory {
    /// Login credentials (username/password)
    Login,
    /// Secure note (arbitrary text)
    SecureNote,
    /// Standalone password
    Password,
    /// Identity information
    Identity,
    /// Credit card
    CreditCard,
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "Login"),
            Self::SecureNote => write!(f, "Secure Note"),
            Self::Password => write!(f, "Password"),
            Self::Identity => write!(f, "Identity"),
            Self::CreditCard => write!(f, "Credit Card"),
        }
    }
}
