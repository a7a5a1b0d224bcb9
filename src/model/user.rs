//! Local user account model.

use serde::{Deserialize, Serialize};

/// A local account that owns imported wishes.
///
/// The provider identity is linked separately; imports are refused until
/// `provider_uid` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local identifier
    pub id: i64,

    /// Contact email (unique)
    pub email: String,

    /// Preferred provider language (e.g. "en-us")
    pub lang: Option<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Display name of the linked provider account
    pub provider_username: Option<String>,

    /// Linked provider account uid
    pub provider_uid: Option<String>,
}

impl User {
    /// The linked provider uid, treating an empty string as unlinked.
    #[must_use]
    pub fn linked_uid(&self) -> Option<&str> {
        self.provider_uid.as_deref().filter(|uid| !uid.trim().is_empty())
    }
}
