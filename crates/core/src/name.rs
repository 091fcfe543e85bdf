//! Qualified value names
//!
//! Every persisted value is addressed by a `QualifiedName`: an optional
//! namespace plus a local name, written `{namespace}local`.
//!
//! ## Examples
//!
//! - `{urn:schemas:workflow/core}bookmarks`
//! - `{urn:acme:orders}lastOrderId`
//! - `status` (no namespace)
//!
//! ## Validation
//!
//! Qualified names must:
//! - Have a non-empty local name
//! - Not exceed 1024 bytes in their `{namespace}local` form
//! - Not contain `{` or `}` in either part
//!
//! Names order by namespace first, then local name. Stores and views
//! enumerate in this order, which keeps persistence output deterministic
//! regardless of the order participants contributed values in.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a qualified name in its `{namespace}local` form
pub const MAX_QUALIFIED_NAME_LENGTH: usize = 1024;

/// Namespaced identifier for one persisted value
///
/// ## Validation Rules
///
/// - Local name: non-empty
/// - Neither part may contain `{` or `}`
/// - Rendered length: at most 1024 bytes
///
/// Valid names:
/// - "{urn:acme}counter"
/// - "counter"
/// - "{}counter" (explicit empty namespace, same as "counter")
///
/// Invalid names:
/// - "" (empty)
/// - "{urn:acme}" (empty local name)
/// - "{urn:acme" (unterminated namespace)
/// - "a}b"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    namespace: String,
    local: String,
}

impl QualifiedName {
    /// Create a name from its namespace and local parts
    ///
    /// An empty namespace means "no namespace".
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` if either part is invalid.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Result<Self> {
        let name = QualifiedName {
            namespace: namespace.into(),
            local: local.into(),
        };
        name.validate()?;
        Ok(name)
    }

    /// Create a name without a namespace
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` if the local name is invalid.
    pub fn local(local: impl Into<String>) -> Result<Self> {
        Self::new(String::new(), local)
    }

    /// Parse a name written as `{namespace}local` or `local`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` if the text is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        if let Some(rest) = text.strip_prefix('{') {
            match rest.find('}') {
                Some(end) => Self::new(&rest[..end], &rest[end + 1..]),
                None => Err(invalid(text, "unterminated namespace")),
            }
        } else {
            Self::local(text)
        }
    }

    /// The namespace part (empty when the name has none)
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local part
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Whether this name carries a namespace
    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }

    /// Length of the rendered `{namespace}local` form in bytes
    pub fn rendered_len(&self) -> usize {
        if self.has_namespace() {
            self.namespace.len() + self.local.len() + 2
        } else {
            self.local.len()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.local.is_empty() {
            return Err(invalid(&self.to_string(), "local name cannot be empty"));
        }
        if self.namespace.contains(['{', '}']) {
            return Err(invalid(&self.to_string(), "namespace cannot contain braces"));
        }
        if self.local.contains(['{', '}']) {
            return Err(invalid(&self.to_string(), "local name cannot contain braces"));
        }
        if self.rendered_len() > MAX_QUALIFIED_NAME_LENGTH {
            return Err(invalid(
                &self.to_string(),
                &format!(
                    "name too long: {} bytes (max {})",
                    self.rendered_len(),
                    MAX_QUALIFIED_NAME_LENGTH
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> Error {
    Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_namespace() {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        } else {
            f.write_str(&self.local)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for QualifiedName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
