//! Error taxonomy for building, parsing and serializing filters.
//!
//! Every variant aborts the whole operation. A filter decides which directory
//! entries a search returns, so a fragment is never dropped or repaired.

use crate::node::FilterKind;
use thiserror::Error;

/// Errors raised by the filter model, parser and JSON write-back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FilterError {
    /// A keyword payload has the wrong JSON kind or property count.
    #[error("Invalid '{keyword}' filter: expected {expected}")]
    Structural {
        /// Keyword (or `"filter"` for the document root) being parsed.
        keyword: &'static str,
        /// Shape the payload should have had.
        expected: &'static str,
    },
    /// A value cannot be converted to what its test requires.
    #[error("Invalid value for '{property}' in '{keyword}' filter: expected {expected}")]
    MalformedLeafValue {
        /// Keyword (or `"equal"` for literal attributes).
        keyword: &'static str,
        /// Attribute whose value was rejected.
        property: String,
        /// Type the value should have had.
        expected: &'static str,
    },
    /// A leaf test was built without an attribute name.
    #[error("{kind} filter requires a non-empty property name")]
    EmptyProperty {
        /// Kind of leaf being constructed.
        kind: FilterKind,
    },
    /// A child was pushed onto a node that does not hold a child list.
    #[error("Cannot add children to a {kind} filter")]
    NotAGroup {
        /// Kind of the receiving node.
        kind: FilterKind,
    },
    /// A composite rejected a child of the given kind.
    #[error("{child} filter is not allowed inside a {parent} filter")]
    InvalidChild {
        /// Kind of the receiving node.
        parent: FilterKind,
        /// Kind of the rejected child.
        child: FilterKind,
    },
    /// Keyword payloads nest deeper than the configured limit.
    #[error("Filter nesting depth {actual} exceeds maximum {max}")]
    NestingTooDeep {
        /// Configured limit.
        max: usize,
        /// Depth reached.
        actual: usize,
    },
    /// The document produces more nodes than the configured limit.
    #[error("Filter contains too many nodes (max {max})")]
    TooManyNodes {
        /// Configured limit.
        max: usize,
    },
    /// Attribute is not on the configured whitelist.
    #[error("Attribute '{attribute}' is not allowed in filters")]
    AttributeNotAllowed {
        /// Rejected attribute name.
        attribute: String,
    },
    /// Attribute is not a valid LDAP attribute description.
    #[error("Invalid attribute description '{attribute}'")]
    InvalidAttribute {
        /// Rejected attribute name.
        attribute: String,
    },
    /// The tree has no JSON representation.
    #[error("Filter cannot be written as JSON: {reason}")]
    Unrepresentable {
        /// What collided.
        reason: String,
    },
    /// The filter document is not valid JSON text.
    #[error("Invalid JSON filter document: {0}")]
    Json(String),
}

impl FilterError {
    /// Shorthand for a structural error.
    #[inline]
    pub(crate) const fn structural(keyword: &'static str, expected: &'static str) -> Self {
        Self::Structural { keyword, expected }
    }

    /// Shorthand for a leaf value conversion error.
    #[inline]
    pub(crate) fn malformed(
        keyword: &'static str,
        property: &str,
        expected: &'static str,
    ) -> Self {
        Self::MalformedLeafValue {
            keyword,
            property: property.to_string(),
            expected,
        }
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
