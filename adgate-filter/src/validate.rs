//! Security controls for user-supplied filter documents.
//!
//! This module provides:
//! - Attribute description syntax checks (RFC 4512)
//! - Assertion value escaping (RFC 4515)
//! - [`FilterOptions`]: depth and node limits, attribute whitelisting
//!
//! # Example
//!
//! ```
//! use adgate_filter::{FilterOptions, parse_with};
//! use serde_json::json;
//!
//! let options = FilterOptions::new()
//!     .allow_attributes(&["cn", "sn", "mail"])
//!     .escape_values(true)
//!     .max_depth(4);
//!
//! let filter = parse_with(&json!({"cn": "a*"}), &options)?;
//! assert_eq!(filter.render(), r"(&(cn=a\2a))");
//!
//! assert!(parse_with(&json!({"userPassword": "x"}), &options).is_err());
//! # Ok::<(), adgate_filter::FilterError>(())
//! ```

use crate::constants::{MAX_FILTER_DEPTH, MAX_FILTER_NODES};
use crate::error::FilterError;
use serde::Deserialize;
use std::borrow::Cow;

// ═══════════════════════════════════════════════════════════════════════════
// ATTRIBUTE DESCRIPTIONS
// ═══════════════════════════════════════════════════════════════════════════

/// Check that `s` is an LDAP attribute description.
///
/// Accepts a descriptor (`cn`, `msDS-UserPasswordExpiryTimeComputed`) or a
/// numeric OID (`2.5.4.3`), optionally followed by `;option` suffixes
/// (`userCertificate;binary`).
///
/// # Examples
///
/// ```
/// use adgate_filter::is_valid_attribute;
///
/// assert!(is_valid_attribute("cn"));
/// assert!(is_valid_attribute("sAMAccountName"));
/// assert!(is_valid_attribute("2.5.4.3"));
/// assert!(is_valid_attribute("userCertificate;binary"));
///
/// assert!(!is_valid_attribute(""));
/// assert!(!is_valid_attribute("cn)(uid=*"));
/// assert!(!is_valid_attribute("1cn"));
/// ```
#[must_use]
pub fn is_valid_attribute(s: &str) -> bool {
    let mut parts = s.split(';');
    let Some(base) = parts.next() else {
        return false;
    };
    (is_descriptor(base) || is_numeric_oid(base)) && parts.all(is_option)
}

/// `ALPHA *( ALPHA / DIGIT / HYPHEN )`
fn is_descriptor(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// `number 1*( DOT number )`, no leading zeros.
fn is_numeric_oid(s: &str) -> bool {
    let mut count = 0;
    for arc in s.split('.') {
        let valid = match arc.as_bytes() {
            [] => false,
            [b'0'] => true,
            [b'0', ..] => false,
            bytes => bytes.iter().all(u8::is_ascii_digit),
        };
        if !valid {
            return false;
        }
        count += 1;
    }
    count >= 2
}

/// `1*( ALPHA / DIGIT / HYPHEN )`
fn is_option(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// ═══════════════════════════════════════════════════════════════════════════
// VALUE ESCAPING
// ═══════════════════════════════════════════════════════════════════════════

/// Escape an assertion value for use inside a filter (RFC 4515 §3).
///
/// `*`, `(`, `)`, `\` and NUL become `\2a`, `\28`, `\29`, `\5c` and `\00`.
/// Values without special characters are returned borrowed.
///
/// # Examples
///
/// ```
/// use adgate_filter::escape_value;
///
/// assert_eq!(escape_value("bob"), "bob");
/// assert_eq!(escape_value("a*(b)"), r"a\2a\28b\29");
/// assert_eq!(escape_value(r"C:\temp"), r"C:\5ctemp");
/// ```
#[must_use]
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['*', '(', ')', '\\', '\0']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

// ═══════════════════════════════════════════════════════════════════════════
// PARSER OPTIONS
// ═══════════════════════════════════════════════════════════════════════════

/// Parser configuration for user-supplied filter documents.
///
/// Provides four layers of control:
/// 1. Nesting depth limit - bounds recursion on hostile input
/// 2. Node count limit - bounds work per document
/// 3. Attribute whitelist - only listed attributes can be tested
/// 4. Value escaping - neutralizes wildcard and grouping characters
///
/// The defaults reproduce the plain gateway behavior: every attribute is
/// accepted and values are embedded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct FilterOptions {
    /// Maximum nesting depth of keyword payloads.
    pub max_depth: usize,
    /// Maximum number of nodes per document.
    pub max_nodes: usize,
    /// Allowed attribute names, compared ignoring ASCII case. Empty = allow all.
    pub allowed_attributes: Vec<String>,
    /// Reject attribute names that are not valid attribute descriptions.
    pub validate_attributes: bool,
    /// Escape string operands with [`escape_value`].
    pub escape_values: bool,
}

impl FilterOptions {
    /// Options with default limits and no attribute restrictions.
    ///
    /// Defaults:
    /// - Max nesting depth: 20
    /// - Max nodes: 10 000
    /// - All attributes allowed, syntax unchecked
    /// - Values embedded verbatim
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: MAX_FILTER_DEPTH,
            max_nodes: MAX_FILTER_NODES,
            allowed_attributes: Vec::new(),
            validate_attributes: false,
            escape_values: false,
        }
    }

    /// Options suited to untrusted request bodies: attribute syntax checked and
    /// values escaped.
    #[must_use]
    pub fn strict() -> Self {
        Self::new().validate_attributes(true).escape_values(true)
    }

    /// Set maximum nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set maximum node count.
    #[must_use]
    pub const fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set allowed attributes (whitelist). Empty allows all.
    #[must_use]
    pub fn allow_attributes(mut self, attributes: &[&str]) -> Self {
        self.allowed_attributes = attributes.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Enable or disable attribute syntax validation.
    #[must_use]
    pub const fn validate_attributes(mut self, enabled: bool) -> Self {
        self.validate_attributes = enabled;
        self
    }

    /// Enable or disable value escaping.
    #[must_use]
    pub const fn escape_values(mut self, enabled: bool) -> Self {
        self.escape_values = enabled;
        self
    }

    /// Check an attribute name against the syntax rule and the whitelist.
    pub fn check_attribute(&self, attribute: &str) -> Result<(), FilterError> {
        if self.validate_attributes && !is_valid_attribute(attribute) {
            return Err(FilterError::InvalidAttribute {
                attribute: attribute.to_string(),
            });
        }

        if !self.allowed_attributes.is_empty()
            && !self
                .allowed_attributes
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(attribute))
        {
            return Err(FilterError::AttributeNotAllowed {
                attribute: attribute.to_string(),
            });
        }

        Ok(())
    }

    /// Apply value escaping if enabled.
    pub(crate) fn value(&self, value: String) -> String {
        if !self.escape_values {
            return value;
        }
        match escape_value(&value) {
            Cow::Borrowed(_) => value,
            Cow::Owned(escaped) => escaped,
        }
    }
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::new()
    }
}
