//! Centralized constants for the filter compiler.
//!
//! Matching-rule OIDs, the reserved keyword table and parser limits live here
//! so that nothing is looked up at runtime.

// ============================================================================
// ACTIVE DIRECTORY MATCHING RULES
// ============================================================================

/// `LDAP_MATCHING_RULE_BIT_AND`: every bit of the mask is set on the attribute.
pub const OID_BITWISE_AND: &str = "1.2.840.113556.1.4.803";

/// `LDAP_MATCHING_RULE_BIT_OR`: at least one bit of the mask is set.
pub const OID_BITWISE_OR: &str = "1.2.840.113556.1.4.804";

/// `LDAP_MATCHING_RULE_IN_CHAIN`: transitive membership through the DN chain.
pub const OID_IN_CHAIN: &str = "1.2.840.113556.1.4.1941";

// ============================================================================
// KEYWORDS
// ============================================================================

/// Reserved keywords of the JSON filter DSL.
///
/// Matched case-insensitively. Any other key is a literal attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::exhaustive_enums)] // the DSL's reserved words are fixed
pub enum Keyword {
    /// `and`: object payload, every pair is a child.
    And,
    /// `or`: array of objects.
    Or,
    /// `not`: object payload with one or more pairs.
    Not,
    /// `nor`: array of objects, each equality negated.
    Nor,
    /// `band`: single-pair object, bitwise AND match.
    Band,
    /// `bor`: single-pair object, bitwise OR match.
    Bor,
    /// `recurse`: single-pair object, in-chain match.
    Recurse,
}

/// Keyword lookup table, in the order keywords are documented.
pub const KEYWORDS: &[(&str, Keyword)] = &[
    ("and", Keyword::And),
    ("or", Keyword::Or),
    ("not", Keyword::Not),
    ("nor", Keyword::Nor),
    ("band", Keyword::Band),
    ("bor", Keyword::Bor),
    ("recurse", Keyword::Recurse),
];

impl Keyword {
    /// Resolve a JSON key to a keyword, ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// use adgate_filter::constants::Keyword;
    ///
    /// assert_eq!(Keyword::from_key("AND"), Some(Keyword::And));
    /// assert_eq!(Keyword::from_key("Recurse"), Some(Keyword::Recurse));
    /// assert_eq!(Keyword::from_key("cn"), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, keyword)| *keyword)
    }

    /// Canonical lowercase spelling, used in error messages and JSON output.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Nor => "nor",
            Self::Band => "band",
            Self::Bor => "bor",
            Self::Recurse => "recurse",
        }
    }
}

// ============================================================================
// PARSER LIMITS
// ============================================================================

/// Default maximum nesting depth of keyword payloads.
///
/// Real filters rarely nest beyond a handful of levels; the limit bounds
/// recursion against adversarial request bodies.
pub const MAX_FILTER_DEPTH: usize = 20;

/// Default maximum number of nodes a single document may produce.
pub const MAX_FILTER_NODES: usize = 10_000;

// ============================================================================
// RENDERING
// ============================================================================

/// Bytes a composite adds around its children: `(`, the operator and `)`.
pub(crate) const GROUP_OVERHEAD: usize = 3;

/// Bytes an equality adds around property and value: `(`, `=` and `)`.
pub(crate) const EQUAL_OVERHEAD: usize = 3;

/// Bytes of the absent-value form `(!(` + `=*))` around the property.
pub(crate) const ABSENT_OVERHEAD: usize = 7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_is_case_insensitive() {
        for (name, keyword) in KEYWORDS {
            assert_eq!(Keyword::from_key(name), Some(*keyword));
            assert_eq!(Keyword::from_key(&name.to_uppercase()), Some(*keyword));
            assert_eq!(keyword.as_str(), *name);
        }
        assert_eq!(Keyword::from_key("bAnD"), Some(Keyword::Band));
    }

    #[test]
    fn test_non_keywords() {
        assert_eq!(Keyword::from_key(""), None);
        assert_eq!(Keyword::from_key("andx"), None);
        assert_eq!(Keyword::from_key("memberOf"), None);
        assert_eq!(Keyword::from_key("$and"), None);
    }

    #[test]
    fn test_oids_share_ad_arc() {
        for oid in [OID_BITWISE_AND, OID_BITWISE_OR, OID_IN_CHAIN] {
            assert!(oid.starts_with("1.2.840.113556.1.4."));
        }
    }
}
