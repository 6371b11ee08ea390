//! # adgate-filter
//!
//! Compiles a JSON boolean-query DSL into LDAP search filters (RFC 4515) with
//! the Active Directory extensible matches for bitwise tests and transitive
//! membership, and writes filter trees back to JSON.
//!
//! ```
//! use adgate_filter::{FilterNode, parse};
//! use serde_json::json;
//!
//! let filter = parse(&json!({
//!     "and": {
//!         "objectClass": "user",
//!         "recurse": {"memberOf": "CN=Admins,OU=Groups,DC=corp,DC=local"},
//!         "not": {"band": {"userAccountControl": 2}}
//!     }
//! }))?;
//!
//! assert_eq!(
//!     filter.render(),
//!     "(&(objectClass=user)\
//!        (memberOf:1.2.840.113556.1.4.1941:=CN=Admins,OU=Groups,DC=corp,DC=local)\
//!        (!(userAccountControl:1.2.840.113556.1.4.803:=2)))"
//! );
//!
//! // Collaborators can scope a caller's filter programmatically
//! let scoped = filter.and_with(FilterNode::equal("objectCategory", "person")?);
//! assert_eq!(scoped.rendered_len(), scoped.render().len());
//! # Ok::<(), adgate_filter::FilterError>(())
//! ```
//!
//! ## Keywords
//!
//! | Key | Payload | Renders |
//! |-----|---------|---------|
//! | `and` | object | `(&…)` |
//! | `or` | array of objects | `(\|…)` |
//! | `not` | object, one pair | `(!…)` |
//! | `not` | object, several pairs | as `nor` |
//! | `nor` | array of objects | `(&(!…)(!…))` |
//! | `band` | `{attr: int}` | `(attr:1.2.840.113556.1.4.803:=int)` |
//! | `bor` | `{attr: int}` | `(attr:1.2.840.113556.1.4.804:=int)` |
//! | `recurse` | `{attr: dn}` | `(attr:1.2.840.113556.1.4.1941:=dn)` |
//! | anything else | scalar | `(attr=value)`, `null` → `(!(attr=*))` |
//!
//! Untrusted documents should be parsed with [`parse_with`] and
//! [`FilterOptions::strict`].

pub mod constants;
mod error;
mod json;
mod node;
mod parse;
mod render;
mod validate;

pub use error::FilterError;
pub use node::{Bitwise, Equal, FilterKind, FilterNode, Group, Not, Recurse};
pub use parse::{parse, parse_str, parse_str_with, parse_with};
pub use render::render;
pub use validate::{FilterOptions, escape_value, is_valid_attribute};

// ═══════════════════════════════════════════════════════════════════════════
// BUILDER HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Equality test, `(property=value)`.
pub fn equal(property: impl Into<String>, value: impl Into<String>) -> Result<FilterNode, FilterError> {
    FilterNode::equal(property, value)
}

/// Absence test, `(!(property=*))`.
pub fn absent(property: impl Into<String>) -> Result<FilterNode, FilterError> {
    FilterNode::absent(property)
}

/// Bitwise AND test.
pub fn band(attribute: impl Into<String>, mask: i64) -> Result<FilterNode, FilterError> {
    FilterNode::band(attribute, mask)
}

/// Bitwise OR test.
pub fn bor(attribute: impl Into<String>, mask: i64) -> Result<FilterNode, FilterError> {
    FilterNode::bor(attribute, mask)
}

/// Transitive membership test.
pub fn recurse(
    attribute: impl Into<String>,
    distinguished_name: impl Into<String>,
) -> Result<FilterNode, FilterError> {
    FilterNode::recurse(attribute, distinguished_name)
}

/// Negate a leaf test.
pub fn not(inner: FilterNode) -> Result<FilterNode, FilterError> {
    FilterNode::not(inner)
}

/// `And` over `children`: all must match.
#[must_use]
pub fn all_of(children: impl IntoIterator<Item = FilterNode>) -> FilterNode {
    FilterNode::and_of(children)
}

/// `Or` over `children`: at least one must match.
#[must_use]
pub fn any_of(children: impl IntoIterator<Item = FilterNode>) -> FilterNode {
    FilterNode::or_of(children)
}

/// `Nor` over `children`: none may match. Equality children are negated.
pub fn none_of(children: impl IntoIterator<Item = FilterNode>) -> Result<FilterNode, FilterError> {
    FilterNode::nor_of(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_compose() {
        let filter = all_of([
            equal("objectClass", "user").unwrap(),
            any_of([
                recurse("memberOf", "CN=Admins,DC=corp").unwrap(),
                absent("manager").unwrap(),
            ]),
            none_of([equal("title", "Contractor").unwrap(), band("userAccountControl", 2).unwrap()])
                .unwrap(),
            not(bor("groupType", 8).unwrap()).unwrap(),
        ]);
        assert_eq!(
            filter.render(),
            "(&(objectClass=user)\
             (|(memberOf:1.2.840.113556.1.4.1941:=CN=Admins,DC=corp)(!(manager=*)))\
             (&(!(title=Contractor))(userAccountControl:1.2.840.113556.1.4.803:=2))\
             (!(groupType:1.2.840.113556.1.4.804:=8)))"
        );
        assert_eq!(filter.rendered_len(), filter.render().len());
    }

    #[test]
    fn test_none_of_rejects_negated_child() {
        let err = none_of([not(equal("cn", "a").unwrap()).unwrap()]).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidChild {
                parent: FilterKind::Nor,
                child: FilterKind::Not
            }
        );
    }
}
