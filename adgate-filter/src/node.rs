//! Filter node model: the AST shared by the parser, renderer and JSON writer.
//!
//! A [`FilterNode`] is a closed sum type over the eight filter kinds. Every node
//! knows the exact number of bytes it renders to ([`FilterNode::rendered_len`]),
//! so the renderer can allocate its output once.
//!
//! # Example
//!
//! ```
//! use adgate_filter::FilterNode;
//!
//! let mut filter = FilterNode::and(2);
//! filter.push(FilterNode::equal("objectClass", "user")?)?;
//! filter.push(FilterNode::band("userAccountControl", 2)?)?;
//!
//! assert_eq!(
//!     filter.render(),
//!     "(&(objectClass=user)(userAccountControl:1.2.840.113556.1.4.803:=2))"
//! );
//! assert_eq!(filter.rendered_len(), filter.render().len());
//! # Ok::<(), adgate_filter::FilterError>(())
//! ```

use crate::constants::{
    ABSENT_OVERHEAD, EQUAL_OVERHEAD, GROUP_OVERHEAD, OID_BITWISE_AND, OID_BITWISE_OR,
    OID_IN_CHAIN,
};
use crate::error::FilterError;
use std::fmt;

/// Discriminant of a [`FilterNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::exhaustive_enums)] // closed set, matched exhaustively
pub enum FilterKind {
    /// Attribute equality, or absence when no value is given.
    Equal,
    /// All children must match.
    And,
    /// At least one child must match.
    Or,
    /// Negation of a single attribute test.
    Not,
    /// None of the children may match.
    Nor,
    /// Bitwise AND extensible match.
    BitwiseAnd,
    /// Bitwise OR extensible match.
    BitwiseOr,
    /// Transitive in-chain extensible match.
    Recurse,
}

impl FilterKind {
    /// Whether this kind is a single attribute test.
    #[inline]
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::Equal | Self::BitwiseAnd | Self::BitwiseOr | Self::Recurse
        )
    }

    /// Human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::And => "And",
            Self::Or => "Or",
            Self::Not => "Not",
            Self::Nor => "Nor",
            Self::BitwiseAnd => "BitwiseAnd",
            Self::BitwiseOr => "BitwiseOr",
            Self::Recurse => "Recurse",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LEAF TESTS
// ═══════════════════════════════════════════════════════════════════════════

/// Equality test. A missing value renders as an absence test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equal {
    property: String,
    value: Option<String>,
}

impl Equal {
    /// Create an equality test. An empty value is stored as `None`.
    pub fn new(property: impl Into<String>, value: Option<String>) -> Result<Self, FilterError> {
        let property = non_empty(property.into(), FilterKind::Equal)?;
        Ok(Self {
            property,
            value: value.filter(|v| !v.is_empty()),
        })
    }

    /// Attribute name.
    #[inline]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Operand, or `None` for the absence form.
    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Rendered byte length.
    #[inline]
    pub fn rendered_len(&self) -> usize {
        match &self.value {
            Some(value) => self.property.len() + value.len() + EQUAL_OVERHEAD,
            None => self.property.len() + ABSENT_OVERHEAD,
        }
    }
}

/// Bitwise extensible match (`BitwiseAnd` / `BitwiseOr`).
///
/// The stored property already carries the matching-rule suffix
/// (`userAccountControl:1.2.840.113556.1.4.803:`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitwise {
    property: String,
    mask: i64,
}

impl Bitwise {
    fn new(attribute: String, mask: i64, kind: FilterKind, oid: &str) -> Result<Self, FilterError> {
        let attribute = non_empty(attribute, kind)?;
        Ok(Self {
            property: with_rule(&attribute, oid),
            mask,
        })
    }

    /// Property including the matching-rule suffix.
    #[inline]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Attribute name without the matching-rule suffix.
    pub fn attribute(&self) -> &str {
        strip_rule(&self.property)
    }

    /// Bit mask operand.
    #[inline]
    pub const fn mask(&self) -> i64 {
        self.mask
    }

    /// Rendered byte length.
    #[inline]
    pub fn rendered_len(&self) -> usize {
        self.property.len() + decimal_len(self.mask) + EQUAL_OVERHEAD
    }
}

/// Transitive membership test using the in-chain matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurse {
    property: String,
    distinguished_name: String,
}

impl Recurse {
    /// Create an in-chain test, e.g. `memberOf` against a group DN.
    pub fn new(
        attribute: impl Into<String>,
        distinguished_name: impl Into<String>,
    ) -> Result<Self, FilterError> {
        let attribute = non_empty(attribute.into(), FilterKind::Recurse)?;
        Ok(Self {
            property: with_rule(&attribute, OID_IN_CHAIN),
            distinguished_name: distinguished_name.into(),
        })
    }

    /// Property including the matching-rule suffix.
    #[inline]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Attribute name without the matching-rule suffix.
    pub fn attribute(&self) -> &str {
        strip_rule(&self.property)
    }

    /// Distinguished name the chain is walked towards.
    #[inline]
    pub fn distinguished_name(&self) -> &str {
        &self.distinguished_name
    }

    /// Rendered byte length.
    #[inline]
    pub fn rendered_len(&self) -> usize {
        self.property.len() + self.distinguished_name.len() + EQUAL_OVERHEAD
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COMPOSITES
// ═══════════════════════════════════════════════════════════════════════════

/// Negation of exactly one attribute test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Not {
    inner: Box<FilterNode>,
}

impl Not {
    /// Wrap a leaf test. Composites are rejected.
    pub fn new(inner: FilterNode) -> Result<Self, FilterError> {
        if !inner.kind().is_leaf() {
            return Err(FilterError::InvalidChild {
                parent: FilterKind::Not,
                child: inner.kind(),
            });
        }
        Ok(Self {
            inner: Box::new(inner),
        })
    }

    /// The negated test.
    #[inline]
    pub fn inner(&self) -> &FilterNode {
        &self.inner
    }

    /// Rendered byte length.
    #[inline]
    pub fn rendered_len(&self) -> usize {
        self.inner.rendered_len() + GROUP_OVERHEAD
    }
}

/// Ordered child list shared by `And`, `Or` and `Nor`.
///
/// The rendered length is kept in step with every insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    children: Vec<FilterNode>,
    len: usize,
}

impl Group {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            children: Vec::with_capacity(capacity),
            len: GROUP_OVERHEAD,
        }
    }

    fn push(&mut self, child: FilterNode) {
        self.len += child.rendered_len();
        self.children.push(child);
    }

    /// Children in insertion order.
    #[inline]
    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }

    /// Number of children.
    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the group has no children.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Rendered byte length.
    #[inline]
    pub const fn rendered_len(&self) -> usize {
        self.len
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FILTER NODE
// ═══════════════════════════════════════════════════════════════════════════

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::exhaustive_enums)] // closed set, matched exhaustively
pub enum FilterNode {
    /// `(property=value)` or `(!(property=*))`.
    Equal(Equal),
    /// `(property:1.2.840.113556.1.4.803:=mask)`.
    BitwiseAnd(Bitwise),
    /// `(property:1.2.840.113556.1.4.804:=mask)`.
    BitwiseOr(Bitwise),
    /// `(property:1.2.840.113556.1.4.1941:=dn)`.
    Recurse(Recurse),
    /// `(!test)`.
    Not(Not),
    /// `(&children)`.
    And(Group),
    /// `(|children)`.
    Or(Group),
    /// `(&children)` with every equality child negated.
    Nor(Group),
}

impl FilterNode {
    /// Equality test. An empty `value` produces the absence form.
    pub fn equal(property: impl Into<String>, value: impl Into<String>) -> Result<Self, FilterError> {
        Equal::new(property, Some(value.into())).map(Self::Equal)
    }

    /// Absence test: `(!(property=*))`.
    pub fn absent(property: impl Into<String>) -> Result<Self, FilterError> {
        Equal::new(property, None).map(Self::Equal)
    }

    /// Bitwise AND test: all bits of `mask` are set.
    pub fn band(attribute: impl Into<String>, mask: i64) -> Result<Self, FilterError> {
        Bitwise::new(attribute.into(), mask, FilterKind::BitwiseAnd, OID_BITWISE_AND)
            .map(Self::BitwiseAnd)
    }

    /// Bitwise OR test: any bit of `mask` is set.
    pub fn bor(attribute: impl Into<String>, mask: i64) -> Result<Self, FilterError> {
        Bitwise::new(attribute.into(), mask, FilterKind::BitwiseOr, OID_BITWISE_OR)
            .map(Self::BitwiseOr)
    }

    /// Transitive membership test against `distinguished_name`.
    pub fn recurse(
        attribute: impl Into<String>,
        distinguished_name: impl Into<String>,
    ) -> Result<Self, FilterError> {
        Recurse::new(attribute, distinguished_name).map(Self::Recurse)
    }

    /// Negate a leaf test.
    pub fn not(inner: Self) -> Result<Self, FilterError> {
        Not::new(inner).map(Self::Not)
    }

    /// Empty `And` with room for `capacity` children.
    #[must_use]
    pub fn and(capacity: usize) -> Self {
        Self::And(Group::with_capacity(capacity))
    }

    /// Empty `Or` with room for `capacity` children.
    #[must_use]
    pub fn or(capacity: usize) -> Self {
        Self::Or(Group::with_capacity(capacity))
    }

    /// Empty `Nor` with room for `capacity` children.
    #[must_use]
    pub fn nor(capacity: usize) -> Self {
        Self::Nor(Group::with_capacity(capacity))
    }

    /// `And` over the given children.
    pub fn and_of(children: impl IntoIterator<Item = Self>) -> Self {
        let mut group = Group::with_capacity(0);
        children.into_iter().for_each(|child| group.push(child));
        Self::And(group)
    }

    /// `Or` over the given children.
    pub fn or_of(children: impl IntoIterator<Item = Self>) -> Self {
        let mut group = Group::with_capacity(0);
        children.into_iter().for_each(|child| group.push(child));
        Self::Or(group)
    }

    /// `Nor` over the given children, applying the same rules as [`push`](Self::push).
    pub fn nor_of(children: impl IntoIterator<Item = Self>) -> Result<Self, FilterError> {
        let mut node = Self::nor(0);
        for child in children {
            node.push(child)?;
        }
        Ok(node)
    }

    /// Append a child to a composite.
    ///
    /// `None` is ignored, so optional fragments can be pushed unconditionally.
    /// A `Nor` takes leaf tests only: each `Equal` child is stored as
    /// `Not(Equal)`, and `Not`/`And`/`Or`/`Nor` children are rejected. Leaves and `Not` cannot take children.
    pub fn push(&mut self, child: impl Into<Option<Self>>) -> Result<(), FilterError> {
        let Some(child) = child.into() else {
            return Ok(());
        };

        match self {
            Self::And(group) | Self::Or(group) => {
                group.push(child);
                Ok(())
            },
            Self::Nor(group) => match child {
                Self::Equal(equal) => {
                    group.push(Self::Not(Not {
                        inner: Box::new(Self::Equal(equal)),
                    }));
                    Ok(())
                },
                child @ (Self::BitwiseAnd(_) | Self::BitwiseOr(_) | Self::Recurse(_)) => {
                    group.push(child);
                    Ok(())
                },
                Self::Not(_) | Self::And(_) | Self::Or(_) | Self::Nor(_) => Err(FilterError::InvalidChild {
                    parent: FilterKind::Nor,
                    child: child.kind(),
                }),
            },
            Self::Equal(_)
            | Self::BitwiseAnd(_)
            | Self::BitwiseOr(_)
            | Self::Recurse(_)
            | Self::Not(_) => Err(FilterError::NotAGroup { kind: self.kind() }),
        }
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, child: impl Into<Option<Self>>) -> Result<Self, FilterError> {
        self.push(child)?;
        Ok(self)
    }

    /// Combine with a mandatory test: `(&self other)`.
    ///
    /// ```
    /// use adgate_filter::{FilterNode, parse};
    /// use serde_json::json;
    ///
    /// let caller = parse(&json!({"or": [{"cn": "a"}, {"cn": "b"}]}))?;
    /// let scoped = caller.and_with(FilterNode::equal("objectClass", "user")?);
    /// assert_eq!(scoped.render(), "(&(|(cn=a)(cn=b))(objectClass=user))");
    /// # Ok::<(), adgate_filter::FilterError>(())
    /// ```
    #[must_use]
    pub fn and_with(self, other: Self) -> Self {
        Self::and_of([self, other])
    }

    /// Kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Equal(_) => FilterKind::Equal,
            Self::BitwiseAnd(_) => FilterKind::BitwiseAnd,
            Self::BitwiseOr(_) => FilterKind::BitwiseOr,
            Self::Recurse(_) => FilterKind::Recurse,
            Self::Not(_) => FilterKind::Not,
            Self::And(_) => FilterKind::And,
            Self::Or(_) => FilterKind::Or,
            Self::Nor(_) => FilterKind::Nor,
        }
    }

    /// Whether this node is a single attribute test.
    #[inline]
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.kind().is_leaf()
    }

    /// Direct children: the group members, the negated test, or nothing.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::And(group) | Self::Or(group) | Self::Nor(group) => group.children(),
            Self::Not(not) => std::slice::from_ref(not.inner()),
            Self::Equal(_) | Self::BitwiseAnd(_) | Self::BitwiseOr(_) | Self::Recurse(_) => &[],
        }
    }

    /// Exact byte length of [`render`](Self::render)'s output.
    #[must_use]
    pub fn rendered_len(&self) -> usize {
        match self {
            Self::Equal(equal) => equal.rendered_len(),
            Self::BitwiseAnd(bitwise) | Self::BitwiseOr(bitwise) => bitwise.rendered_len(),
            Self::Recurse(recurse) => recurse.rendered_len(),
            Self::Not(not) => not.rendered_len(),
            Self::And(group) | Self::Or(group) | Self::Nor(group) => group.rendered_len(),
        }
    }

    /// Render as an LDAP filter string.
    #[must_use]
    pub fn render(&self) -> String {
        crate::render::render(self)
    }
}

impl From<Equal> for FilterNode {
    fn from(equal: Equal) -> Self {
        Self::Equal(equal)
    }
}

impl From<Recurse> for FilterNode {
    fn from(recurse: Recurse) -> Self {
        Self::Recurse(recurse)
    }
}

impl From<Not> for FilterNode {
    fn from(not: Not) -> Self {
        Self::Not(not)
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::render::write_node(self, f)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

fn non_empty(property: String, kind: FilterKind) -> Result<String, FilterError> {
    if property.is_empty() {
        return Err(FilterError::EmptyProperty { kind });
    }
    Ok(property)
}

/// `name` → `name:OID:`.
fn with_rule(attribute: &str, oid: &str) -> String {
    let mut property = String::with_capacity(attribute.len() + oid.len() + 2);
    property.push_str(attribute);
    property.push(':');
    property.push_str(oid);
    property.push(':');
    property
}

/// `name:OID:` → `name`.
fn strip_rule(property: &str) -> &str {
    property
        .strip_suffix(':')
        .and_then(|rest| rest.rsplit_once(':'))
        .map_or(property, |(attribute, _)| attribute)
}

/// Number of bytes in the decimal form of `n`.
#[inline]
pub(crate) const fn decimal_len(n: i64) -> usize {
    let digits = match n.unsigned_abs().checked_ilog10() {
        Some(log) => log as usize + 1,
        None => 1,
    };
    if n < 0 { digits + 1 } else { digits }
}
