//! LDAP filter rendering.
//!
//! The tree is walked depth-first exactly once. [`render`] sizes its buffer
//! from [`FilterNode::rendered_len`], so the output never reallocates.

use crate::node::FilterNode;
use std::fmt::{self, Write};

/// Render a filter tree as an RFC 4515 filter string.
///
/// # Examples
///
/// ```
/// use adgate_filter::{FilterNode, render};
///
/// let filter = FilterNode::or_of([
///     FilterNode::equal("cn", "a")?,
///     FilterNode::absent("mail")?,
/// ]);
/// assert_eq!(render(&filter), "(|(cn=a)(!(mail=*)))");
/// # Ok::<(), adgate_filter::FilterError>(())
/// ```
#[must_use]
pub fn render(node: &FilterNode) -> String {
    let capacity = node.rendered_len();
    let mut out = String::with_capacity(capacity);
    // fmt::Write for String is infallible
    let _ = write_node(node, &mut out);
    debug_assert_eq!(
        out.len(),
        capacity,
        "rendered length of {:?} filter out of step with its output",
        node.kind()
    );
    out
}

/// Write `node` into any formatter sink.
pub(crate) fn write_node<W: Write + ?Sized>(node: &FilterNode, out: &mut W) -> fmt::Result {
    match node {
        FilterNode::Equal(equal) => match equal.value() {
            Some(value) => {
                out.write_char('(')?;
                out.write_str(equal.property())?;
                out.write_char('=')?;
                out.write_str(value)?;
                out.write_char(')')
            },
            None => {
                out.write_str("(!(")?;
                out.write_str(equal.property())?;
                out.write_str("=*))")
            },
        },
        FilterNode::BitwiseAnd(bitwise) | FilterNode::BitwiseOr(bitwise) => {
            out.write_char('(')?;
            out.write_str(bitwise.property())?;
            write!(out, "={})", bitwise.mask())
        },
        FilterNode::Recurse(recurse) => {
            out.write_char('(')?;
            out.write_str(recurse.property())?;
            out.write_char('=')?;
            out.write_str(recurse.distinguished_name())?;
            out.write_char(')')
        },
        FilterNode::Not(not) => {
            out.write_str("(!")?;
            write_node(not.inner(), out)?;
            out.write_char(')')
        },
        FilterNode::And(group) | FilterNode::Nor(group) => write_group(out, '&', group.children()),
        FilterNode::Or(group) => write_group(out, '|', group.children()),
    }
}

fn write_group<W: Write + ?Sized>(out: &mut W, op: char, children: &[FilterNode]) -> fmt::Result {
    out.write_char('(')?;
    out.write_char(op)?;
    for child in children {
        write_node(child, out)?;
    }
    out.write_char(')')
}
