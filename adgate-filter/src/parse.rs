//! JSON filter document parsing.
//!
//! A document is a JSON object whose first property is the filter. Keys that
//! match a [`Keyword`] (ignoring case) select a composite or extensible test;
//! any other key is an attribute name tested for equality.
//!
//! ```text
//! {"cn": "bob"}                                  (&(cn=bob))
//! {"and": {"cn": "bob", "sn": "smith"}}          (&(cn=bob)(sn=smith))
//! {"or": [{"cn": "a"}, {"cn": "b"}]}             (|(cn=a)(cn=b))
//! {"not": {"cn": "a"}}                           (!(cn=a))
//! {"nor": [{"cn": "a"}, {"sn": "b"}]}            (&(!(cn=a))(!(sn=b)))
//! {"band": {"userAccountControl": 2}}            (userAccountControl:1.2.840.113556.1.4.803:=2)
//! {"bor": {"groupType": 8}}                      (groupType:1.2.840.113556.1.4.804:=8)
//! {"recurse": {"memberOf": "CN=G,DC=corp"}}      (memberOf:1.2.840.113556.1.4.1941:=CN=G,DC=corp)
//! {"cn": null}                                   (&(!(cn=*)))
//! ```
//!
//! Parsing is fail-fast: the first structural problem aborts the document.

use crate::constants::Keyword;
use crate::error::FilterError;
use crate::node::FilterNode;
use crate::validate::FilterOptions;
use serde_json::{Map, Number, Value};
use tracing::{debug, trace};

/// Parse a filter document with default [`FilterOptions`].
///
/// # Examples
///
/// ```
/// use adgate_filter::parse;
/// use serde_json::json;
///
/// let filter = parse(&json!({"and": {"objectClass": "user", "cn": "bob"}}))?;
/// assert_eq!(filter.render(), "(&(objectClass=user)(cn=bob))");
///
/// let err = parse(&json!({"and": "not-an-object"})).unwrap_err();
/// assert!(err.to_string().contains("'and'"));
/// # Ok::<(), adgate_filter::FilterError>(())
/// ```
pub fn parse(document: &Value) -> Result<FilterNode, FilterError> {
    parse_with(document, &FilterOptions::default())
}

/// Parse a filter document with explicit options.
pub fn parse_with(document: &Value, options: &FilterOptions) -> Result<FilterNode, FilterError> {
    let result = Parser::new(options).document(document);
    match &result {
        Ok(node) => trace!(
            kind = %node.kind(),
            rendered_len = node.rendered_len(),
            "parsed filter document"
        ),
        Err(err) => debug!(error = %err, "rejected filter document"),
    }
    result
}

/// Decode JSON text and parse it with default options.
pub fn parse_str(text: &str) -> Result<FilterNode, FilterError> {
    parse_str_with(text, &FilterOptions::default())
}

/// Decode JSON text and parse it with explicit options.
pub fn parse_str_with(text: &str, options: &FilterOptions) -> Result<FilterNode, FilterError> {
    let document: Value = serde_json::from_str(text)?;
    parse_with(&document, options)
}

impl TryFrom<&Value> for FilterNode {
    type Error = FilterError;

    fn try_from(document: &Value) -> Result<Self, Self::Error> {
        parse(document)
    }
}

const EXPECT_OBJECT: &str = "an object of attribute tests";
const EXPECT_ARRAY: &str = "an array of objects";
const EXPECT_SINGLE: &str = "an object with exactly one property";
const EXPECT_SCALAR: &str = "a string, integer, boolean or null";
const EXPECT_INTEGER: &str = "a 64-bit integer";
const EXPECT_DN: &str = "a distinguished name string";

/// Recursive-descent state for one document.
struct Parser<'o> {
    options: &'o FilterOptions,
    nodes: usize,
}

impl<'o> Parser<'o> {
    const fn new(options: &'o FilterOptions) -> Self {
        Self { options, nodes: 0 }
    }

    /// Root rule: first property only, bare equality wrapped in `And`.
    fn document(&mut self, document: &Value) -> Result<FilterNode, FilterError> {
        let Value::Object(map) = document else {
            return Err(FilterError::structural("filter", "a JSON object"));
        };
        let Some((key, value)) = map.iter().next() else {
            return Err(FilterError::structural("filter", "at least one property"));
        };

        let node = self.pair(key, value, 0)?;
        Ok(match node {
            FilterNode::Equal(_) => FilterNode::and_of([node]),
            other => other,
        })
    }

    /// One key/value pair: keyword dispatch or literal attribute.
    fn pair(&mut self, key: &str, value: &Value, depth: usize) -> Result<FilterNode, FilterError> {
        self.nodes += 1;
        if self.nodes > self.options.max_nodes {
            return Err(FilterError::TooManyNodes {
                max: self.options.max_nodes,
            });
        }

        match Keyword::from_key(key) {
            Some(Keyword::And) => self.and(value, depth + 1),
            Some(keyword @ (Keyword::Or | Keyword::Nor)) => self.list(keyword, value, depth + 1),
            Some(Keyword::Not) => self.not(value, depth + 1),
            Some(keyword @ (Keyword::Band | Keyword::Bor)) => self.bitwise(keyword, value),
            Some(Keyword::Recurse) => self.recurse(value),
            None => self.equal(key, value),
        }
    }

    fn enter(&self, depth: usize) -> Result<(), FilterError> {
        if depth > self.options.max_depth {
            return Err(FilterError::NestingTooDeep {
                max: self.options.max_depth,
                actual: depth,
            });
        }
        Ok(())
    }

    fn push_pairs(
        &mut self,
        group: &mut FilterNode,
        map: &Map<String, Value>,
        depth: usize,
    ) -> Result<(), FilterError> {
        for (key, value) in map {
            let child = self.pair(key, value, depth)?;
            group.push(child)?;
        }
        Ok(())
    }

    fn and(&mut self, value: &Value, depth: usize) -> Result<FilterNode, FilterError> {
        self.enter(depth)?;
        let Value::Object(map) = value else {
            return Err(FilterError::structural("and", EXPECT_OBJECT));
        };

        let mut group = FilterNode::and(map.len());
        self.push_pairs(&mut group, map, depth)?;
        Ok(group)
    }

    /// `or` / `nor`: every pair of every object becomes a child.
    fn list(&mut self, keyword: Keyword, value: &Value, depth: usize) -> Result<FilterNode, FilterError> {
        self.enter(depth)?;
        let Value::Array(items) = value else {
            return Err(FilterError::structural(keyword.as_str(), EXPECT_ARRAY));
        };

        let mut group = match keyword {
            Keyword::Nor => FilterNode::nor(items.len()),
            _ => FilterNode::or(items.len()),
        };
        for item in items {
            let Value::Object(map) = item else {
                return Err(FilterError::structural(keyword.as_str(), EXPECT_ARRAY));
            };
            self.push_pairs(&mut group, map, depth)?;
        }
        Ok(group)
    }

    /// Several properties degrade to `nor`; a single one is negated directly.
    fn not(&mut self, value: &Value, depth: usize) -> Result<FilterNode, FilterError> {
        self.enter(depth)?;
        let Value::Object(map) = value else {
            return Err(FilterError::structural("not", "an object"));
        };

        match map.len() {
            0 => Err(FilterError::structural("not", "at least one property")),
            1 => {
                let Some((key, value)) = map.iter().next() else {
                    return Err(FilterError::structural("not", "at least one property"));
                };
                let inner = self.pair(key, value, depth)?;
                if !inner.is_leaf() {
                    return Err(FilterError::structural("not", "a single attribute test"));
                }
                FilterNode::not(inner)
            },
            len => {
                let mut group = FilterNode::nor(len);
                self.push_pairs(&mut group, map, depth)?;
                Ok(group)
            },
        }
    }

    fn bitwise(&self, keyword: Keyword, value: &Value) -> Result<FilterNode, FilterError> {
        let (attribute, operand) = single_pair(keyword, value)?;
        self.options.check_attribute(attribute)?;

        let mask = match operand {
            Value::Number(n) => number_to_i64(n),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| FilterError::malformed(keyword.as_str(), attribute, EXPECT_INTEGER))?;

        match keyword {
            Keyword::Bor => FilterNode::bor(attribute, mask),
            _ => FilterNode::band(attribute, mask),
        }
    }

    fn recurse(&self, value: &Value) -> Result<FilterNode, FilterError> {
        let (attribute, operand) = single_pair(Keyword::Recurse, value)?;
        self.options.check_attribute(attribute)?;

        let Value::String(dn) = operand else {
            return Err(FilterError::malformed("recurse", attribute, EXPECT_DN));
        };
        FilterNode::recurse(attribute, self.options.value(dn.clone()))
    }

    /// Literal attribute: the JSON kind of the value selects its text form.
    fn equal(&self, attribute: &str, value: &Value) -> Result<FilterNode, FilterError> {
        self.options.check_attribute(attribute)?;

        let text = match value {
            Value::Null => None,
            Value::String(s) => Some(self.options.value(s.clone())),
            Value::Bool(true) => Some("True".to_string()),
            Value::Bool(false) => Some("False".to_string()),
            Value::Number(n) => Some(
                number_to_i64(n)
                    .ok_or_else(|| FilterError::malformed("equal", attribute, EXPECT_SCALAR))?
                    .to_string(),
            ),
            Value::Array(_) | Value::Object(_) => {
                return Err(FilterError::malformed("equal", attribute, EXPECT_SCALAR));
            },
        };

        match text {
            Some(text) => FilterNode::equal(attribute, text),
            None => FilterNode::absent(attribute),
        }
    }
}

/// Payload of `band` / `bor` / `recurse`: exactly one property.
fn single_pair(keyword: Keyword, value: &Value) -> Result<(&str, &Value), FilterError> {
    match value {
        Value::Object(map) if map.len() == 1 => map
            .iter()
            .next()
            .map(|(key, value)| (key.as_str(), value))
            .ok_or_else(|| FilterError::structural(keyword.as_str(), EXPECT_SINGLE)),
        _ => Err(FilterError::structural(keyword.as_str(), EXPECT_SINGLE)),
    }
}

/// Integral JSON number as `i64`; floats only when exact.
fn number_to_i64(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64().and_then(|f| {
        const MAX_SAFE_INT: f64 = 9_007_199_254_740_992.0; // 2^53
        #[allow(clippy::cast_possible_truncation)]
        (f.is_finite() && f.abs() <= MAX_SAFE_INT && f.fract() == 0.0).then_some(f as i64)
    })
}
