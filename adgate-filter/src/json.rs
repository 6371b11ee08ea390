//! JSON write-back: the inverse of the parser.
//!
//! Trees produced by [`parse`](crate::parse) serialize to a document that
//! parses back to an equal tree. Keywords are matched ignoring case, so an
//! `and` holding the same keyword twice writes the repeats with other letter
//! cases (`band`, `Band`, `bAnd`, ...). A `Nor` that runs out of spellings is
//! written as a multi-property `not`, which parses to the same node.
//!
//! Programmatically built trees can contain shapes a JSON object cannot
//! express (two equality tests on one attribute inside an `And`, an attribute
//! named like a keyword); those are reported as
//! [`FilterError::Unrepresentable`] instead of being written lossily.
//!
//! `FilterNode` also implements `Serialize` and `Deserialize` through this
//! module, so it can sit directly in request and response types.

use crate::constants::Keyword;
use crate::error::FilterError;
use crate::node::{FilterNode, Group};
use crate::parse::parse;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;

impl FilterNode {
    /// Convert to the JSON filter DSL.
    ///
    /// # Examples
    ///
    /// ```
    /// use adgate_filter::parse;
    /// use serde_json::json;
    ///
    /// let document = json!({"or": [{"cn": "a"}, {"band": {"userAccountControl": 2}}]});
    /// let filter = parse(&document)?;
    /// assert_eq!(filter.to_json()?, document);
    /// # Ok::<(), adgate_filter::FilterError>(())
    /// ```
    pub fn to_json(&self) -> Result<Value, FilterError> {
        let (key, value) = entry(self)?;
        Ok(single(key, value))
    }
}

/// The single key/value pair a node is written as.
fn entry(node: &FilterNode) -> Result<(String, Value), FilterError> {
    match node {
        FilterNode::Equal(equal) => {
            if Keyword::from_key(equal.property()).is_some() {
                return Err(FilterError::Unrepresentable {
                    reason: format!("attribute '{}' collides with a keyword", equal.property()),
                });
            }
            let value = equal
                .value()
                .map_or(Value::Null, |value| Value::String(value.to_string()));
            Ok((equal.property().to_string(), value))
        },
        FilterNode::BitwiseAnd(bitwise) => Ok(keyword(
            Keyword::Band,
            single(bitwise.attribute().to_string(), Value::from(bitwise.mask())),
        )),
        FilterNode::BitwiseOr(bitwise) => Ok(keyword(
            Keyword::Bor,
            single(bitwise.attribute().to_string(), Value::from(bitwise.mask())),
        )),
        FilterNode::Recurse(recurse) => Ok(keyword(
            Keyword::Recurse,
            single(
                recurse.attribute().to_string(),
                Value::String(recurse.distinguished_name().to_string()),
            ),
        )),
        FilterNode::Not(not) => {
            let (key, value) = entry(not.inner())?;
            Ok(keyword(Keyword::Not, single(key, value)))
        },
        FilterNode::And(group) => {
            let children: Vec<&FilterNode> = group.children().iter().collect();
            Ok(keyword(Keyword::And, Value::Object(merge(&children)?)))
        },
        FilterNode::Or(group) => {
            let items = group
                .children()
                .iter()
                .map(|child| entry(child).map(|(key, value)| single(key, value)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keyword(Keyword::Or, Value::Array(items)))
        },
        FilterNode::Nor(group) => {
            let items = group
                .children()
                .iter()
                .map(|child| entry(written(child)).map(|(key, value)| single(key, value)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keyword(Keyword::Nor, Value::Array(items)))
        },
    }
}

/// A `Nor` member as it appears in a document. Parsing re-negates bare
/// equalities.
fn written(child: &FilterNode) -> &FilterNode {
    match child {
        FilterNode::Not(not) if matches!(not.inner(), FilterNode::Equal(_)) => not.inner(),
        other => other,
    }
}

/// One child of a merged object, before its key is spelled.
struct Member {
    /// Literal attribute, or the keyword to spell.
    name: Result<Keyword, String>,
    value: Value,
    /// Payload of the multi-property `not` form, for a `Nor` that has one.
    negation: Option<Value>,
}

impl Member {
    fn new(node: &FilterNode) -> Result<Self, FilterError> {
        let (key, value) = entry(node)?;
        let negation = match node {
            FilterNode::Nor(group) => not_form(group),
            _ => None,
        };
        Ok(Self {
            name: Keyword::from_key(&key).ok_or(key),
            value,
            negation,
        })
    }

    /// Reserve a key in `taken`. Returns the key and whether the `not` form
    /// was chosen.
    fn claim(&self, taken: &mut HashSet<String>) -> Result<(String, bool), FilterError> {
        let keyword = match &self.name {
            Ok(keyword) => *keyword,
            Err(attribute) if taken.insert(attribute.clone()) => return Ok((attribute.clone(), false)),
            Err(attribute) => {
                return Err(FilterError::Unrepresentable {
                    reason: format!("more than one '{attribute}' test in one object"),
                });
            },
        };

        if let Some(key) = spellings(keyword).find(|key| taken.insert(key.clone())) {
            return Ok((key, false));
        }
        if self.negation.is_some()
            && let Some(key) = spellings(Keyword::Not).find(|key| taken.insert(key.clone()))
        {
            return Ok((key, true));
        }
        Err(FilterError::Unrepresentable {
            reason: format!("too many '{}' tests in one object", keyword.as_str()),
        })
    }
}

/// Merge children into one object, as an `and` payload or a multi-property
/// `not` payload.
fn merge(children: &[&FilterNode]) -> Result<Map<String, Value>, FilterError> {
    let members = children
        .iter()
        .map(|child| Member::new(child))
        .collect::<Result<Vec<_>, _>>()?;

    // Members with a second form pick last so fixed ones are never crowded out
    let mut taken = HashSet::with_capacity(members.len());
    let mut keys = vec![(String::new(), false); members.len()];
    for flexible in [false, true] {
        for (key, member) in keys.iter_mut().zip(&members) {
            if member.negation.is_some() == flexible {
                *key = member.claim(&mut taken)?;
            }
        }
    }

    let mut map = Map::with_capacity(members.len());
    for ((key, negated), member) in keys.into_iter().zip(members) {
        let value = match member.negation {
            Some(negation) if negated => negation,
            _ => member.value,
        };
        map.insert(key, value);
    }
    Ok(map)
}

/// A `Nor` as a multi-property `not` payload. Needs two or more members
/// with distinct keys, otherwise the parser reads it back as something else.
fn not_form(group: &Group) -> Option<Value> {
    if group.len() < 2 {
        return None;
    }
    let members: Vec<&FilterNode> = group.children().iter().map(written).collect();
    merge(&members).ok().map(Value::Object)
}

/// Every ASCII letter-case spelling of `keyword`, lowercase first.
fn spellings(keyword: Keyword) -> impl Iterator<Item = String> {
    let name = keyword.as_str();
    (0_u32..1 << name.len()).map(move |mask| {
        name.char_indices()
            .map(|(i, c)| {
                if mask & (1 << i) == 0 {
                    c
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect()
    })
}

fn keyword(keyword: Keyword, payload: Value) -> (String, Value) {
    (keyword.as_str().to_string(), payload)
}

fn single(key: String, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key, value);
    Value::Object(map)
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = Value::deserialize(deserializer)?;
        parse(&document).map_err(serde::de::Error::custom)
    }
}
