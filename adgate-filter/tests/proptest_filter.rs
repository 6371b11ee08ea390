//! Property-based tests for the filter compiler using proptest.
//!
//! Documents are generated from the DSL grammar so that every generated
//! input is valid; arbitrary text is used separately to check that parsing
//! never panics.

use adgate_filter::constants::Keyword;
use adgate_filter::{
    FilterError, FilterKind, FilterOptions, escape_value, parse, parse_str, parse_with,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

// =============================================================================
// Document strategies
// =============================================================================

fn single(key: String, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key, value);
    Value::Object(map)
}

fn attribute() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9-]{0,12}"
        .prop_filter("keywords are reserved", |s| Keyword::from_key(s).is_none())
}

/// A keyword in random letter case; the parser ignores case.
fn keyword(name: &'static str) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), name.len()).prop_map(move |upper| {
        name.chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect()
    })
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 =,.*()]{0,16}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn leaf() -> impl Strategy<Value = (String, Value)> {
    prop_oneof![
        4 => (attribute(), scalar()),
        1 => (keyword("band"), attribute(), any::<i64>())
            .prop_map(|(key, attr, mask)| (key, json!({ attr: mask }))),
        1 => (keyword("bor"), attribute(), any::<i64>())
            .prop_map(|(key, attr, mask)| (key, json!({ attr: mask }))),
        1 => (keyword("recurse"), attribute(), "[a-z]{1,8}").prop_map(|(key, attr, cn)| {
            (key, json!({ attr: format!("CN={cn},DC=corp,DC=local") }))
        }),
    ]
}

fn entry() -> impl Strategy<Value = (String, Value)> {
    leaf().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            // Mixed-case keywords let one `and` hold the same keyword twice
            (keyword("and"), prop::collection::vec(inner.clone(), 0..6)).prop_map(|(key, pairs)| {
                (key, Value::Object(pairs.into_iter().collect()))
            }),
            (keyword("or"), prop::collection::vec(inner, 0..6)).prop_map(|(key, pairs)| {
                let items = pairs.into_iter().map(|(k, v)| single(k, v)).collect();
                (key, Value::Array(items))
            }),
            (keyword("nor"), prop::collection::vec(leaf(), 0..6)).prop_map(|(key, pairs)| {
                let items = pairs.into_iter().map(|(k, v)| single(k, v)).collect();
                (key, Value::Array(items))
            }),
            (keyword("not"), leaf()).prop_map(|(key, (k, v))| (key, single(k, v))),
            // Several properties: parsed as a `nor`
            (keyword("not"), prop::collection::vec(leaf(), 2..5)).prop_map(|(key, pairs)| {
                (key, Value::Object(pairs.into_iter().collect()))
            }),
        ]
    })
}

fn document() -> impl Strategy<Value = Value> {
    entry().prop_map(|(k, v)| single(k, v))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// The cached length always matches the rendered output
    #[test]
    fn rendered_len_matches_output(doc in document()) {
        let node = parse(&doc).unwrap();
        let rendered = node.render();
        prop_assert_eq!(rendered.len(), node.rendered_len());
    }

    /// Escaping never breaks the length invariant
    #[test]
    fn rendered_len_matches_output_when_escaping(doc in document()) {
        let options = FilterOptions::new().escape_values(true);
        let node = parse_with(&doc, &options).unwrap();
        prop_assert_eq!(node.render().len(), node.rendered_len());
    }

    /// Rendering is deterministic across repeated parses
    #[test]
    fn render_is_deterministic(doc in document()) {
        let first = parse(&doc).unwrap().render();
        let second = parse(&doc).unwrap().render();
        prop_assert_eq!(first, second);
    }

    /// Writing a parsed tree back to JSON and parsing again gives the same tree
    #[test]
    fn json_round_trip(doc in document()) {
        let node = parse(&doc).unwrap();
        let written = node.to_json().unwrap();
        prop_assert_eq!(parse(&written).unwrap(), node);
    }

    /// Rendered filters always have balanced parentheses
    #[test]
    fn parentheses_balanced(doc in document()) {
        let options = FilterOptions::new().escape_values(true);
        let rendered = parse_with(&doc, &options).unwrap().render();
        let mut depth: i64 = 0;
        for c in rendered.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            prop_assert!(depth >= 0, "unbalanced: {}", rendered);
        }
        prop_assert_eq!(depth, 0);
    }

    /// Escaped values contain no filter metacharacters
    #[test]
    fn escaped_values_are_inert(s in "\\PC{0,32}") {
        let escaped = escape_value(&s);
        prop_assert!(!escaped.contains(['*', '(', ')', '\0']));
    }

    /// A negated member inside `nor` is rejected rather than un-negated
    #[test]
    fn negated_nor_member_rejected(
        nor in keyword("nor"),
        not in keyword("not"),
        (k, v) in leaf(),
        siblings in prop::collection::vec(leaf(), 0..3),
    ) {
        let mut items: Vec<Value> = siblings.into_iter().map(|(k, v)| single(k, v)).collect();
        items.push(single(not, single(k, v)));
        let err = parse(&single(nor, Value::Array(items))).unwrap_err();
        prop_assert_eq!(
            err,
            FilterError::InvalidChild { parent: FilterKind::Nor, child: FilterKind::Not }
        );
    }

    /// Arbitrary text never panics the parser
    #[test]
    fn parse_str_never_panics(s in "\\PC{0,64}") {
        let _ = parse_str(&s);
    }
}
