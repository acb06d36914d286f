//! Property tests for scope evaluation

use std::collections::BTreeSet;

use dogma_scope::ConfigScope;
use proptest::prelude::*;
use serde_json::{Map, Value as JsonValue};

// Values whose JSON text is also a valid block literal
fn literal_leaf() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        (-1000i64..1000).prop_map(|i| JsonValue::Number(i.into())),
        (-4000i32..4000).prop_map(|q| serde_json::json!(f64::from(q) / 4.0)),
        "[a-z ]{0,8}".prop_map(JsonValue::String),
    ]
}

fn literal_tree() -> impl Strategy<Value = JsonValue> {
    literal_leaf().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(JsonValue::Array),
            prop::collection::btree_map("k[a-z]{0,4}", inner, 0..5)
                .prop_map(|m| JsonValue::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn fixed_object() -> impl Strategy<Value = Map<String, JsonValue>> {
    prop::collection::btree_map("k[a-z]{0,4}", literal_tree(), 1..6)
        .prop_map(|m| m.into_iter().collect())
}

fn evaluate(source: &str, fixed: &Map<String, JsonValue>) -> ConfigScope {
    let mut scope = ConfigScope::from_source(source).unwrap();
    scope
        .evaluate(Some(&JsonValue::Object(fixed.clone())), None)
        .unwrap();
    scope
}

/// Every fixed path of `fixed` holds the fixed value in `result`
fn contains_fixed(result: &JsonValue, fixed: &JsonValue) -> bool {
    match fixed {
        JsonValue::Object(map) => map
            .iter()
            .all(|(k, v)| result.get(k).is_some_and(|r| contains_fixed(r, v))),
        other => result == other,
    }
}

fn dotted_paths(map: &Map<String, JsonValue>, prefix: &str, out: &mut BTreeSet<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let JsonValue::Object(child) = value {
            dotted_paths(child, &path, out);
        }
        out.insert(path);
    }
}

fn frozen_mutation() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "kxs.append(1)",
        "kxs.extend([1, 2])",
        "kxs.insert(0, 9)",
        "kxs.reverse()",
        "kxs.sort()",
        "kxs[0:1] = [7, 7]",
        "kxs[0] = 5",
        "del kxs[0]",
        "del kxs[:]",
        "kxs += [3]",
        "kxs *= 2",
        "kxs.remove(1)",
        "kxs = [0]",
    ])
}

proptest! {
    #[test]
    fn prop_protected_keys_are_invariant(
        fixed in fixed_object(),
        attempts in prop::collection::vec(literal_tree(), 6),
    ) {
        let source = fixed
            .keys()
            .zip(&attempts)
            .map(|(key, attempt)| format!("{key} = {attempt}"))
            .collect::<Vec<_>>()
            .join("\n");
        let scope = evaluate(&source, &fixed);
        let config = scope.config().unwrap().to_value();
        for (key, value) in &fixed {
            prop_assert!(contains_fixed(&config[key], value), "key {} changed", key);
        }
    }

    #[test]
    fn prop_revelation_is_complete(fixed in fixed_object()) {
        let scope = evaluate("unrelated = 1", &fixed);
        let config = scope.config().unwrap();

        let mut expected = BTreeSet::new();
        dotted_paths(&fixed, "", &mut expected);
        prop_assert_eq!(scope.added_values().unwrap(), &expected);
        for path in &expected {
            prop_assert!(config.lookup_str(path).is_some(), "missing {}", path);
        }
        prop_assert!(contains_fixed(&config.to_value(), &JsonValue::Object(fixed)));
    }

    #[test]
    fn prop_frozen_lists_ignore_mutation(
        items in prop::collection::vec(-5i64..5, 1..6),
        mutations in prop::collection::vec(frozen_mutation(), 1..5),
    ) {
        let list = JsonValue::Array(items.into_iter().map(JsonValue::from).collect());
        let fixed: Map<String, JsonValue> = [("kxs".to_string(), list.clone())].into_iter().collect();
        let scope = evaluate(&mutations.join("\n"), &fixed);
        prop_assert_eq!(scope.get("kxs").unwrap(), &list);
    }
}
