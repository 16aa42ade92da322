//! Property-based tests for keypath construction and rendering.
//!
//! These tests use proptest to generate random segment names and key
//! values and verify that rendering invariants hold for all inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::KeyPath;
    use crate::value::Value;
    use proptest::prelude::*;

    fn segment_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,12}"
    }

    fn key_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Int),
            any::<bool>().prop_map(Value::Bool),
            "[a-zA-Z0-9_.:-]{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        /// Property: rendering is deterministic
        #[test]
        fn rendering_is_deterministic(names in prop::collection::vec(segment_name(), 0..6)) {
            let mut path = KeyPath::root();
            for name in &names {
                path = path.child(name);
            }
            prop_assert_eq!(path.to_string(), path.to_string());
        }

        /// Property: child() appends exactly one segment and renders as
        /// parent + "/" + name (except at the root, which renders as "/")
        #[test]
        fn child_extends_rendering(names in prop::collection::vec(segment_name(), 1..6)) {
            let mut path = KeyPath::root();
            let mut expected = String::new();
            for name in &names {
                path = path.child(name);
                expected.push('/');
                expected.push_str(name);
            }
            prop_assert_eq!(path.segments().len(), names.len());
            prop_assert_eq!(path.to_string(), expected);
        }

        /// Property: parent() inverts child()
        #[test]
        fn parent_inverts_child(names in prop::collection::vec(segment_name(), 0..5), last in segment_name()) {
            let mut path = KeyPath::root();
            for name in &names {
                path = path.child(name);
            }
            prop_assert_eq!(path.child(&last).parent(), path);
        }

        /// Property: an entry segment renders every key's rendered form,
        /// space-separated inside braces
        #[test]
        fn entry_renders_all_keys(
            name in segment_name(),
            keys in prop::collection::vec(key_value(), 0..4),
        ) {
            let rendered = KeyPath::root().entry(&name, keys.clone()).to_string();
            prop_assert!(
                rendered.starts_with(&format!("/{}{{", name)),
                "rendering '{}' should open with the segment name and a brace",
                rendered
            );
            prop_assert!(
                rendered.ends_with('}'),
                "rendering '{}' should close with a brace",
                rendered
            );
            for key in &keys {
                prop_assert!(
                    rendered.contains(&key.to_string()),
                    "rendering '{}' should contain key '{}'",
                    rendered,
                    key
                );
            }
        }

        /// Property: a reference value renders identically to the path it
        /// wraps, and its portable form is that same string
        #[test]
        fn reference_portability_matches_rendering(names in prop::collection::vec(segment_name(), 0..5)) {
            let mut path = KeyPath::root();
            for name in &names {
                path = path.child(name);
            }
            let rendered = path.to_string();
            let reference = Value::Ref(path);
            prop_assert_eq!(reference.to_string(), rendered.clone());
            prop_assert_eq!(reference.to_portable(), Value::String(rendered));
        }
    }
}
