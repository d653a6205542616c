use std::path::Path;

use serde_json::Value;

use crate::document::{ArrayFields, OverrideMap};

/// Replaces every property whose name is in `overrides`, at any depth.
///
/// A replaced value is final: the walk does not descend into it.
pub fn apply_overrides(tree: &mut Value, overrides: &OverrideMap, array_fields: &ArrayFields) {
    match tree {
        Value::Object(map) => {
            for (key, property) in map.iter_mut() {
                match overrides.get(key) {
                    Some(value) => {
                        *property = coerce_to_field_shape(key, value.clone(), array_fields);
                    }
                    None => apply_overrides(property, overrides, array_fields),
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                apply_overrides(item, overrides, array_fields);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

/// Wraps a non-array value in a single-element array when `key` is array-typed.
pub fn coerce_to_field_shape(key: &str, value: Value, array_fields: &ArrayFields) -> Value {
    if array_fields.contains(key) && !value.is_array() {
        return Value::Array(vec![value]);
    }

    return value;
}

/// Overwrites every property named `key` with `path`, returning how many were set.
pub fn inject_path(tree: &mut Value, key: &str, path: &Path) -> usize {
    let rendered = Value::String(path.display().to_string());
    return inject(tree, key, &rendered);
}

fn inject(tree: &mut Value, key: &str, rendered: &Value) -> usize {
    match tree {
        Value::Object(map) => {
            let mut count = 0;
            for (name, property) in map.iter_mut() {
                if name == key {
                    *property = rendered.clone();
                    count += 1;
                } else {
                    count += inject(property, key, rendered);
                }
            }
            return count;
        }
        Value::Array(items) => {
            return items.iter_mut().map(|item| inject(item, key, rendered)).sum();
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => return 0,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::{apply_overrides, coerce_to_field_shape, inject_path};
    use crate::document::{ArrayFields, OverrideMap};

    fn overrides(value: serde_json::Value) -> OverrideMap {
        return OverrideMap::from(value.as_object().unwrap().clone());
    }

    #[test]
    fn scalar_override_is_wrapped_for_array_fields() {
        let mut tree = json!({"regions": ["eastus"]});
        let fields: ArrayFields = vec!["regions"].into_iter().collect();

        apply_overrides(&mut tree, &overrides(json!({"regions": "centralus"})), &fields);
        assert_eq!(json!({"regions": ["centralus"]}), tree);
    }

    #[test]
    fn array_override_is_used_unchanged() {
        let fields: ArrayFields = vec!["regions"].into_iter().collect();

        let value = coerce_to_field_shape("regions", json!(["a", "b"]), &fields);
        assert_eq!(json!(["a", "b"]), value);
    }

    #[test]
    fn scalar_fields_keep_scalars() {
        let value = coerce_to_field_shape("location", json!("eastus"), &ArrayFields::new());
        assert_eq!(json!("eastus"), value);
    }

    #[test]
    fn nested_occurrences_are_all_replaced() {
        let mut tree = json!({
            "location": "westus",
            "hub": {"location": "northeurope", "name": "hub"},
            "spokes": [{"location": "uksouth"}, {"name": "x"}]
        });

        apply_overrides(&mut tree, &overrides(json!({"location": "eastus"})), &ArrayFields::new());
        assert_eq!(
            json!({
                "location": "eastus",
                "hub": {"location": "eastus", "name": "hub"},
                "spokes": [{"location": "eastus"}, {"name": "x"}]
            }),
            tree
        );
    }

    #[test]
    fn replaced_subtree_is_not_walked() {
        let mut tree = json!({"settings": {"name": "old"}});
        let map = overrides(json!({"settings": {"name": "kept"}, "name": "new"}));

        apply_overrides(&mut tree, &map, &ArrayFields::new());
        assert_eq!(json!({"settings": {"name": "kept"}}), tree);
    }

    #[test]
    fn keys_missing_from_tree_are_not_added() {
        let mut tree = json!({"a": 1});

        apply_overrides(&mut tree, &overrides(json!({"b": 2})), &ArrayFields::new());
        assert_eq!(json!({"a": 1}), tree);
    }

    #[test]
    fn module_path_is_injected_everywhere() {
        let mut tree = json!({
            "module_folder_path": "placeholder",
            "nested": [{"module_folder_path": null}]
        });

        let count = inject_path(&mut tree, "module_folder_path", &PathBuf::from("/abs/platform"));
        assert_eq!(2, count);
        assert_eq!(
            json!({
                "module_folder_path": "/abs/platform",
                "nested": [{"module_folder_path": "/abs/platform"}]
            }),
            tree
        );
    }

    #[test]
    fn module_path_missing_is_a_noop() {
        let mut tree = json!({"name": "x"});

        let count = inject_path(&mut tree, "module_folder_path", &PathBuf::from("/abs"));
        assert_eq!(0, count);
        assert_eq!(json!({"name": "x"}), tree);
    }
}
