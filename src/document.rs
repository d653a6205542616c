use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// Field names that must always be written out as JSON arrays.
///
/// Membership is by name only: a `tags` array seen anywhere marks every
/// `tags` property in every document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArrayFields(BTreeSet<String>);

impl ArrayFields {
    pub fn new() -> Self {
        return Self(BTreeSet::new());
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        return self.0.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        return self.0.contains(name);
    }

    pub fn len(&self) -> usize {
        return self.0.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        return self.0.iter().map(String::as_str);
    }
}

impl<S: Into<String>> FromIterator<S> for ArrayFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        return Self(iter.into_iter().map(Into::into).collect());
    }
}

/// Flat field name to value replacements read from the inputs file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OverrideMap(BTreeMap<String, Value>);

impl OverrideMap {
    pub fn get(&self, key: &str) -> Option<&Value> {
        return self.0.get(key);
    }

    pub fn len(&self) -> usize {
        return self.0.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }
}

impl From<serde_json::Map<String, Value>> for OverrideMap {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        return Self(map.into_iter().collect());
    }
}

pub fn is_empty_object(value: &Value) -> bool {
    return matches!(value, Value::Object(map) if map.is_empty());
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{is_empty_object, ArrayFields, OverrideMap};

    #[test]
    fn array_fields_are_deduplicated_by_name() {
        let fields: ArrayFields = vec!["tags", "regions", "tags"].into_iter().collect();

        assert_eq!(2, fields.len());
        assert_eq!(vec!["regions", "tags"], fields.iter().collect::<Vec<_>>());
    }

    #[test]
    fn override_map_from_json_object() {
        let object = json!({"location": "eastus", "regions": ["a", "b"]});
        let overrides = OverrideMap::from(object.as_object().unwrap().clone());

        assert_eq!(Some(&json!("eastus")), overrides.get("location"));
        assert_eq!(Some(&json!(["a", "b"])), overrides.get("regions"));
        assert_eq!(None, overrides.get("missing"));
        assert_eq!(2, overrides.len());
    }

    #[test]
    fn only_objects_without_properties_are_empty_objects() {
        assert_eq!(true, is_empty_object(&json!({})));
        assert_eq!(false, is_empty_object(&json!({"a": 1})));
        assert_eq!(false, is_empty_object(&json!([])));
        assert_eq!(false, is_empty_object(&json!(null)));
    }
}
