use serde_json::Value;

use crate::document::ArrayFields;

/// Collects every property name that holds an array in any of the documents.
///
/// Detection is a union over names: a field that is an array in one document
/// and a scalar in another is still array-typed.
pub fn detect_array_fields(documents: &[&Value]) -> ArrayFields {
    let mut fields = ArrayFields::new();
    for document in documents {
        collect(document, &mut fields);
    }

    return fields;
}

fn collect(value: &Value, fields: &mut ArrayFields) {
    match value {
        Value::Object(map) => {
            for (key, property) in map {
                if property.is_array() {
                    fields.insert(key.as_str());
                }
                collect(property, fields);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, fields);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}
