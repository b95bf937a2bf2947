use serde_json::{Map, Value};

use super::{Aggregate, Update};
use crate::error::{Result, StoreError};

/// A dynamically shaped aggregate: a JSON object whose top-level keys are the
/// fields. The partial must itself be a JSON object.
impl Aggregate for Map<String, Value> {
    type Partial = Value;

    fn merge(&self, partial: Value) -> Result<Self> {
        let Value::Object(fields) = partial else {
            return Err(StoreError::InvalidPartial(format!(
                "expected a JSON object, got {}",
                kind(&partial)
            )));
        };

        let mut next = self.clone();
        next.extend(fields);
        Ok(next)
    }
}

impl From<Value> for Update<'_, Map<String, Value>> {
    fn from(partial: Value) -> Self {
        Update::Partial(partial)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn merge_overwrites_present_keys() {
        let state = object(json!({ "userName": "", "active": false, "counter": 1 }));
        let merged = state.merge(json!({ "userName": "Debs" })).unwrap();
        assert_eq!(
            Value::Object(merged),
            json!({ "userName": "Debs", "active": false, "counter": 1 })
        );
    }

    #[test]
    fn nested_objects_are_not_merged() {
        let state = object(json!({ "prefs": { "theme": "dark", "size": 3 } }));
        let merged = state.merge(json!({ "prefs": { "theme": "light" } })).unwrap();
        assert_eq!(Value::Object(merged), json!({ "prefs": { "theme": "light" } }));
    }

    #[test]
    fn new_keys_are_added() {
        let state = object(json!({ "a": 1 }));
        let merged = state.merge(json!({ "b": 2 })).unwrap();
        assert_eq!(Value::Object(merged), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn non_object_partial_is_rejected() {
        let state = object(json!({ "a": 1 }));
        let err = state.merge(json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidPartial("expected a JSON object, got an array".to_string())
        );
    }
}
