//! Registration entities
//!
//! Entities are plain field maps: the API schema is not validated, a payload
//! that is not a JSON object yields an entity with no fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::repository::Resource;

macro_rules! field_model {
    ($(#[$meta:meta])* $name:ident, $resource:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name {
            fields: Map<String, Value>,
        }

        impl $name {
            /// Value of `field`, if present.
            #[must_use]
            pub fn get(&self, field: &str) -> Option<&Value> {
                self.fields.get(field)
            }

            /// The `id` field, if present.
            #[must_use]
            pub fn id(&self) -> Option<&Value> {
                self.fields.get("id")
            }

            #[must_use]
            pub fn fields(&self) -> &Map<String, Value> {
                &self.fields
            }

            #[must_use]
            pub fn into_fields(self) -> Map<String, Value> {
                self.fields
            }
        }

        impl Resource for $name {
            const NAME: &'static str = $resource;

            fn from_payload(payload: Value) -> Self {
                match payload {
                    Value::Object(fields) => Self { fields },
                    _ => Self::default(),
                }
            }
        }

        impl From<Map<String, Value>> for $name {
            fn from(fields: Map<String, Value>) -> Self {
                Self { fields }
            }
        }
    };
}

field_model!(
    /// A person registered for an event.
    Attendee,
    "attendee"
);

field_model!(
    /// An event on the registration platform.
    Event,
    "event"
);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_object_payload() {
        let event = Event::from_payload(json!({"id": "e1", "title": "Launch"}));
        assert_eq!(event.id(), Some(&json!("e1")));
        assert_eq!(event.get("title"), Some(&json!("Launch")));
        assert_eq!(event.get("missing"), None);
        assert_eq!(event.fields().len(), 2);
    }

    #[test]
    fn non_object_payload_is_empty() {
        assert!(Attendee::from_payload(Value::Null).fields().is_empty());
        assert!(Attendee::from_payload(json!([1, 2])).into_fields().is_empty());
    }

    #[test]
    fn serializes_as_plain_object() {
        let attendee = Attendee::from_payload(json!({"id": 7}));
        assert_eq!(serde_json::to_value(&attendee).unwrap(), json!({"id": 7}));
    }

    #[test]
    fn resource_names() {
        assert_eq!(Attendee::NAME, "attendee");
        assert_eq!(Event::NAME, "event");
    }
}
