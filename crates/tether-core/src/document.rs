use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Serialize a value into a document. The value must serialize to a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Codec(e.to_string()))? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Codec(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Deserialize a document into a typed value.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct Sample {
        space_name: String,
        is_public: bool,
    }

    #[test]
    fn test_document_field_names() {
        let doc = to_document(&Sample {
            space_name: "dmz".to_string(),
            is_public: true,
        })
        .unwrap();

        assert_eq!(doc.get("space-name"), Some(&Value::from("dmz")));
        let back: Sample = from_document(doc).unwrap();
        assert!(back.is_public);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(to_document(&42), Err(StoreError::Codec(_))));
    }
}
