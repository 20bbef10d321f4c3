use std::sync::Arc;

use serde_json::Value;

use crate::document::Document;

/// A named, store-evaluated condition on an existing document.
#[derive(Clone)]
pub struct Predicate {
    name: &'static str,
    check: Arc<dyn Fn(&Document) -> bool + Send + Sync>,
}

impl Predicate {
    pub fn new(
        name: &'static str,
        check: impl Fn(&Document) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, doc: &Document) -> bool {
        (self.check)(doc)
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// Precondition that must hold for an op (and so its whole transaction) to apply.
#[derive(Debug, Clone, Default)]
pub enum Assertion {
    #[default]
    None,
    Missing,
    Exists,
    FieldEquals {
        field: String,
        value: Value,
    },
    /// Holds only when the document exists and the predicate accepts it.
    Custom(Predicate),
}

impl Assertion {
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Assertion::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Evaluate against the document's current state (`None` when absent).
    pub fn holds(&self, current: Option<&Document>) -> bool {
        match self {
            Assertion::None => true,
            Assertion::Missing => current.is_none(),
            Assertion::Exists => current.is_some(),
            Assertion::FieldEquals { field, value } => current
                .and_then(|doc| doc.get(field))
                .is_some_and(|v| v == value),
            Assertion::Custom(predicate) => current.is_some_and(|doc| predicate.matches(doc)),
        }
    }
}

/// What an op does to its document once every assertion has held.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Mutation {
    /// Assert only.
    #[default]
    None,
    /// Insert a new document. Skipped if the document already exists.
    Insert(Document),
    /// Overwrite the given fields. Skipped if the document is absent.
    Set(Document),
    Remove,
}

/// The effect of a single op on one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentWrite {
    Keep,
    Put(Document),
    Delete,
}

impl Mutation {
    /// Resolve this mutation against the document's current state.
    pub fn resolve(&self, current: Option<&Document>) -> DocumentWrite {
        match (self, current) {
            (Mutation::None, _) => DocumentWrite::Keep,
            (Mutation::Insert(doc), None) => DocumentWrite::Put(doc.clone()),
            (Mutation::Insert(_), Some(_)) => DocumentWrite::Keep,
            (Mutation::Set(fields), Some(existing)) => {
                let mut updated = existing.clone();
                for (field, value) in fields {
                    updated.insert(field.clone(), value.clone());
                }
                DocumentWrite::Put(updated)
            }
            (Mutation::Set(_), None) => DocumentWrite::Keep,
            (Mutation::Remove, Some(_)) => DocumentWrite::Delete,
            (Mutation::Remove, None) => DocumentWrite::Keep,
        }
    }
}

/// One conditional operation within an atomic transaction.
#[derive(Debug, Clone)]
pub struct TransactionOp {
    pub collection: String,
    pub id: String,
    pub assertion: Assertion,
    pub mutation: Mutation,
}

impl TransactionOp {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            assertion: Assertion::None,
            mutation: Mutation::None,
        }
    }

    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.assertion = assertion;
        self
    }

    pub fn insert(mut self, doc: Document) -> Self {
        self.mutation = Mutation::Insert(doc);
        self
    }

    pub fn set(mut self, fields: Document) -> Self {
        self.mutation = Mutation::Set(fields);
        self
    }

    /// Set a single field, accumulating with any fields already set on this op.
    pub fn set_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = match self.mutation {
            Mutation::Set(fields) => fields,
            _ => Document::new(),
        };
        fields.insert(field.into(), value.into());
        self.mutation = Mutation::Set(fields);
        self
    }

    pub fn remove(mut self) -> Self {
        self.mutation = Mutation::Remove;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_assertions_against_missing_document() {
        assert!(Assertion::None.holds(None));
        assert!(Assertion::Missing.holds(None));
        assert!(!Assertion::Exists.holds(None));
        assert!(!Assertion::field_equals("life", "alive").holds(None));

        let custom = Assertion::Custom(Predicate::new("anything", |_| true));
        assert!(!custom.holds(None));
    }

    #[test]
    fn test_field_equals() {
        let current = doc(json!({"life": "alive"}));
        assert!(Assertion::field_equals("life", "alive").holds(Some(&current)));
        assert!(!Assertion::field_equals("life", "dead").holds(Some(&current)));
        assert!(!Assertion::field_equals("name", "x").holds(Some(&current)));
    }

    #[test]
    fn test_set_merges_fields() {
        let current = doc(json!({"life": "alive", "name": "dmz"}));
        let op = TransactionOp::new("spaces", "m:dmz").set_field("life", "dead");

        match op.mutation.resolve(Some(&current)) {
            DocumentWrite::Put(updated) => {
                assert_eq!(updated.get("life"), Some(&json!("dead")));
                assert_eq!(updated.get("name"), Some(&json!("dmz")));
            }
            other => panic!("expected Put, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_and_set_skip_when_state_disagrees() {
        let current = doc(json!({"life": "alive"}));
        assert_eq!(
            Mutation::Insert(Document::new()).resolve(Some(&current)),
            DocumentWrite::Keep
        );
        assert_eq!(
            Mutation::Set(current.clone()).resolve(None),
            DocumentWrite::Keep
        );
        assert_eq!(Mutation::Remove.resolve(None), DocumentWrite::Keep);
        assert_eq!(
            Mutation::Remove.resolve(Some(&current)),
            DocumentWrite::Delete
        );
    }

    #[test]
    fn test_predicate_debug_shows_name() {
        let p = Predicate::new("life-not-dead", |_| true);
        assert_eq!(format!("{:?}", p), "Predicate(\"life-not-dead\")");
    }
}
