//! Documents and their identities.

use crate::error::{CoreError, CoreResult};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;

/// Field map of a document.
pub type Fields = Map<String, Value>;

/// Identity of a document within its table.
///
/// Identities are positive, assigned by the table in increasing order and
/// never reused while the table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub u64);

impl DocId {
    /// Creates a document identity.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identity value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A document stored in a table.
///
/// The field map includes the identity field exactly as it is persisted, so
/// `doc["id"]` and [`Document::id`] agree. Dereferences to the field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocId,
    fields: Fields,
}

impl Document {
    pub(crate) fn new(id: DocId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Rebuilds a document from its persisted form.
    ///
    /// `position` is only used to describe where corrupted data was found.
    pub(crate) fn from_persisted(
        table: &str,
        id_field: &str,
        position: usize,
        raw: Value,
    ) -> CoreResult<Self> {
        let Value::Object(fields) = raw else {
            return Err(CoreError::data(
                table,
                format!("entry {position} is not an object"),
            ));
        };

        let id = match fields.get(id_field) {
            None => {
                return Err(CoreError::data(
                    table,
                    format!("entry {position} has no '{id_field}' field"),
                ))
            }
            Some(value) => value.as_u64().filter(|id| *id > 0).ok_or_else(|| {
                CoreError::data(
                    table,
                    format!("entry {position} has a non-positive or non-integer '{id_field}': {value}"),
                )
            })?,
        };

        Ok(Self::new(DocId(id), fields))
    }

    /// Returns the document's identity.
    #[must_use]
    pub fn id(&self) -> DocId {
        self.id
    }

    /// Returns the document's fields, identity field included.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Consumes the document and returns its fields.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Returns the document as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl Deref for Document {
    type Target = Fields;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl PartialEq<Value> for Document {
    fn eq(&self, other: &Value) -> bool {
        matches!(other, Value::Object(map) if *map == self.fields)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.fields)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Converts a caller-supplied document into a field map.
///
/// Anything that does not serialize to a JSON object is rejected with a
/// validation error; values JSON cannot represent are type errors.
pub(crate) fn to_fields<T: Serialize + ?Sized>(doc: &T) -> CoreResult<Fields> {
    match serde_json::to_value(doc)? {
        Value::Object(fields) => Ok(fields),
        other => Err(CoreError::validation(format!(
            "a document must be a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn doc_id_ordering_and_display() {
        let a = DocId::new(1);
        let b = DocId::from(2);
        assert!(a < b);
        assert_eq!(format!("{b}"), "2");
        assert_eq!(b.as_u64(), 2);
    }

    #[test]
    fn from_persisted_reads_identity() {
        let doc = Document::from_persisted("t", "id", 0, json!({"char": "a", "id": 7})).unwrap();
        assert_eq!(doc.id(), DocId(7));
        assert_eq!(doc["char"], "a");
        assert_eq!(doc, json!({"char": "a", "id": 7}));
    }

    #[test]
    fn from_persisted_missing_identity_is_data_error() {
        let result = Document::from_persisted("t", "id", 3, json!({"char": "a"}));
        assert!(matches!(result, Err(CoreError::Data { ref table, .. }) if table == "t"));
    }

    #[test]
    fn from_persisted_rejects_bad_identity() {
        for raw in [json!({"id": "1"}), json!({"id": 0}), json!({"id": -4}), json!({"id": 1.5})] {
            assert!(matches!(
                Document::from_persisted("t", "id", 0, raw),
                Err(CoreError::Data { .. })
            ));
        }
    }

    #[test]
    fn from_persisted_rejects_non_object() {
        let result = Document::from_persisted("t", "id", 0, json!([1, 2]));
        assert!(matches!(result, Err(CoreError::Data { .. })));
    }

    #[test]
    fn to_fields_accepts_objects_only() {
        assert!(to_fields(&json!({"a": 1})).is_ok());
        assert!(matches!(
            to_fields(&json!([1, 2, 3])),
            Err(CoreError::Validation { .. })
        ));
        assert!(matches!(
            to_fields("fails"),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn to_fields_reports_unrepresentable_values() {
        let mut doc = HashMap::new();
        doc.insert((1, 2), "tuple keys cannot be JSON object keys");
        assert!(matches!(to_fields(&doc), Err(CoreError::Type { .. })));
    }

    #[test]
    fn document_serializes_as_its_fields() {
        let doc = Document::from_persisted("t", "id", 0, json!({"b": 1, "id": 1})).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"b":1,"id":1}"#);
    }
}
