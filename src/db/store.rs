//! Document store abstraction.
//!
//! Handlers talk to persistence exclusively through [`DocumentStore`], so the
//! backend (Postgres in production, memory when no database is configured and
//! in tests) is chosen once at startup and injected through app state.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::time::Duration;

use super::models::{Collection, DeleteResult, Document, InsertOneResult, UpdateResult, ID_FIELD};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Equality filter over top-level document fields.
///
/// A document matches when every filter field is present with an equal value.
/// Query operators (`$`-prefixed keys) are not supported and are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().eq(ID_FIELD, id.into())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Build a filter from a caller-supplied JSON value. `null` means no filter.
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let fields = match value {
            Value::Null => return Ok(Self::all()),
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::InvalidFilter(format!(
                    "expected an object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        if let Some(key) = fields.keys().find(|k| k.starts_with('$')) {
            return Err(StoreError::InvalidFilter(format!(
                "operator `{}` is not supported",
                key
            )));
        }

        Ok(Self(fields))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub field: String,
    pub order: SortOrder,
}

/// Options for [`DocumentStore::find`]. Without a sort, documents come back in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<SortBy>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(SortBy {
            field: field.into(),
            order: SortOrder::Descending,
        });
        self
    }

    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(SortBy {
            field: field.into(),
            order: SortOrder::Ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Ordering used when sorting documents by a field. Missing fields sort
/// first. Across types the order is Postgres' jsonb order:
/// null < string < number < boolean < array < object.
pub fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::String(_) => 1,
            Value::Number(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

/// Canonical encoding of a document's natural key. Missing fields encode as
/// `null` so partial keys still compare consistently.
pub fn natural_key(doc: &Document, fields: &[&str]) -> Result<String, StoreError> {
    let values: Vec<&Value> = fields
        .iter()
        .map(|f| doc.get(*f).unwrap_or(&Value::Null))
        .collect();
    Ok(serde_json::to_string(&values)?)
}

/// Persistence operations used by the resource API. Each handler performs
/// exactly one of these calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for health output and logs.
    fn backend(&self) -> &'static str;

    /// Insert a document under a freshly assigned `_id`.
    async fn insert_one(
        &self,
        collection: Collection,
        doc: Document,
    ) -> Result<InsertOneResult, StoreError>;

    /// Insert unless a document with the same values for `key_fields` already
    /// exists. The check and the write are a single atomic step. Returns
    /// `None` when the natural key is taken.
    async fn insert_unique(
        &self,
        collection: Collection,
        key_fields: &[&str],
        doc: Document,
    ) -> Result<Option<InsertOneResult>, StoreError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Overwrite the listed top-level fields of the first matching document.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError>;

    /// Round-trip to the backend, returning the observed latency.
    async fn ping(&self) -> Result<Duration, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_matches_on_all_fields() {
        let filter = Filter::all().eq("email", "a@x.io").eq("blogId", "b1");
        assert!(filter.matches(&doc(json!({"email": "a@x.io", "blogId": "b1", "x": 1}))));
        assert!(!filter.matches(&doc(json!({"email": "a@x.io"}))));
        assert!(!filter.matches(&doc(json!({"email": "a@x.io", "blogId": "b2"}))));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&doc(json!({"anything": true}))));
    }

    #[test]
    fn test_filter_from_null_is_empty() {
        assert!(Filter::from_value(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_filter_rejects_operators() {
        let err = Filter::from_value(json!({"email": {"$ne": null}, "$where": "1"})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[test]
    fn test_filter_rejects_non_objects() {
        assert!(Filter::from_value(json!([1, 2])).is_err());
        assert!(Filter::from_value(json!("email")).is_err());
    }

    #[test]
    fn test_compare_field_orders_strings_and_numbers() {
        assert_eq!(
            compare_field(Some(&json!("2024-01-02")), Some(&json!("2024-01-01"))),
            Ordering::Greater
        );
        assert_eq!(compare_field(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_field(None, Some(&json!(""))), Ordering::Less);
    }

    #[test]
    fn test_compare_field_mixed_types_follow_jsonb_order() {
        let ascending = [
            json!(null),
            json!("zzz"),
            json!(1),
            json!(false),
            json!([1]),
            json!({"a": 1}),
        ];
        for pair in ascending.windows(2) {
            assert_eq!(
                compare_field(Some(&pair[0]), Some(&pair[1])),
                Ordering::Less,
                "{} < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_natural_key_is_order_sensitive_and_handles_missing() {
        let d = doc(json!({"blogId": "b1", "email": "a@x.io"}));
        assert_eq!(natural_key(&d, &["blogId", "email"]).unwrap(), r#"["b1","a@x.io"]"#);
        assert_eq!(natural_key(&d, &["missing"]).unwrap(), "[null]");
    }
}
