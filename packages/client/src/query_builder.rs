//! Fluent construction of filter documents.
//!
//! Each `build_*` call attaches one operator object under a field name.
//! Attaching to a field that already has an operator replaces it; different
//! fields combine as an implicit AND.
//!
//! ```ignore
//! let mut builder = QueryBuilder::new();
//! builder.build_gte("score", 1000).build_in("level", [1, 2, 3]);
//! assert_eq!(
//!     builder.build_json(),
//!     json!({"score": {"$gte": 1000}, "level": {"$in": [1, 2, 3]}})
//! );
//! ```

use serde_json::{Map, Value};

use crate::protocol::keys;
use crate::query::Query;
use crate::record::Record;

const LT: &str = "$lt";
const LTE: &str = "$lte";
const GT: &str = "$gt";
const GTE: &str = "$gte";
const NE: &str = "$ne";
const IN: &str = "$in";
const NIN: &str = "$nin";
const EXISTS: &str = "$exists";
const SELECT: &str = "$select";
const DONT_SELECT: &str = "$dontSelect";
const ALL: &str = "$all";
const RELATED_TO: &str = "$relatedTo";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    json: Map<String, Value>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach(&mut self, key: impl Into<String>, operator: &str, operand: Value) -> &mut Self {
        let mut wrapped = Map::new();
        wrapped.insert(operator.to_string(), operand);
        self.json.insert(key.into(), Value::Object(wrapped));
        self
    }

    fn list<I, V>(values: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(values.into_iter().map(Into::into).collect())
    }

    fn subquery(query: &Query, key: &str) -> Value {
        let mut inner = Map::new();
        inner.insert(keys::CLASS_NAME.to_string(), Value::from(query.class_name()));
        if let Some(filter) = query.where_json() {
            inner.insert("where".to_string(), filter.clone());
        }
        let mut select = Map::new();
        select.insert("query".to_string(), Value::Object(inner));
        select.insert("key".to_string(), Value::from(key));
        Value::Object(select)
    }

    /// Plain equality, without an operator object.
    pub fn build_equal(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.json.insert(key.into(), value.into());
        self
    }

    pub fn build_lt(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attach(key, LT, value.into())
    }

    pub fn build_lte(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attach(key, LTE, value.into())
    }

    pub fn build_gt(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attach(key, GT, value.into())
    }

    pub fn build_gte(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attach(key, GTE, value.into())
    }

    pub fn build_ne(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attach(key, NE, value.into())
    }

    pub fn build_in<I, V>(&mut self, key: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.attach(key, IN, Self::list(values))
    }

    pub fn build_nin<I, V>(&mut self, key: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.attach(key, NIN, Self::list(values))
    }

    /// Array field containing every one of `values`.
    pub fn build_all<I, V>(&mut self, key: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.attach(key, ALL, Self::list(values))
    }

    pub fn build_exists(&mut self, key: impl Into<String>, exists: bool) -> &mut Self {
        self.attach(key, EXISTS, Value::Bool(exists))
    }

    /// `key` equals the `query_key` field of some result of `query`.
    pub fn build_select(&mut self, key: impl Into<String>, query: &Query, query_key: &str) -> &mut Self {
        self.attach(key, SELECT, Self::subquery(query, query_key))
    }

    /// `key` equals the `query_key` field of no result of `query`.
    pub fn build_dont_select(
        &mut self,
        key: impl Into<String>,
        query: &Query,
        query_key: &str,
    ) -> &mut Self {
        self.attach(key, DONT_SELECT, Self::subquery(query, query_key))
    }

    /// Members of the `key` relation on `object`. This is a top-level
    /// constraint, stored under `$relatedTo` itself.
    pub fn build_related_to(&mut self, object: &Record, key: &str) -> &mut Self {
        let mut related = Map::new();
        related.insert("object".to_string(), object.to_pointer());
        related.insert("key".to_string(), Value::from(key));
        self.json.insert(RELATED_TO.to_string(), Value::Object(related));
        self
    }

    /// Drop whatever constraint `key` carries.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.json.shift_remove(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.json.is_empty()
    }

    /// The filter document built so far.
    pub fn build_json(&self) -> Value {
        Value::Object(self.json.clone())
    }
}
