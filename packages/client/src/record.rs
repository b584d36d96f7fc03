//! The client-side image of one remote document.
//!
//! A [`Record`] owns its attributes and optional ACL. Identity and
//! timestamps are never written by callers; they only arrive through
//! [`Record::merge_json`], the single reconciliation step every CRUD path
//! goes through.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::acl::Acl;
use crate::protocol::{self, keys};

/// `__type` tag of an encoded reference.
pub const POINTER_TYPE: &str = "Pointer";
const DATE_TYPE: &str = "Date";

/// Keys that live on dedicated fields and never in the attribute map.
pub const RESERVED_KEYS: [&str; 4] = [
    keys::OBJECT_ID,
    keys::CREATED_AT,
    keys::UPDATED_AT,
    keys::CLASS_NAME,
];

/// True if `value` is an encoded reference to another record.
pub fn is_pointer(value: &Value) -> bool {
    value.get(keys::TYPE).and_then(Value::as_str) == Some(POINTER_TYPE)
}

/// Parse `YYYY-MM-DDThh:mm:ss[.frac][±hh:mm|Z]`. A missing offset means UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_timestamp(text),
        Value::Object(map) if map.get(keys::TYPE).and_then(Value::as_str) == Some(DATE_TYPE) => {
            map.get("iso").and_then(Value::as_str).and_then(parse_timestamp)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    class_name: String,
    object_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    attributes: Map<String, Value>,
    acl: Option<Acl>,
}

impl Record {
    /// A new, unsaved record of `class_name`.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            created_at: None,
            updated_at: None,
            attributes: Map::new(),
            acl: None,
        }
    }

    /// A record materialized from a server document.
    pub fn from_class_and_data(class_name: impl Into<String>, data: &Value) -> Self {
        let mut record = Self::new(class_name);
        record.merge_json(data);
        record
    }

    /// A handle on an existing remote record whose data has not been fetched.
    pub fn with_object_id(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        let mut record = Self::new(class_name);
        record.object_id = Some(object_id.into());
        record
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    /// Not yet persisted.
    pub fn is_new(&self) -> bool {
        self.object_id.is_none()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Collection path: `classes/<class>`, `users` or `roles`.
    pub fn class_path(&self) -> String {
        protocol::class_path(&self.class_name)
    }

    /// Path of this record, once it has an id.
    pub fn object_path(&self) -> Option<String> {
        self.object_id
            .as_ref()
            .map(|id| format!("{}/{}", self.class_path(), id))
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Set an attribute. Reserved keys are refused and `false` is returned.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            log::warn!("ignoring write to reserved key {:?}", key);
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.set(key, Value::String(value.into()))
    }

    pub fn set_number(&mut self, key: impl Into<String>, value: i64) -> bool {
        self.set(key, value)
    }

    pub fn set_real(&mut self, key: impl Into<String>, value: f64) -> bool {
        self.set(key, value)
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) -> bool {
        self.set(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.shift_remove(key)
    }

    /// The pointer encoding of this record.
    ///
    /// An unsaved record yields a pointer without `objectId`.
    pub fn to_pointer(&self) -> Value {
        let mut pointer = Map::new();
        pointer.insert(keys::TYPE.to_string(), Value::from(POINTER_TYPE));
        if !self.class_name.is_empty() {
            pointer.insert(keys::CLASS_NAME.to_string(), Value::from(self.class_name.as_str()));
        }
        if let Some(id) = &self.object_id {
            pointer.insert(keys::OBJECT_ID.to_string(), Value::from(id.as_str()));
        }
        Value::Object(pointer)
    }

    /// Store a reference to `other` under `key`.
    pub fn set_reference(&mut self, key: impl Into<String>, other: &Record) -> bool {
        if other.is_new() {
            log::debug!(
                "reference to unsaved {} record has no objectId",
                other.class_name
            );
        }
        self.set(key, other.to_pointer())
    }

    /// Keys whose value is a pointer, in attribute order.
    pub fn pointer_keys(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, v)| is_pointer(v))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Atomically add `amount` on the server at the next save.
    pub fn increment(&mut self, key: impl Into<String>, amount: i64) -> bool {
        let mut op = Map::new();
        op.insert(keys::OP.to_string(), Value::from("Increment"));
        op.insert(keys::AMOUNT.to_string(), Value::from(amount));
        self.set(key, Value::Object(op))
    }

    /// Remove the field on the server at the next save.
    pub fn delete_field(&mut self, key: impl Into<String>) -> bool {
        let mut op = Map::new();
        op.insert(keys::OP.to_string(), Value::from("Delete"));
        self.set(key, Value::Object(op))
    }

    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    /// The ACL, created empty on first use.
    pub fn acl_mut(&mut self) -> &mut Acl {
        self.acl.get_or_insert_with(Acl::new)
    }

    pub fn set_acl(&mut self, acl: Acl) {
        self.acl = Some(acl);
    }

    pub fn clear_acl(&mut self) {
        self.acl = None;
    }

    /// Overlay a server document onto this record.
    ///
    /// `objectId` and the timestamps move to their fields, `className` is
    /// dropped, `ACL` is decoded into the record's ACL, and every other key
    /// overwrites the attribute of the same name. Attributes absent from the
    /// document are kept. A timestamp that fails to parse leaves the previous
    /// value in place.
    pub fn merge_json(&mut self, incoming: &Value) {
        let Some(document) = incoming.as_object() else {
            log::debug!("ignoring non-object merge into {}", self.class_name);
            return;
        };

        for (key, value) in document {
            match key.as_str() {
                keys::OBJECT_ID => match value.as_str() {
                    Some(id) if !id.is_empty() => self.object_id = Some(id.to_string()),
                    _ => log::warn!("ignoring malformed objectId {}", value),
                },
                keys::CREATED_AT => match timestamp_value(value) {
                    Some(ts) => self.created_at = Some(ts),
                    None => log::warn!("unparseable createdAt {}", value),
                },
                keys::UPDATED_AT => match timestamp_value(value) {
                    Some(ts) => self.updated_at = Some(ts),
                    None => log::warn!("unparseable updatedAt {}", value),
                },
                keys::CLASS_NAME => {}
                keys::ACL => match Acl::from_json(value) {
                    Some(acl) => self.acl = Some(acl),
                    None => log::warn!("unparseable ACL {}", value),
                },
                _ => {
                    self.attributes.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// The request body for a save: attributes plus the ACL, without the
    /// session token.
    pub fn to_json(&self) -> Value {
        let mut body: Map<String, Value> = self
            .attributes
            .iter()
            .filter(|(k, _)| k.as_str() != keys::SESSION_TOKEN)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(acl) = &self.acl {
            body.insert(keys::ACL.to_string(), acl.to_json());
        }
        Value::Object(body)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}
