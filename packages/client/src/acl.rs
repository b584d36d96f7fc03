//! Access control lists.
//!
//! An [`Acl`] is an insertion-ordered set of grants, one per subject. The
//! subject is a user object id, `role:<name>` for a role, or `*` for the
//! public. On the wire it is a JSON object keyed by subject:
//!
//! ```json
//! {"*": {"read": true, "write": false}, "role:admins": {"read": true, "write": true}}
//! ```

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::Record;

/// Subject name granting access to everyone.
pub const PUBLIC: &str = "*";

const ROLE_PREFIX: &str = "role:";

/// Read and write grants for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub subject: String,
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    entries: Vec<AclEntry>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// An ACL readable by everyone and writable by nobody else.
    pub fn public_read_only() -> Self {
        let mut acl = Self::new();
        acl.set_readable(PUBLIC, true);
        acl
    }

    fn entry_mut(&mut self, subject: &str) -> &mut AclEntry {
        let index = match self.entries.iter().position(|e| e.subject == subject) {
            Some(index) => index,
            None => {
                self.entries.push(AclEntry {
                    subject: subject.to_string(),
                    read: false,
                    write: false,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    fn entry(&self, subject: &str) -> Option<&AclEntry> {
        self.entries.iter().find(|e| e.subject == subject)
    }

    pub fn set_readable(&mut self, subject: &str, allowed: bool) {
        self.entry_mut(subject).read = allowed;
    }

    pub fn set_writable(&mut self, subject: &str, allowed: bool) {
        self.entry_mut(subject).write = allowed;
    }

    pub fn is_readable(&self, subject: &str) -> bool {
        self.entry(subject).map(|e| e.read).unwrap_or(false)
    }

    pub fn is_writable(&self, subject: &str) -> bool {
        self.entry(subject).map(|e| e.write).unwrap_or(false)
    }

    pub fn set_public_readable(&mut self, allowed: bool) {
        self.set_readable(PUBLIC, allowed);
    }

    pub fn set_public_writable(&mut self, allowed: bool) {
        self.set_writable(PUBLIC, allowed);
    }

    /// Grant read access to a saved user. Fails for a user without an id.
    pub fn set_user_readable(&mut self, user: &Record, allowed: bool) -> Result<()> {
        let id = user.object_id().ok_or(Error::MissingObjectId)?;
        self.set_readable(id, allowed);
        Ok(())
    }

    pub fn set_user_writable(&mut self, user: &Record, allowed: bool) -> Result<()> {
        let id = user.object_id().ok_or(Error::MissingObjectId)?;
        self.set_writable(id, allowed);
        Ok(())
    }

    pub fn set_role_readable(&mut self, role_name: &str, allowed: bool) {
        self.set_readable(&format!("{}{}", ROLE_PREFIX, role_name), allowed);
    }

    pub fn set_role_writable(&mut self, role_name: &str, allowed: bool) {
        self.set_writable(&format!("{}{}", ROLE_PREFIX, role_name), allowed);
    }

    pub fn entries(&self) -> impl Iterator<Item = &AclEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for entry in &self.entries {
            let mut grant = Map::new();
            grant.insert("read".to_string(), Value::Bool(entry.read));
            grant.insert("write".to_string(), Value::Bool(entry.write));
            map.insert(entry.subject.clone(), Value::Object(grant));
        }
        Value::Object(map)
    }

    /// Decode the wire form. Subjects whose grant is not an object are skipped,
    /// and a missing `read` or `write` flag means `false`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let mut acl = Self::new();
        for (subject, grant) in map {
            let Some(grant) = grant.as_object() else {
                continue;
            };
            let flag = |name: &str| grant.get(name).and_then(Value::as_bool).unwrap_or(false);
            acl.set_readable(subject, flag("read"));
            acl.set_writable(subject, flag("write"));
        }
        Some(acl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repeated_grants_update_one_entry() {
        let mut acl = Acl::new();
        acl.set_readable("u1", true);
        acl.set_writable("u1", true);
        acl.set_readable("u1", false);

        assert_eq!(acl.len(), 1);
        assert!(!acl.is_readable("u1"));
        assert!(acl.is_writable("u1"));
    }

    #[test]
    fn entries_follow_insertion_order() {
        let mut acl = Acl::new();
        acl.set_readable("b", true);
        acl.set_public_readable(true);
        acl.set_role_writable("admins", true);

        let subjects: Vec<&str> = acl.entries().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["b", "*", "role:admins"]);
    }

    #[test]
    fn unknown_subject_has_no_access() {
        let acl = Acl::public_read_only();
        assert!(acl.is_readable(PUBLIC));
        assert!(!acl.is_writable(PUBLIC));
        assert!(!acl.is_readable("someone"));
    }

    #[test]
    fn wire_form() {
        let mut acl = Acl::new();
        acl.set_public_readable(true);
        acl.set_writable("u1", true);

        assert_eq!(
            acl.to_json(),
            json!({
                "*": {"read": true, "write": false},
                "u1": {"read": false, "write": true}
            })
        );
    }

    #[test]
    fn from_json_tolerates_partial_grants() {
        let acl = Acl::from_json(&json!({
            "*": {"read": true},
            "bogus": 3,
            "role:mods": {"read": true, "write": true}
        }))
        .unwrap();

        assert_eq!(acl.len(), 2);
        assert!(acl.is_readable("*"));
        assert!(!acl.is_writable("*"));
        assert!(acl.is_writable("role:mods"));
        assert!(Acl::from_json(&json!([1, 2])).is_none());
    }

    #[test]
    fn user_grant_requires_saved_user() {
        let mut acl = Acl::new();
        let unsaved = Record::new("_User");
        assert!(matches!(
            acl.set_user_readable(&unsaved, true),
            Err(Error::MissingObjectId)
        ));

        let saved = Record::from_class_and_data("_User", &json!({"objectId": "u9"}));
        acl.set_user_writable(&saved, true).unwrap();
        assert!(acl.is_writable("u9"));
    }
}
