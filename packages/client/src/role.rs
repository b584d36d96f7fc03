//! Roles: named groups used as ACL subjects.

use crate::acl::Acl;
use crate::error::{Error, Result};
use crate::persist::Persistable;
use crate::protocol::{keys, ROLE_CLASS};
use crate::query::Query;
use crate::record::Record;

/// A record of class `_Role`.
///
/// The server refuses a role without an ACL, so one is required up front.
/// Once saved, the name cannot change.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    record: Record,
}

impl Role {
    pub fn new(name: &str, acl: Acl) -> Result<Self> {
        validate_name(name)?;
        let mut record = Record::new(ROLE_CLASS);
        record.set_string(keys::NAME, name);
        record.set_acl(acl);
        Ok(Self { record })
    }

    pub fn from_record(record: Record) -> Self {
        Self { record }
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn query() -> Query {
        Query::new(ROLE_CLASS)
    }

    pub fn name(&self) -> Option<&str> {
        self.record.get_str(keys::NAME)
    }

    /// The ACL subject granting access to members of this role.
    pub fn subject(&self) -> Option<String> {
        self.name().map(|name| format!("role:{name}"))
    }
}

/// Letters, digits, `_`, `-` and spaces.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::missing_field(keys::NAME));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '));
    if !valid {
        return Err(Error::invalid_field(
            keys::NAME,
            format!("{name:?} may only hold letters, digits, '_', '-' and spaces"),
        ));
    }
    Ok(())
}

impl Persistable for Role {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
