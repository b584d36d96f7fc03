//! Command execution.
//!
//! Each command performs one client call and yields the JSON to print.

use chrono::SecondsFormat;
use serde_json::{Map, Value};

use docsync::protocol::keys;
use docsync::{Client, Persistable, Query, Record, User};

use crate::Command;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] docsync::Error),

    #[error("invalid {what}: {source}")]
    InvalidJson {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} must be a JSON object")]
    NotAnObject { what: &'static str },

    #[error("cannot set reserved field {key}")]
    ReservedField { key: String },
}

pub type CommandResult = Result<Value, CommandError>;

/// Run `command` against `client`.
pub fn execute(client: &Client, command: &Command) -> CommandResult {
    match command {
        Command::Get {
            class,
            object_id,
            include,
        } => {
            let mut record = Record::with_object_id(class.as_str(), object_id.as_str());
            if *include {
                client.fetch(&mut record)?;
            } else {
                client.refresh(&mut record)?;
            }
            Ok(record_document(&record))
        }

        Command::Save { class, data, id } => {
            let attributes = parse_object("data", data)?;
            let mut record = match id {
                Some(id) => Record::with_object_id(class.as_str(), id.as_str()),
                None => Record::new(class.as_str()),
            };
            for (key, value) in attributes {
                if !record.set(key.as_str(), value) {
                    return Err(CommandError::ReservedField { key });
                }
            }
            client.save(&mut record)?;
            Ok(record_document(&record))
        }

        Command::Delete { class, object_id } => {
            let mut record = Record::with_object_id(class.as_str(), object_id.as_str());
            client.delete(&mut record)?;
            Ok(Value::Object(Map::new()))
        }

        Command::Query {
            class,
            filter,
            limit,
            skip,
            order,
            keys,
            include,
            count,
        } => {
            let mut query = Query::new(class.as_str());
            if let Some(filter) = filter {
                query.set_where_json(Value::Object(parse_object("where", filter)?));
            }
            if let Some(limit) = limit {
                query.set_limit(*limit);
            }
            if let Some(skip) = skip {
                query.set_skip(*skip);
            }
            if let Some(order) = order {
                query.set_order(order.as_str());
            }
            if let Some(keys) = keys {
                query.set_keys(keys.as_str());
            }
            if let Some(include) = include {
                query.set_include(include.as_str());
            }
            query.set_count(*count);

            client.find(&mut query)?;
            Ok(query_document(&query))
        }

        Command::Login {
            username, password, ..
        } => {
            let user = client.login(username, password)?;
            Ok(record_document(user.record()))
        }

        Command::Signup {
            username,
            password,
            email,
        } => {
            let mut user = User::new();
            user.set_username(username.as_str());
            user.set_password(password.as_str());
            if let Some(email) = email {
                user.set_email(email.as_str());
            }
            client.sign_up(&mut user)?;
            Ok(record_document(user.record()))
        }

        Command::Whoami { token } => {
            let user = client.validate(token)?;
            Ok(record_document(user.record()))
        }

        Command::ResetPassword { email } => {
            client.request_password_reset(email)?;
            Ok(Value::Object(Map::new()))
        }
    }
}

fn parse_object(what: &'static str, text: &str) -> Result<Map<String, Value>, CommandError> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CommandError::NotAnObject { what }),
        Err(source) => Err(CommandError::InvalidJson { what, source }),
    }
}

/// The record as the server would show it: id and timestamps first, then
/// attributes and ACL.
pub fn record_document(record: &Record) -> Value {
    let mut document = Map::new();
    if let Some(id) = record.object_id() {
        document.insert(keys::OBJECT_ID.to_string(), Value::from(id));
    }
    if let Some(created_at) = record.created_at() {
        document.insert(
            keys::CREATED_AT.to_string(),
            Value::from(created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    if let Some(updated_at) = record.updated_at() {
        document.insert(
            keys::UPDATED_AT.to_string(),
            Value::from(updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    for (key, value) in record.attributes() {
        document.insert(key.clone(), value.clone());
    }
    if let Some(acl) = record.acl() {
        document.insert(keys::ACL.to_string(), acl.to_json());
    }
    Value::Object(document)
}

fn query_document(query: &Query) -> Value {
    let mut document = Map::new();
    if query.is_count() {
        document.insert(keys::COUNT.to_string(), Value::from(query.size()));
    } else {
        document.insert(
            keys::RESULTS.to_string(),
            Value::Array(query.results().iter().map(record_document).collect()),
        );
    }
    Value::Object(document)
}
