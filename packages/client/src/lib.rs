//! # docsync
//!
//! Client SDK for a REST document store. Local [`Record`]s are bags of JSON
//! attributes that map onto remote documents by class name and object id.
//!
//! ## Records
//!
//! ```ignore
//! use docsync::{Client, ClientConfig, Record};
//!
//! let client = Client::new(ClientConfig::from_env()?)?;
//!
//! let mut score = Record::new("GameScore");
//! score.set_string("playerName", "Sean Plott");
//! score.set_number("score", 1337);
//! client.save(&mut score)?;
//! assert!(score.object_id().is_some());
//! ```
//!
//! ## Queries
//!
//! ```ignore
//! use docsync::{Query, QueryBuilder};
//!
//! let mut filter = QueryBuilder::new();
//! filter.build_gte("score", 1000);
//!
//! let mut query = Query::new("GameScore");
//! query.set_where(&filter).set_limit(10).set_order("-score");
//! client.find(&mut query)?;
//! for record in query.results() {
//!     println!("{:?}", record.get("playerName"));
//! }
//! ```
//!
//! ## Sessions
//!
//! A successful [`Client::login`] or [`Client::sign_up`] makes the user
//! current; every later request carries its session token until
//! [`Client::logout`].
//!
//! ## Background actions
//!
//! Every record action has an `*_in_background` twin taking a [`Shared`]
//! target and an optional [`Callback`]; see [`background`].

pub mod acl;
pub mod background;
pub mod client;
pub mod config;
pub mod error;
pub mod persist;
pub mod protocol;
pub mod query;
pub mod query_builder;
pub mod record;
pub mod role;
pub mod session;
pub mod user;

pub use acl::Acl;
pub use background::{shared, Callback, Shared, TaskHandle, TaskRunner, TaskState};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use persist::Persistable;
pub use query::Query;
pub use query_builder::QueryBuilder;
pub use record::{is_pointer, Record};
pub use role::Role;
pub use session::SessionContext;
pub use user::User;
