//! # docsync-http
//!
//! Blocking HTTP transport for the docsync client.
//!
//! The client core never speaks HTTP directly. It builds an [`HttpRequest`]
//! (absolute URL, ordered headers and query parameters, optional JSON body)
//! and hands it to an [`HttpExecutor`]:
//!
//! ```ignore
//! use docsync_http::{HttpExecutor, HttpRequest, ReqwestExecutor};
//!
//! let executor = ReqwestExecutor::with_default_timeout()?;
//! let response = executor.execute(
//!     &HttpRequest::get("https://api.example.com/1/classes/GameScore")
//!         .with_query("limit", "10"),
//! )?;
//! assert!(response.is_success());
//! ```
//!
//! Enable the `test-utils` feature to get [`executor::mock::MockExecutor`],
//! which records requests and replays canned responses.

pub mod error;
pub mod executor;
pub mod types;

pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use types::{HttpRequest, HttpResponse, Method};
