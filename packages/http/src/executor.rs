//! HTTP execution abstraction.
//!
//! The client only ever talks to the network through [`HttpExecutor`], so
//! tests can swap in a mock and never touch a socket.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;
use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
///
/// Any status code is a successful execution; only failures to reach the
/// server or read its reply are errors.
pub trait HttpExecutor: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create a new executor with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(Duration::from_secs(30))
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let method: http::Method = request.method.into();

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::try_from(name.as_str())?;
            let header_value = HeaderValue::try_from(value.as_str())?;
            headers.append(header_name, header_value);
        }

        let url = url::Url::parse(&request.url)?;
        let mut req_builder = self.client.request(method, url).headers(headers);

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        log::debug!("{} {}", request.method, request.url);
        let response = req_builder.send()?;

        let status = response.status().as_u16();
        let body_text = response.text()?;

        Ok(HttpResponse { status, body_text })
    }
}

/// Mock HTTP executor for tests.
///
/// Returns predefined responses based on method and URL path.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    type RouteKey = (crate::Method, String);

    /// A mock HTTP executor that returns predefined responses.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Queued responses keyed by method and URL path; the last one repeats.
        responses: Arc<Mutex<HashMap<RouteKey, VecDeque<HttpResponse>>>>,
        default_response: Arc<Mutex<Option<HttpResponse>>>,
        recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
        failure: Arc<Mutex<Option<String>>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a method and URL path such as `/1/classes/Post`.
        ///
        /// Several responses for the same route are returned in order.
        pub fn with_response(
            self,
            method: crate::Method,
            path: impl Into<String>,
            response: HttpResponse,
        ) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry((method, path.into()))
                .or_default()
                .push_back(response);
            self
        }

        /// Set a default response when no route matches.
        pub fn with_default_response(self, response: HttpResponse) -> Self {
            *self.default_response.lock().unwrap() = Some(response);
            self
        }

        /// Configure to fail all requests with a transport error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock().unwrap() = Some(message.into());
            self
        }

        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        /// The most recent request, if any.
        pub fn last_request(&self) -> Option<HttpRequest> {
            self.recorded_requests.lock().unwrap().last().cloned()
        }

        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// A 200 response carrying `body`.
        pub fn json_response(body: serde_json::Value) -> HttpResponse {
            HttpResponse::new(200, body.to_string())
        }

        /// A 201 response carrying `body`.
        pub fn created_response(body: serde_json::Value) -> HttpResponse {
            HttpResponse::new(201, body.to_string())
        }

        /// An error document the way the REST API reports failures.
        pub fn error_response(status: u16, code: i64, message: &str) -> HttpResponse {
            HttpResponse::new(
                status,
                serde_json::json!({"code": code, "error": message}).to_string(),
            )
        }

        pub fn not_found() -> HttpResponse {
            HttpResponse::new(404, "")
        }

        fn route_path(url: &str) -> String {
            url::Url::parse(url)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| url.to_string())
        }
    }

    impl HttpExecutor for MockExecutor {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            if let Some(message) = self.failure.lock().unwrap().clone() {
                return Err(Error::other(message));
            }

            let key = (request.method, Self::route_path(&request.url));
            let mut responses = self.responses.lock().unwrap();
            if let Some(queue) = responses.get_mut(&key) {
                if queue.len() > 1 {
                    if let Some(response) = queue.pop_front() {
                        return Ok(response);
                    }
                }
                if let Some(response) = queue.front() {
                    return Ok(response.clone());
                }
            }

            if let Some(ref response) = *self.default_response.lock().unwrap() {
                return Ok(response.clone());
            }

            Ok(Self::not_found())
        }
    }
}
