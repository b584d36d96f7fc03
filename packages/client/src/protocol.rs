//! Request construction and response interpretation.
//!
//! An [`ApiRequest`] names a resource path relative to the API root plus
//! parameters and an optional body. [`ApiRequest::into_http`] resolves it
//! against a [`ClientConfig`] and attaches the standard headers.
//! [`parse_response`] turns whatever came back into a JSON document or a
//! typed [`Error`].

use docsync_http::{HttpRequest, HttpResponse, Method};
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Reserved JSON keys.
pub mod keys {
    pub const CLASS_NAME: &str = "className";
    pub const OBJECT_ID: &str = "objectId";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const SESSION_TOKEN: &str = "sessionToken";
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const ACL: &str = "ACL";
    pub const PASSWORD: &str = "password";
    pub const NAME: &str = "name";
    pub const RESULTS: &str = "results";
    pub const COUNT: &str = "count";
    pub const OP: &str = "__op";
    pub const TYPE: &str = "__type";
    pub const AMOUNT: &str = "amount";
    pub const ERROR: &str = "error";
    pub const CODE: &str = "code";
}

pub mod headers {
    pub const APPLICATION_ID: &str = "X-Parse-Application-Id";
    pub const REST_API_KEY: &str = "X-Parse-REST-API-Key";
    pub const SESSION_TOKEN: &str = "X-Parse-Session-Token";
    pub const REVOCABLE_SESSION: &str = "X-Parse-Revocable-Session";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const USER_AGENT: &str = "User-Agent";
}

/// Resource paths below the API root.
pub mod paths {
    pub const CLASSES: &str = "classes";
    pub const USERS: &str = "users";
    pub const USERS_ME: &str = "users/me";
    pub const LOGIN: &str = "login";
    pub const REQUEST_PASSWORD_RESET: &str = "requestPasswordReset";
    pub const ROLES: &str = "roles";
    pub const BATCH: &str = "batch";
}

pub const USER_CLASS: &str = "_User";
pub const ROLE_CLASS: &str = "_Role";

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub const USER_AGENT: &str = concat!("docsync-rust/", env!("CARGO_PKG_VERSION"));

/// Collection path for a class: `users` and `roles` for the built-in
/// classes, `classes/<name>` for everything else.
pub fn class_path(class_name: &str) -> String {
    match class_name {
        USER_CLASS => paths::USERS.to_string(),
        ROLE_CLASS => paths::ROLES.to_string(),
        _ => format!("{}/{}", paths::CLASSES, class_name),
    }
}

/// A request against the API, before it is bound to a server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Overrides the session token the client would otherwise send.
    pub session_token: Option<String>,
    pub revocable_session: bool,
    /// Never carry the client's active session token.
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            session_token: None,
            revocable_session: false,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn revocable_session(mut self, enabled: bool) -> Self {
        self.revocable_session = enabled;
        self
    }

    /// Send without the active session, as login and sign-up must.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Resolve against the server and attach the standard headers.
    ///
    /// `session_token` is the client's active token; an explicit token on the
    /// request wins over it. Anonymous requests ignore the active token.
    pub fn into_http(
        self,
        config: &ClientConfig,
        session_token: Option<&str>,
    ) -> Result<HttpRequest> {
        let url = config.resource_url(&self.path)?;
        let mut request = HttpRequest::new(self.method, url)
            .with_header(headers::APPLICATION_ID, config.application_id.as_str())
            .with_header(headers::REST_API_KEY, config.api_key.as_str())
            .with_header(headers::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .with_header(headers::USER_AGENT, USER_AGENT);

        if self.revocable_session {
            request = request.with_header(headers::REVOCABLE_SESSION, "1");
        }

        let fallback = if self.anonymous { None } else { session_token };
        if let Some(token) = self.session_token.as_deref().or(fallback) {
            request = request.with_header(headers::SESSION_TOKEN, token);
        }

        request.query = self.params;
        request.body = self.body;
        Ok(request)
    }
}

/// Interpret a response.
///
/// A body carrying an `error` field is an [`Error::Api`] regardless of
/// status. An empty 2xx body is an empty document. A non-2xx reply without
/// an error document is an [`Error::Http`].
pub fn parse_response(response: &HttpResponse) -> Result<Value> {
    if response.body_text.trim().is_empty() {
        if response.is_success() {
            return Ok(Value::Object(Map::new()));
        }
        return Err(Error::Http {
            status: response.status,
            body: String::new(),
        });
    }

    let body = match response.json() {
        Ok(body) => body,
        Err(_) if !response.is_success() => {
            return Err(Error::Http {
                status: response.status,
                body: response.body_text.clone(),
            })
        }
        Err(e) => return Err(Error::InvalidResponse(e)),
    };

    if let Some(message) = body.get(keys::ERROR) {
        let code = body
            .get(keys::CODE)
            .and_then(Value::as_i64)
            .unwrap_or(i64::from(response.status));
        let message = match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(Error::Api { code, message });
    }

    if !response.is_success() {
        return Err(Error::Http {
            status: response.status,
            body: response.body_text.clone(),
        });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::new("app-id", "rest-key").with_server_url("https://api.example.com")
    }

    #[test]
    fn class_paths() {
        assert_eq!(class_path("GameScore"), "classes/GameScore");
        assert_eq!(class_path(USER_CLASS), "users");
        assert_eq!(class_path(ROLE_CLASS), "roles");
    }

    #[test]
    fn standard_headers_in_order() {
        let request = ApiRequest::get("classes/GameScore")
            .into_http(&config(), None)
            .unwrap();

        let names: Vec<&str> = request.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                headers::APPLICATION_ID,
                headers::REST_API_KEY,
                headers::CONTENT_TYPE,
                headers::USER_AGENT
            ]
        );
        assert_eq!(request.header(headers::APPLICATION_ID), Some("app-id"));
        assert_eq!(request.header(headers::REST_API_KEY), Some("rest-key"));
        assert_eq!(request.header(headers::CONTENT_TYPE), Some("application/json"));
        assert!(request.header(headers::USER_AGENT).unwrap().starts_with("docsync-rust/"));
        assert_eq!(request.url, "https://api.example.com/1/classes/GameScore");
    }

    #[test]
    fn session_and_revocable_headers() {
        let request = ApiRequest::get(paths::LOGIN)
            .revocable_session(true)
            .into_http(&config(), Some("r:active"))
            .unwrap();
        assert_eq!(request.header(headers::REVOCABLE_SESSION), Some("1"));
        assert_eq!(request.header(headers::SESSION_TOKEN), Some("r:active"));

        let request = ApiRequest::get(paths::USERS_ME)
            .session_token("r:explicit")
            .into_http(&config(), Some("r:active"))
            .unwrap();
        assert_eq!(request.header(headers::SESSION_TOKEN), Some("r:explicit"));

        let request = ApiRequest::get(paths::USERS).into_http(&config(), None).unwrap();
        assert_eq!(request.header(headers::SESSION_TOKEN), None);
        assert_eq!(request.header(headers::REVOCABLE_SESSION), None);
    }

    #[test]
    fn anonymous_request_drops_active_token() {
        let request = ApiRequest::get(paths::LOGIN)
            .anonymous()
            .into_http(&config(), Some("r:revoked"))
            .unwrap();
        assert_eq!(request.header(headers::SESSION_TOKEN), None);
        assert_eq!(request.header(headers::APPLICATION_ID), Some("app-id"));
    }

    #[test]
    fn params_and_body_carried_over() {
        let request = ApiRequest::post("classes/A")
            .param("include", "owner")
            .body(json!({"a": 1}))
            .into_http(&config(), None)
            .unwrap();
        assert_eq!(request.query_param("include"), Some("owner"));
        assert_eq!(request.body, Some(json!({"a": 1})));
    }

    #[test]
    fn success_document() {
        let value = parse_response(&HttpResponse::new(201, r#"{"objectId":"x"}"#)).unwrap();
        assert_eq!(value["objectId"], "x");
    }

    #[test]
    fn empty_success_is_empty_document() {
        assert_eq!(parse_response(&HttpResponse::new(200, "")).unwrap(), json!({}));
    }

    #[test]
    fn error_document_becomes_api_error() {
        let err = parse_response(&HttpResponse::new(
            404,
            r#"{"code":101,"error":"object not found"}"#,
        ))
        .unwrap_err();
        match err {
            Error::Api { code, message } => {
                assert_eq!(code, 101);
                assert_eq!(message, "object not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_without_code_uses_status() {
        let err = parse_response(&HttpResponse::new(401, r#"{"error":"unauthorized"}"#)).unwrap_err();
        assert_eq!(err.code(), Some(401));
    }

    #[test]
    fn unparseable_failure_is_http_error() {
        let err = parse_response(&HttpResponse::new(502, "<html>bad gateway</html>")).unwrap_err();
        assert!(matches!(err, Error::Http { status: 502, .. }));
        assert!(err.is_transport());

        let err = parse_response(&HttpResponse::new(500, "")).unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, .. }));
    }

    #[test]
    fn unparseable_success_is_protocol_error() {
        let err = parse_response(&HttpResponse::new(200, "{oops")).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
        assert!(err.is_protocol());
    }
}
