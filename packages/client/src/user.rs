//! Users and the session sub-protocol.
//!
//! A [`User`] is a record of class `_User`. Logging in or signing up makes
//! the user current and its session token active on the client; the
//! plaintext password never outlives the attempt.

use serde_json::{Map, Value};

use crate::background::{shared, Callback, Shared, TaskHandle};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::persist::Persistable;
use crate::protocol::{keys, paths, ApiRequest, USER_CLASS};
use crate::query::Query;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    record: Record,
}

impl User {
    pub fn new() -> Self {
        Self {
            record: Record::new(USER_CLASS),
        }
    }

    /// Wrap a record that is known to describe a user.
    pub fn from_record(record: Record) -> Self {
        Self { record }
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    /// A query over all users.
    pub fn query() -> Query {
        Query::new(USER_CLASS)
    }

    pub fn username(&self) -> Option<&str> {
        self.record.get_str(keys::USERNAME)
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.record.set_string(keys::USERNAME, username);
    }

    pub fn email(&self) -> Option<&str> {
        self.record.get_str(keys::EMAIL)
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.record.set_string(keys::EMAIL, email);
    }

    /// Held only until the next login or sign-up attempt.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.record.set_string(keys::PASSWORD, password);
    }

    pub fn session_token(&self) -> Option<&str> {
        self.record.get_str(keys::SESSION_TOKEN)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_token().is_some() && !self.record.is_new()
    }

    fn scrub_password(&mut self) {
        self.record.remove(keys::PASSWORD);
    }

    fn require(&self, key: &str) -> Result<()> {
        match self.record.get_str(key) {
            Some(value) if !value.is_empty() => Ok(()),
            _ => Err(Error::missing_field(key)),
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

impl Persistable for User {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl Client {
    /// Log in with a username and password.
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let mut user = User::new();
        user.set_username(username);
        user.set_password(password);
        self.log_in(&mut user)?;
        Ok(user)
    }

    /// Log in with the credentials stored on `user`, merging the reply into it.
    pub fn log_in(&self, user: &mut User) -> Result<()> {
        let result = self.log_in_inner(user);
        user.scrub_password();
        result
    }

    fn log_in_inner(&self, user: &mut User) -> Result<()> {
        user.require(keys::USERNAME)?;
        user.require(keys::PASSWORD)?;

        let mut request = ApiRequest::get(paths::LOGIN)
            .anonymous()
            .revocable_session(self.config().revocable_sessions);
        for key in [keys::USERNAME, keys::PASSWORD] {
            if let Some(value) = user.record.get_str(key) {
                request = request.param(key, value);
            }
        }

        let response = self.execute(request)?;
        user.scrub_password();
        user.record.merge_json(&response);
        self.capture_session(user);
        Ok(())
    }

    /// Create `user` on the server and make it current.
    pub fn sign_up(&self, user: &mut User) -> Result<()> {
        let result = self.sign_up_inner(user);
        user.scrub_password();
        result
    }

    fn sign_up_inner(&self, user: &mut User) -> Result<()> {
        user.require(keys::USERNAME)?;
        user.require(keys::PASSWORD)?;

        let request = ApiRequest::post(paths::USERS)
            .anonymous()
            .revocable_session(self.config().revocable_sessions)
            .body(user.record.to_json());

        let response = self.execute(request)?;
        user.scrub_password();
        user.record.merge_json(&response);
        self.capture_session(user);
        Ok(())
    }

    /// Exchange a session token for its user, who becomes current.
    pub fn validate(&self, session_token: &str) -> Result<User> {
        if session_token.is_empty() {
            return Err(Error::missing_field(keys::SESSION_TOKEN));
        }

        let response = self.execute(ApiRequest::get(paths::USERS_ME).session_token(session_token))?;
        let mut user = User::new();
        user.record.merge_json(&response);
        if user.session_token().is_none() {
            user.record.set_string(keys::SESSION_TOKEN, session_token);
        }
        self.capture_session(&user);
        Ok(user)
    }

    /// Ask the server to email a password reset link.
    pub fn request_password_reset(&self, email: &str) -> Result<()> {
        if email.is_empty() {
            return Err(Error::missing_field(keys::EMAIL));
        }
        let mut body = Map::new();
        body.insert(keys::EMAIL.to_string(), Value::from(email));
        self.execute(ApiRequest::post(paths::REQUEST_PASSWORD_RESET).body(Value::Object(body)))?;
        Ok(())
    }

    fn capture_session(&self, user: &User) {
        if let Some(token) = user.session_token() {
            log::debug!("session started for {:?}", user.username());
            self.session().begin(token.to_string(), user.clone());
        }
    }

    pub fn login_in_background(
        &self,
        username: &str,
        password: &str,
        callback: Option<Callback<User>>,
    ) -> TaskHandle {
        let mut user = User::new();
        user.set_username(username);
        user.set_password(password);
        let client = self.clone();
        self.runner()
            .run(shared(user), move |u: &mut User| client.log_in(u), callback)
    }

    pub fn sign_up_in_background(
        &self,
        user: Shared<User>,
        callback: Option<Callback<User>>,
    ) -> TaskHandle {
        let client = self.clone();
        self.runner()
            .run(user, move |u: &mut User| client.sign_up(u), callback)
    }

    /// The callback receives a user holding only the email address.
    pub fn request_password_reset_in_background(
        &self,
        email: &str,
        callback: Option<Callback<User>>,
    ) -> TaskHandle {
        let mut user = User::new();
        user.set_email(email);
        let client = self.clone();
        self.runner().run(
            shared(user),
            move |u: &mut User| client.request_password_reset(u.email().unwrap_or_default()),
            callback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::{lock, TaskState};
    use crate::config::ClientConfig;
    use crate::protocol::headers;
    use docsync_http::executor::mock::MockExecutor;
    use docsync_http::Method;
    use serde_json::json;

    fn client(executor: &MockExecutor, revocable: bool) -> Client {
        Client::with_executor(
            ClientConfig::new("app", "key")
                .with_server_url("https://api.example.com")
                .with_revocable_sessions(revocable),
            executor.clone(),
        )
        .unwrap()
    }

    fn login_ok() -> MockExecutor {
        MockExecutor::new().with_response(
            Method::GET,
            "/1/login",
            MockExecutor::json_response(json!({
                "objectId": "u1",
                "username": "cooldude6",
                "createdAt": "2015-01-01T00:00:00Z",
                "sessionToken": "r:pnktnjyb996sj4p156gjtp4im"
            })),
        )
    }

    #[test]
    fn login_sends_credentials_as_params() {
        let executor = login_ok();
        let client = client(&executor, true);

        let user = client.login("cooldude6", "p_n7!-e8").unwrap();

        let request = executor.last_request().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query_param("username"), Some("cooldude6"));
        assert_eq!(request.query_param("password"), Some("p_n7!-e8"));
        assert_eq!(request.body, None);
        assert_eq!(request.header(headers::REVOCABLE_SESSION), Some("1"));

        assert_eq!(user.record().object_id(), Some("u1"));
        assert!(user.is_authenticated());
        assert!(!user.record().contains_key("password"));
    }

    #[test]
    fn login_makes_user_current() {
        let executor = login_ok();
        let client = client(&executor, false);

        let user = client.login("cooldude6", "pw").unwrap();

        assert_eq!(
            client.session_token().as_deref(),
            Some("r:pnktnjyb996sj4p156gjtp4im")
        );
        assert_eq!(client.current_user(), Some(user));
        assert_eq!(
            executor.last_request().unwrap().header(headers::REVOCABLE_SESSION),
            None
        );
    }

    #[test]
    fn failed_login_scrubs_password_and_keeps_session() {
        let executor = MockExecutor::new().with_default_response(MockExecutor::error_response(
            404,
            101,
            "invalid login parameters",
        ));
        let client = client(&executor, false);

        let mut user = User::new();
        user.set_username("cooldude6");
        user.set_password("wrong");
        let err = client.log_in(&mut user).unwrap_err();

        assert_eq!(err.code(), Some(101));
        assert!(!user.record().contains_key("password"));
        assert!(user.record().is_new());
        assert!(client.session_token().is_none());
        assert!(client.current_user().is_none());
    }

    #[test]
    fn login_requires_credentials() {
        let executor = MockExecutor::new();
        let client = client(&executor, false);

        let err = client.login("", "pw").unwrap_err();
        assert!(err.is_precondition());

        let mut user = User::new();
        user.set_password("secret");
        assert!(client.log_in(&mut user).is_err());
        assert!(!user.record().contains_key("password"));
        assert!(executor.recorded_requests().is_empty());
    }

    #[test]
    fn sign_up_posts_attributes_and_captures_token() {
        let executor = MockExecutor::new().with_response(
            Method::POST,
            "/1/users",
            MockExecutor::created_response(json!({
                "objectId": "g7y9tkhB7O",
                "createdAt": "2015-01-01T00:00:00Z",
                "sessionToken": "r:new"
            })),
        );
        let client = client(&executor, false);

        let mut user = User::new();
        user.set_username("cooldude6");
        user.set_password("p_n7!-e8");
        user.set_email("cool@example.com");
        client.sign_up(&mut user).unwrap();

        let request = executor.last_request().unwrap();
        assert_eq!(
            request.body,
            Some(json!({
                "username": "cooldude6",
                "password": "p_n7!-e8",
                "email": "cool@example.com"
            }))
        );
        assert_eq!(user.record().object_id(), Some("g7y9tkhB7O"));
        assert_eq!(user.session_token(), Some("r:new"));
        assert!(!user.record().contains_key("password"));
        assert_eq!(client.session_token().as_deref(), Some("r:new"));
    }

    #[test]
    fn failed_sign_up_scrubs_password() {
        let executor = MockExecutor::new().with_default_response(MockExecutor::error_response(
            400,
            202,
            "username cooldude6 already taken",
        ));
        let client = client(&executor, false);

        let mut user = User::new();
        user.set_username("cooldude6");
        user.set_password("pw");
        let err = client.sign_up(&mut user).unwrap_err();

        assert_eq!(err.code(), Some(202));
        assert!(!user.record().contains_key("password"));
        assert!(user.record().is_new());
    }

    #[test]
    fn second_login_replaces_current_user() {
        let executor = MockExecutor::new()
            .with_response(
                Method::GET,
                "/1/login",
                MockExecutor::json_response(json!({"objectId": "a", "username": "a", "sessionToken": "r:a"})),
            )
            .with_response(
                Method::GET,
                "/1/login",
                MockExecutor::json_response(json!({"objectId": "b", "username": "b", "sessionToken": "r:b"})),
            );
        let client = client(&executor, false);

        client.login("a", "pw").unwrap();
        client.login("b", "pw").unwrap();

        assert_eq!(client.session_token().as_deref(), Some("r:b"));
        assert_eq!(client.current_user().unwrap().username(), Some("b"));
    }

    #[test]
    fn login_and_sign_up_ignore_previous_session() {
        let executor = MockExecutor::new()
            .with_response(
                Method::GET,
                "/1/login",
                MockExecutor::json_response(json!({"objectId": "a", "sessionToken": "r:new"})),
            )
            .with_response(
                Method::POST,
                "/1/users",
                MockExecutor::created_response(json!({"objectId": "b", "sessionToken": "r:other"})),
            );
        let client = client(&executor, false);
        client.session().set_session_token(Some("r:revoked".to_string()));

        client.login("ann", "pw").unwrap();
        assert_eq!(
            executor.last_request().unwrap().header(headers::SESSION_TOKEN),
            None
        );

        let mut user = User::new();
        user.set_username("bob");
        user.set_password("pw");
        client.sign_up(&mut user).unwrap();
        assert_eq!(
            executor.last_request().unwrap().header(headers::SESSION_TOKEN),
            None
        );
        assert_eq!(client.session_token().as_deref(), Some("r:other"));
    }

    #[test]
    fn validate_uses_token_header() {
        let executor = MockExecutor::new().with_response(
            Method::GET,
            "/1/users/me",
            MockExecutor::json_response(json!({"objectId": "u1", "username": "ann"})),
        );
        let client = client(&executor, false);

        let user = client.validate("r:given").unwrap();

        assert_eq!(
            executor.last_request().unwrap().header(headers::SESSION_TOKEN),
            Some("r:given")
        );
        assert_eq!(user.username(), Some("ann"));
        assert_eq!(user.session_token(), Some("r:given"));
        assert_eq!(client.session_token().as_deref(), Some("r:given"));
        assert!(client.validate("").unwrap_err().is_precondition());
    }

    #[test]
    fn password_reset_posts_email() {
        let executor = MockExecutor::new().with_response(
            Method::POST,
            "/1/requestPasswordReset",
            MockExecutor::json_response(json!({})),
        );
        let client = client(&executor, false);

        client.request_password_reset("ann@example.com").unwrap();
        assert_eq!(
            executor.last_request().unwrap().body,
            Some(json!({"email": "ann@example.com"}))
        );
        assert!(client.request_password_reset("").unwrap_err().is_precondition());
    }

    #[test]
    fn logout_clears_session() {
        let executor = login_ok();
        let client = client(&executor, false);
        client.login("cooldude6", "pw").unwrap();

        client.logout();
        assert!(client.session_token().is_none());
        assert!(client.current_user().is_none());
    }

    #[test]
    fn login_in_background_delivers_user() {
        let executor = login_ok();
        let client = client(&executor, false);
        let (tx, rx) = std::sync::mpsc::channel();

        let handle = client.login_in_background(
            "cooldude6",
            "pw",
            Some(Box::new(move |user: Shared<User>, result: Result<()>| {
                let user = lock(&user).clone();
                tx.send((result.is_ok(), user)).unwrap();
            })),
        );

        assert_eq!(handle.join(), TaskState::Completed);
        let (ok, user) = rx.recv().unwrap();
        assert!(ok);
        assert_eq!(user.record().object_id(), Some("u1"));
        assert!(!user.record().contains_key("password"));
        assert!(client.current_user().is_some());
    }

    #[test]
    fn sign_up_in_background_without_callback() {
        let executor = MockExecutor::new().with_default_response(MockExecutor::error_response(
            400, 202, "taken",
        ));
        let client = client(&executor, false);

        let mut user = User::new();
        user.set_username("a");
        user.set_password("pw");
        let target = shared(user);

        let handle = client.sign_up_in_background(std::sync::Arc::clone(&target), None);
        assert!(matches!(handle.join(), TaskState::Failed(_)));
        assert!(!lock(&target).record().contains_key("password"));
    }

    #[test]
    fn password_reset_in_background() {
        let executor = MockExecutor::new().with_default_response(MockExecutor::json_response(json!({})));
        let client = client(&executor, false);

        let handle = client.request_password_reset_in_background("ann@example.com", None);
        assert_eq!(handle.join(), TaskState::Completed);
        assert_eq!(
            executor.last_request().unwrap().url,
            "https://api.example.com/1/requestPasswordReset"
        );
    }

    #[test]
    fn user_queries_target_users_path() {
        assert_eq!(User::query().path(), "users");
    }
}
