//! The entry point: configuration, transport, session and task runner.

use std::sync::Arc;

use docsync_http::{HttpExecutor, ReqwestExecutor};
use serde_json::Value;

use crate::background::{Callback, Shared, TaskHandle, TaskRunner};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::persist::Persistable;
use crate::protocol::{self, ApiRequest};
use crate::query::Query;
use crate::session::SessionContext;
use crate::user::User;

struct ClientInner {
    config: ClientConfig,
    executor: Box<dyn HttpExecutor>,
    session: Arc<SessionContext>,
    runner: TaskRunner,
}

/// A connection to one application on a document-store server.
///
/// Cloning is cheap; clones share the transport, the session and the
/// background runner. Every blocking call holds the caller's thread for one
/// network round trip and never retries.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// A client speaking HTTP through reqwest.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let executor = ReqwestExecutor::new(config.timeout)?;
        Self::with_executor(config, executor)
    }

    /// A client over a custom transport.
    pub fn with_executor(config: ClientConfig, executor: impl HttpExecutor + 'static) -> Result<Self> {
        Self::with_session(config, executor, Arc::new(SessionContext::new()))
    }

    /// A client sharing an existing session with other clients.
    pub fn with_session(
        config: ClientConfig,
        executor: impl HttpExecutor + 'static,
        session: Arc<SessionContext>,
    ) -> Result<Self> {
        config.validate()?;
        let runner = match config.background_workers {
            Some(workers) => TaskRunner::with_workers(workers),
            None => TaskRunner::thread_per_task(),
        };
        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                executor: Box::new(executor),
                session,
                runner,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.inner.session
    }

    pub fn session_token(&self) -> Option<String> {
        self.inner.session.session_token()
    }

    /// Snapshot of the logged-in user; see [`SessionContext::current_user`].
    pub fn current_user(&self) -> Option<User> {
        self.inner.session.current_user()
    }

    /// Forget the active session locally.
    pub fn logout(&self) {
        self.inner.session.clear();
    }

    pub(crate) fn runner(&self) -> &TaskRunner {
        &self.inner.runner
    }

    /// Send a request and interpret the reply.
    pub fn execute(&self, request: ApiRequest) -> Result<Value> {
        let session_token = self.inner.session.session_token();
        let http_request = request.into_http(&self.inner.config, session_token.as_deref())?;
        log::debug!("{} {}", http_request.method, http_request.url);
        let response = self.inner.executor.execute(&http_request)?;
        protocol::parse_response(&response)
    }

    /// Create the record (`POST`) or write it back (`PUT`), then merge the reply.
    pub fn save<T: Persistable + ?Sized>(&self, target: &mut T) -> Result<()> {
        let record = target.record_mut();
        let request = match record.object_path() {
            Some(path) => ApiRequest::put(path),
            None => ApiRequest::post(record.class_path()),
        }
        .body(record.to_json());

        let response = self.execute(request)?;
        record.merge_json(&response);
        Ok(())
    }

    /// Reload the record, expanding every attribute that holds a pointer.
    pub fn fetch<T: Persistable + ?Sized>(&self, target: &mut T) -> Result<()> {
        let record = target.record_mut();
        let path = record.object_path().ok_or(Error::MissingObjectId)?;

        let mut request = ApiRequest::get(path);
        let include = record.pointer_keys().join(",");
        if !include.is_empty() {
            request = request.param("include", include);
        }

        let response = self.execute(request)?;
        record.merge_json(&response);
        Ok(())
    }

    /// Reload the record without expanding pointers.
    pub fn refresh<T: Persistable + ?Sized>(&self, target: &mut T) -> Result<()> {
        let record = target.record_mut();
        let path = record.object_path().ok_or(Error::MissingObjectId)?;
        let response = self.execute(ApiRequest::get(path))?;
        record.merge_json(&response);
        Ok(())
    }

    /// Delete the remote document. Local attributes are left as they were.
    pub fn delete<T: Persistable + ?Sized>(&self, target: &mut T) -> Result<()> {
        let path = target
            .record()
            .object_path()
            .ok_or(Error::MissingObjectId)?;
        self.execute(ApiRequest::delete(path))?;
        Ok(())
    }

    /// Write only `partial` and merge the reply.
    pub fn update<T: Persistable + ?Sized>(&self, target: &mut T, partial: &Value) -> Result<()> {
        let record = target.record_mut();
        let path = record.object_path().ok_or(Error::MissingObjectId)?;
        let response = self.execute(ApiRequest::put(path).body(partial.clone()))?;
        record.merge_json(&response);
        Ok(())
    }

    /// Run the query, replacing any earlier results.
    pub fn find(&self, query: &mut Query) -> Result<()> {
        let response = self.execute(query.to_request())?;
        query.apply_response(&response)
    }

    pub fn save_in_background<T: Persistable + 'static>(
        &self,
        target: Shared<T>,
        callback: Option<Callback<T>>,
    ) -> TaskHandle {
        let client = self.clone();
        self.runner()
            .run(target, move |t: &mut T| client.save(t), callback)
    }

    pub fn fetch_in_background<T: Persistable + 'static>(
        &self,
        target: Shared<T>,
        callback: Option<Callback<T>>,
    ) -> TaskHandle {
        let client = self.clone();
        self.runner()
            .run(target, move |t: &mut T| client.fetch(t), callback)
    }

    pub fn refresh_in_background<T: Persistable + 'static>(
        &self,
        target: Shared<T>,
        callback: Option<Callback<T>>,
    ) -> TaskHandle {
        let client = self.clone();
        self.runner()
            .run(target, move |t: &mut T| client.refresh(t), callback)
    }

    /// Background [`Client::update`]; `partial` is moved into the task.
    pub fn update_in_background<T: Persistable + 'static>(
        &self,
        target: Shared<T>,
        partial: Value,
        callback: Option<Callback<T>>,
    ) -> TaskHandle {
        let client = self.clone();
        self.runner()
            .run(target, move |t: &mut T| client.update(t, &partial), callback)
    }

    pub fn delete_in_background<T: Persistable + 'static>(
        &self,
        target: Shared<T>,
        callback: Option<Callback<T>>,
    ) -> TaskHandle {
        let client = self.clone();
        self.runner()
            .run(target, move |t: &mut T| client.delete(t), callback)
    }
}
