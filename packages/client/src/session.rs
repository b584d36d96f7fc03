//! The active session: one token and one current user, behind one lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::user::User;

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    current_user: Option<User>,
}

/// Session state shared by every clone of a [`Client`](crate::Client).
///
/// Token and current user are always read and replaced together, so a reader
/// never sees the token of one login paired with the user of another.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: Mutex<SessionState>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Replace the token without touching the current user.
    pub fn set_session_token(&self, token: Option<String>) {
        self.lock().token = token;
    }

    /// A copy of the user taken when the session began. Later saves or
    /// fetches on the caller's own `User` are not reflected here.
    pub fn current_user(&self) -> Option<User> {
        self.lock().current_user.clone()
    }

    /// Make `user` the current user and `token` the active session.
    pub fn begin(&self, token: String, user: User) {
        let mut state = self.lock();
        state.token = Some(token);
        state.current_user = Some(user);
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.token = None;
        state.current_user = None;
    }
}
