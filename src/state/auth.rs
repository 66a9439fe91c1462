use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{state_channel, FailureNotice, StateTx};
use crate::error::CueError;
use crate::models::UserProfile;
use crate::repository::AuthRepository;
use crate::subscription::AbortOnDrop;
use crate::usecase;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub is_loading: bool,
    pub current_user: Option<UserProfile>,
    pub error: Option<FailureNotice>,
    pub sign_up_mode: bool,
    pub reset_email_sent: bool,
}

/// Sign-in screen state. Credentials are never kept, so failures here are
/// not offered for retry.
pub struct AuthStateHolder {
    auth: Arc<dyn AuthRepository>,
    state: StateTx<AuthState>,
    _session: AbortOnDrop,
}

/// Replaces the signed-in profile only when a different account (or none)
/// is reported, keeping the richer stored profile for the same account.
fn follow_session(state: &StateTx<AuthState>, user: Option<UserProfile>) {
    state.send_if_modified(|s| {
        let same = s.current_user.as_ref().map(|u| &u.id) == user.as_ref().map(|u| &u.id);
        if same {
            return false;
        }
        s.current_user = user;
        true
    });
}

impl AuthStateHolder {
    /// Must be called inside a Tokio runtime.
    pub fn new(auth: Arc<dyn AuthRepository>) -> Self {
        let state = state_channel();
        let mut session = usecase::current_user(auth.as_ref());
        follow_session(&state, session.current());
        let tx = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Some(user) = session.next().await {
                follow_session(&tx, user);
            }
        });
        Self {
            auth,
            state,
            _session: AbortOnDrop(task),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn fail(&self, context: &str, error: &CueError) {
        warn!(error = %error, context, "auth action failed");
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.error = Some(FailureNotice::terminal(context, error));
        });
    }

    fn signed_in(&self, profile: UserProfile) {
        info!(uid = %profile.id, "session started");
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.current_user = Some(profile);
        });
    }

    pub async fn sign_in(&self, email: &str, password: &str) {
        self.begin();
        match usecase::sign_in(self.auth.as_ref(), email, password).await {
            Ok(profile) => self.signed_in(profile),
            Err(e) => self.fail("Sign in failed", &e),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) {
        self.begin();
        match usecase::sign_up(self.auth.as_ref(), email, password, display_name).await {
            Ok(profile) => self.signed_in(profile),
            Err(e) => self.fail("Sign up failed", &e),
        }
    }

    pub async fn sign_out(&self) {
        self.begin();
        match usecase::sign_out(self.auth.as_ref()).await {
            Ok(()) => self.state.send_modify(|s| {
                s.is_loading = false;
                s.current_user = None;
            }),
            Err(e) => self.fail("Sign out failed", &e),
        }
    }

    pub async fn reset_password(&self, email: &str) {
        self.begin();
        match usecase::reset_password(self.auth.as_ref(), email).await {
            Ok(()) => self.state.send_modify(|s| {
                s.is_loading = false;
                s.reset_email_sent = true;
            }),
            Err(e) => self.fail("Password reset failed", &e),
        }
    }

    pub fn toggle_sign_up_mode(&self) {
        self.state.send_modify(|s| {
            s.sign_up_mode = !s.sign_up_mode;
            s.error = None;
        });
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}
