use async_trait::async_trait;
use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::info;
use uuid::Uuid;

use super::{AuthUser, IdentityProvider};
use crate::error::{CueError, CueResult};
use crate::subscription::Subscription;

struct Account {
    user: AuthUser,
    salt: String,
    password_digest: String,
}

/// Identity provider kept in process memory. Passwords are stored as salted
/// SHA-256 digests.
#[derive(Clone)]
pub struct MemoryIdentity {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    current: Arc<watch::Sender<Option<AuthUser>>>,
    reset_requests: Arc<Mutex<Vec<String>>>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            current: Arc::new(current),
            reset_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Emails a password reset was requested for, oldest first.
    pub async fn reset_requests(&self) -> Vec<String> {
        self.reset_requests.lock().await.clone()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> CueResult<AuthUser> {
        let key = normalize_email(email);
        let user = {
            let accounts = self.accounts.lock().await;
            let account = accounts
                .get(&key)
                .ok_or_else(|| CueError::Unauthorized("invalid email or password".into()))?;
            let candidate = digest(&account.salt, password);
            if !constant_time_eq(
                candidate.as_bytes(),
                account.password_digest.as_bytes(),
            ) {
                return Err(CueError::Unauthorized("invalid email or password".into()));
            }
            account.user.clone()
        };
        info!(uid = %user.uid, "signed in");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn create_account(&self, email: &str, password: &str) -> CueResult<AuthUser> {
        let key = normalize_email(email);
        if !key.contains('@') {
            return Err(CueError::InvalidInput(format!("malformed email '{email}'")));
        }
        let user = {
            let mut accounts = self.accounts.lock().await;
            if accounts.contains_key(&key) {
                return Err(CueError::InvalidInput(
                    "email address is already in use".into(),
                ));
            }
            let salt = Uuid::new_v4().simple().to_string();
            let user = AuthUser {
                uid: Uuid::new_v4().simple().to_string(),
                email: key.clone(),
                display_name: None,
                photo_url: None,
            };
            accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password_digest: digest(&salt, password),
                    salt,
                },
            );
            user
        };
        info!(uid = %user.uid, "account created");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn update_display_name(&self, uid: &str, display_name: &str) -> CueResult<()> {
        let updated = {
            let mut accounts = self.accounts.lock().await;
            let account = accounts
                .values_mut()
                .find(|a| a.user.uid == uid)
                .ok_or_else(|| CueError::NotFound(format!("account {uid}")))?;
            account.user.display_name = Some(display_name.to_string());
            account.user.clone()
        };
        self.current.send_if_modified(|current| match current {
            Some(user) if user.uid == updated.uid => {
                *user = updated;
                true
            }
            _ => false,
        });
        Ok(())
    }

    async fn sign_out(&self) -> CueResult<()> {
        self.current.send_replace(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> CueResult<()> {
        let key = normalize_email(email);
        if !self.accounts.lock().await.contains_key(&key) {
            return Err(CueError::NotFound(format!("no account for {email}")));
        }
        self.reset_requests.lock().await.push(key);
        Ok(())
    }

    fn current_user(&self) -> Subscription<Option<AuthUser>> {
        Subscription::from_receiver(self.current.subscribe())
    }
}
