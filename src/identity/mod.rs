use async_trait::async_trait;

use crate::error::CueResult;
use crate::subscription::Subscription;

mod memory;

pub use memory::MemoryIdentity;

/// Account as the identity provider knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Hosted email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> CueResult<AuthUser>;

    /// Creates the account and signs it in.
    async fn create_account(&self, email: &str, password: &str) -> CueResult<AuthUser>;

    async fn update_display_name(&self, uid: &str, display_name: &str) -> CueResult<()>;

    async fn sign_out(&self) -> CueResult<()>;

    async fn send_password_reset(&self, email: &str) -> CueResult<()>;

    /// Signed-in account, updated on every sign-in and sign-out.
    fn current_user(&self) -> Subscription<Option<AuthUser>>;
}
