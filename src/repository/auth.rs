use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use super::{from_document, to_fields, today};
use crate::error::CueResult;
use crate::identity::{AuthUser, IdentityProvider};
use crate::models::{UserPreferences, UserProfile};
use crate::store::{DocumentStore, USERS};
use crate::subscription::Subscription;

#[async_trait]
pub trait AuthRepository: Send + Sync {
    fn current_user(&self) -> Subscription<Option<UserProfile>>;
    async fn sign_in(&self, email: &str, password: &str) -> CueResult<UserProfile>;
    async fn sign_up(&self, email: &str, password: &str, display_name: &str)
        -> CueResult<UserProfile>;
    async fn sign_out(&self) -> CueResult<()>;
    async fn reset_password(&self, email: &str) -> CueResult<()>;
}

pub struct IdentityAuthRepository {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
}

impl IdentityAuthRepository {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }

    async fn stored_profile(&self, uid: &str) -> CueResult<Option<UserProfile>> {
        let Some(doc) = self.store.get(USERS, uid).await? else {
            return Ok(None);
        };
        let mut profile: UserProfile = from_document(&doc)?;
        profile.id = doc.id;
        Ok(Some(profile))
    }
}

/// Profile derived from the identity account alone.
fn profile_of(user: &AuthUser, joined: NaiveDate) -> UserProfile {
    UserProfile {
        id: user.uid.clone(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        profile_picture_url: user.photo_url.clone(),
        join_date: joined,
        preferences: UserPreferences::default(),
    }
}

/// `display_name` when it has content, otherwise the part of `email` before `@`.
pub(crate) fn display_name_for(email: &str, display_name: &str) -> String {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl AuthRepository for IdentityAuthRepository {
    fn current_user(&self) -> Subscription<Option<UserProfile>> {
        self.identity
            .current_user()
            .map(|user| user.as_ref().map(|u| profile_of(u, today())))
    }

    async fn sign_in(&self, email: &str, password: &str) -> CueResult<UserProfile> {
        let user = self.identity.sign_in(email, password).await?;
        match self.stored_profile(&user.uid).await? {
            Some(profile) => Ok(profile),
            None => Ok(profile_of(&user, today())),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> CueResult<UserProfile> {
        let user = self.identity.create_account(email, password).await?;
        let name = display_name_for(&user.email, display_name);
        self.identity.update_display_name(&user.uid, &name).await?;

        let profile = UserProfile {
            display_name: Some(name),
            ..profile_of(&user, today())
        };
        self.store
            .set(USERS, &profile.id, to_fields(&profile)?)
            .await?;
        info!(uid = %profile.id, "profile created");
        Ok(profile)
    }

    async fn sign_out(&self) -> CueResult<()> {
        self.identity.sign_out().await
    }

    async fn reset_password(&self, email: &str) -> CueResult<()> {
        self.identity.send_password_reset(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentity;
    use crate::store::MemoryStore;

    fn repo() -> (MemoryStore, IdentityAuthRepository) {
        let store = MemoryStore::new();
        let repo = IdentityAuthRepository::new(
            Arc::new(MemoryIdentity::new()),
            Arc::new(store.clone()),
        );
        (store, repo)
    }

    #[test]
    fn blank_display_names_fall_back_to_the_mailbox() {
        assert_eq!(display_name_for("a@b.com", ""), "a");
        assert_eq!(display_name_for("a@b.com", "   "), "a");
        assert_eq!(display_name_for("a@b.com", " Ann "), "Ann");
    }

    #[tokio::test]
    async fn sign_up_stores_the_profile() {
        let (store, repo) = repo();
        let profile = repo.sign_up("a@b.com", "x", "").await.unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("a"));

        let doc = store.get(USERS, &profile.id).await.unwrap().unwrap();
        assert_eq!(doc.fields["displayName"], "a");
        assert_eq!(doc.fields["email"], "a@b.com");
    }

    #[tokio::test]
    async fn sign_in_prefers_the_stored_profile() {
        let (_, repo) = repo();
        let created = repo.sign_up("a@b.com", "x", "Ann").await.unwrap();
        repo.sign_out().await.unwrap();

        let profile = repo.sign_in("a@b.com", "x").await.unwrap();
        assert_eq!(profile, created);
    }

    #[tokio::test]
    async fn current_user_tracks_the_session() {
        let (_, repo) = repo();
        let mut current = repo.current_user();
        assert_eq!(current.current(), None);

        repo.sign_up("a@b.com", "x", "").await.unwrap();
        let signed_in = loop {
            match current.next().await.unwrap() {
                Some(p) if p.display_name.is_some() => break p,
                _ => continue,
            }
        };
        assert_eq!(signed_in.email, "a@b.com");

        repo.sign_out().await.unwrap();
        assert_eq!(current.next().await.unwrap(), None);
    }
}
