use crate::error::{CueError, CueResult};
use crate::models::UserProfile;
use crate::repository::AuthRepository;
use crate::subscription::Subscription;

fn require(field: &str, value: &str) -> CueResult<()> {
    if value.trim().is_empty() {
        return Err(CueError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

pub async fn sign_in(
    auth: &dyn AuthRepository,
    email: &str,
    password: &str,
) -> CueResult<UserProfile> {
    require("email", email)?;
    require("password", password)?;
    auth.sign_in(email.trim(), password).await
}

/// A blank `display_name` becomes the part of the email before `@`.
pub async fn sign_up(
    auth: &dyn AuthRepository,
    email: &str,
    password: &str,
    display_name: &str,
) -> CueResult<UserProfile> {
    require("email", email)?;
    require("password", password)?;
    auth.sign_up(email.trim(), password, display_name).await
}

pub async fn sign_out(auth: &dyn AuthRepository) -> CueResult<()> {
    auth.sign_out().await
}

pub async fn reset_password(auth: &dyn AuthRepository, email: &str) -> CueResult<()> {
    require("email", email)?;
    auth.reset_password(email.trim()).await
}

pub fn current_user(auth: &dyn AuthRepository) -> Subscription<Option<UserProfile>> {
    auth.current_user()
}
