//! Screen-scoped observable state. Each holder publishes one state record
//! through a `watch` channel, runs use cases for user actions and stops its
//! background tasks when dropped.

use std::sync::Arc;
use tokio::sync::watch;

use crate::repository::{AuthRepository, ShowRepository, UserRepository};
use crate::subscription::AbortOnDrop;
use crate::usecase;

mod auth;
mod detail;
mod discover;
mod library;
mod retry;

pub use auth::{AuthState, AuthStateHolder};
pub use detail::{DetailAction, ShowDetailState, ShowDetailStateHolder};
pub use discover::{DiscoverAction, DiscoverState, DiscoverStateHolder};
pub use library::{LibraryAction, LibraryState, LibraryStateHolder};
pub use retry::{FailureNotice, RetryCounter, MAX_RETRY_ATTEMPTS};

/// Repositories shared by the state holders.
#[derive(Clone)]
pub struct Services {
    pub shows: Arc<dyn ShowRepository>,
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<dyn AuthRepository>,
}

/// Sender side of a holder's state, cloneable into its tasks.
pub(crate) type StateTx<S> = Arc<watch::Sender<S>>;

pub(crate) fn state_channel<S: Default>() -> StateTx<S> {
    let (tx, _) = watch::channel(S::default());
    Arc::new(tx)
}

/// Applies the signed-in user id to the state before returning, then keeps
/// `apply`ing later session changes until dropped. `apply` returns whether it
/// changed anything.
pub(crate) fn follow_user_id<S, F>(
    auth: &dyn AuthRepository,
    state: StateTx<S>,
    apply: F,
) -> AbortOnDrop
where
    S: Send + Sync + 'static,
    F: Fn(&mut S, Option<String>) -> bool + Send + 'static,
{
    let mut session = usecase::current_user(auth);
    let id = session.current().map(|u| u.id);
    state.send_if_modified(|s| apply(s, id));
    AbortOnDrop(tokio::spawn(async move {
        while let Some(user) = session.next().await {
            let id = user.map(|u| u.id);
            state.send_if_modified(|s| apply(s, id));
        }
    }))
}
