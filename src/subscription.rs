//! Live values fed by a background task.
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub(crate) struct AbortOnDrop(pub(crate) JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A continuously-updating value. The feeding task (if any) is stopped as
/// soon as the subscription is dropped or [`Subscription::cancel`]led.
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
    feeder: Option<AbortOnDrop>,
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("fed", &self.feeder.is_some())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    /// Subscription over a channel whose sender lives elsewhere.
    pub fn from_receiver(rx: watch::Receiver<T>) -> Self {
        Self { rx, feeder: None }
    }

    /// Subscription owning the task that writes into `rx`'s sender.
    pub fn with_feeder(rx: watch::Receiver<T>, feeder: JoinHandle<()>) -> Self {
        Self {
            rx,
            feeder: Some(AbortOnDrop(feeder)),
        }
    }

    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next published value. `None` once the source is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// A detached receiver; it stays live only while this subscription does.
    pub fn receiver(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.feeder.as_ref().map_or(false, |f| f.0.is_finished())
    }

    pub fn cancel(self) {}

    /// Projects every value through `f`. The returned subscription keeps this
    /// one alive and stops it when dropped.
    pub fn map<U, F>(mut self, f: F) -> Subscription<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + 'static,
    {
        let (tx, rx) = watch::channel(f(self.current()));
        let feeder = tokio::spawn(async move {
            while let Some(value) = self.next().await {
                if tx.send(f(value)).is_err() {
                    break;
                }
            }
        });
        Subscription::with_feeder(rx, feeder)
    }
}
