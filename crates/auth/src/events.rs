//! Session event bus
//!
//! Process-wide registry of listeners notified exactly when the session is
//! irrecoverably lost. The UI layer subscribes here to navigate back to the
//! login screen; this crate only fires the event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Registry of session-expired listeners.
///
/// Cloning shares the same registry, so a single bus can be handed to the
/// token manager and every subscriber.
#[derive(Clone, Default)]
pub struct SessionEvents {
    inner: Arc<Mutex<ListenerTable>>,
}

impl SessionEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners run synchronously, in subscription
    /// order, each time the session expires.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SessionSubscription {
        let mut table = self.inner.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.listeners.push((id, Arc::new(listener)));

        SessionSubscription { id, table: Arc::downgrade(&self.inner) }
    }

    /// Notify every currently subscribed listener that the session is lost.
    ///
    /// A panicking listener is isolated; the remaining listeners still run.
    pub fn notify_expired(&self) {
        // Snapshot outside the lock so listeners may subscribe/unsubscribe
        // from within their callback.
        let listeners: Vec<Listener> =
            self.inner.lock().listeners.iter().map(|(_, l)| Arc::clone(l)).collect();

        debug!(count = listeners.len(), "Notifying session-expired listeners");

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                error!("Session-expired listener panicked");
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

/// Handle returned by [`SessionEvents::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`unsubscribe`] explicitly.
/// Unsubscribing twice is a no-op.
///
/// [`unsubscribe`]: SessionSubscription::unsubscribe
pub struct SessionSubscription {
    id: u64,
    table: Weak<Mutex<ListenerTable>>,
}

impl SessionSubscription {
    /// Remove exactly this listener from the bus. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(table) = self.table.upgrade() {
            table.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
