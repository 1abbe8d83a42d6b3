use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::warn;

use crate::language::CatalogEvent;
use crate::recognition::GatewayEvent;

/// Completion of a background task, delivered back to the owning session.
#[derive(Debug)]
pub enum SessionEvent {
    Gateway(GatewayEvent),
    Catalog(CatalogEvent),
}

impl From<GatewayEvent> for SessionEvent {
    fn from(event: GatewayEvent) -> Self {
        Self::Gateway(event)
    }
}

impl From<CatalogEvent> for SessionEvent {
    fn from(event: CatalogEvent) -> Self {
        Self::Catalog(event)
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Runs background tasks on the runtime the session was created under.
///
/// Without a runtime nothing is spawned and callers treat the work as unavailable.
#[derive(Debug, Clone)]
pub struct TaskSpawner {
    runtime: Option<Handle>,
}

impl TaskSpawner {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime: Some(runtime),
        }
    }

    /// Uses the runtime of the calling context, if there is one.
    pub fn current() -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            warn!("no tokio runtime in context; background work is disabled");
        }
        Self { runtime }
    }

    pub fn is_available(&self) -> bool {
        self.runtime.is_some()
    }

    /// Returns `false` when there is no runtime to run `task` on.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(task);
                true
            }
            None => false,
        }
    }
}
