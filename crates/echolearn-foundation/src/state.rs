use crate::error::AppError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Coarse application lifecycle. The interaction layer has its own view
/// state machine; this one only governs startup and teardown ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl Lifecycle {
    fn can_become(self, next: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, next),
            (Starting, Running) | (Starting, Stopping) | (Running, Stopping) | (Stopping, Stopped)
        )
    }
}

/// Tracks the lifecycle phase and notifies subscribers on every change.
pub struct LifecycleTracker {
    phase: Arc<RwLock<Lifecycle>>,
    tx: Sender<Lifecycle>,
    rx: Receiver<Lifecycle>,
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleTracker {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            phase: Arc::new(RwLock::new(Lifecycle::Starting)),
            tx,
            rx,
        }
    }

    pub fn advance(&self, next: Lifecycle) -> Result<(), AppError> {
        let mut phase = self.phase.write();
        if !phase.can_become(next) {
            return Err(AppError::Fatal(format!(
                "invalid lifecycle transition: {:?} -> {:?}",
                *phase, next
            )));
        }
        tracing::info!(from = ?*phase, to = ?next, "lifecycle transition");
        *phase = next;
        let _ = self.tx.send(next);
        Ok(())
    }

    pub fn current(&self) -> Lifecycle {
        *self.phase.read()
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self.current(), Lifecycle::Stopping | Lifecycle::Stopped)
    }

    pub fn subscribe(&self) -> Receiver<Lifecycle> {
        self.rx.clone()
    }
}
