use tokio::sync::watch;

/// Ctrl-C driven shutdown signal shared across tasks.
///
/// `install` spawns the signal listener; any number of tasks may `wait` on
/// clones of the handle. Triggering is idempotent, and a `wait` that begins
/// after the trigger returns immediately.
#[derive(Clone)]
pub struct ShutdownHandler {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandler {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Install the ctrl-c listener. Must be called from within a runtime.
    pub fn install(self) -> Self {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                return;
            }
            tracing::info!("Ctrl-C received, requesting shutdown");
            let _ = tx.send(true);
        });
        self
    }

    /// Request shutdown programmatically (e.g. from a quit key).
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
