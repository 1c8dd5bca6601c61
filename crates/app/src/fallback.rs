//! Time-boxed visible text surface
//!
//! The fallback channel is independent of audio: whatever the app wants the
//! learner to hear is also shown here, and hides itself after a fixed
//! reading window unless dismissed first. Re-showing replaces the text and
//! restarts the window atomically; a generation counter keeps a superseded
//! timer from ever clearing newer text.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// Reading window before the text hides itself. Long enough to read,
    /// short enough not to obstruct.
    pub auto_hide: Duration,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            auto_hide: Duration::from_secs(8),
        }
    }
}

#[derive(Clone)]
pub struct FallbackPresenter {
    inner: Arc<Inner>,
}

struct Inner {
    config: FallbackConfig,
    state: RwLock<State>,
    generation: AtomicU64,
}

#[derive(Default)]
struct State {
    text: Option<String>,
    timer: Option<JoinHandle<()>>,
}

impl FallbackPresenter {
    pub fn new(config: FallbackConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(State::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Show `text`, replacing anything currently visible and restarting
    /// the auto-hide window.
    pub fn show(&self, text: &str) {
        let inner = Arc::clone(&self.inner);
        let mut state = self.inner.state.write();
        // Allocated under the lock so generation order always matches the
        // order the text was written.
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.text = Some(text.to_string());
        let auto_hide = self.inner.config.auto_hide;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(auto_hide).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let mut state = inner.state.write();
            // Re-check under the lock: a show/dismiss may have won the race.
            if inner.generation.load(Ordering::SeqCst) == generation {
                debug!("fallback text auto-hidden");
                state.text = None;
                state.timer = None;
            }
        }));
    }

    /// Manual close. Always wins over the timer: the pending auto-hide is
    /// cancelled and can no longer fire.
    pub fn dismiss(&self) {
        let mut state = self.inner.state.write();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.text = None;
    }

    pub fn visible(&self) -> bool {
        self.inner.state.read().text.is_some()
    }

    pub fn snapshot(&self) -> (Option<String>, bool) {
        let state = self.inner.state.read();
        (state.text.clone(), state.text.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presenter(auto_hide: Duration) -> FallbackPresenter {
        FallbackPresenter::new(FallbackConfig { auto_hide })
    }

    #[tokio::test(start_paused = true)]
    async fn auto_hides_after_the_configured_window() {
        let fallback = presenter(Duration::from_millis(8000));
        fallback.show("Learning content");
        assert_eq!(
            fallback.snapshot(),
            (Some("Learning content".to_string()), true)
        );

        tokio::time::sleep(Duration::from_millis(7999)).await;
        assert!(fallback.visible(), "must stay up for the full window");

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fallback.snapshot(), (None, false));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_dismissal_cancels_the_timer() {
        let fallback = presenter(Duration::from_millis(8000));
        fallback.show("content");
        fallback.dismiss();
        assert!(!fallback.visible());

        // The aborted timer must not resurrect or clear anything later.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fallback.snapshot(), (None, false));
    }

    #[tokio::test(start_paused = true)]
    async fn reshowing_replaces_text_and_restarts_the_window() {
        let fallback = presenter(Duration::from_millis(8000));
        fallback.show("first");
        tokio::time::sleep(Duration::from_millis(6000)).await;

        fallback.show("second");
        assert_eq!(fallback.snapshot().0.as_deref(), Some("second"));

        // The first timer's expiry passes; the newer text must survive.
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(fallback.snapshot().0.as_deref(), Some("second"));

        tokio::time::sleep(Duration::from_millis(5001)).await;
        assert!(!fallback.visible());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_reshows_keep_only_the_newest_text() {
        let fallback = presenter(Duration::from_millis(8000));
        for i in 0..10 {
            fallback.show(&format!("text {i}"));
        }
        assert_eq!(fallback.snapshot().0.as_deref(), Some("text 9"));

        // Only the newest generation's window applies.
        tokio::time::sleep(Duration::from_millis(7999)).await;
        assert_eq!(fallback.snapshot().0.as_deref(), Some("text 9"));
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!fallback.visible());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_when_hidden_is_a_no_op() {
        let fallback = presenter(Duration::from_millis(8000));
        fallback.dismiss();
        assert_eq!(fallback.snapshot(), (None, false));
    }
}
