//! Haptic and assistive-technology feedback seam
//!
//! Both channels are best-effort and fire-and-forget: they never fail and
//! never block, whether or not the platform supports them. Injected rather
//! than global so tests can observe what feedback the controller requests.

/// Vibration patterns keyed by interaction type, as on/off pulse lengths
/// in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPattern {
    /// Short single pulse for item selection
    Select,
    /// Triple short pulse for navigation
    Navigate,
    Success,
    Error,
}

impl HapticPattern {
    pub fn pulses_ms(&self) -> &'static [u64] {
        match self {
            HapticPattern::Select => &[100],
            HapticPattern::Navigate => &[50, 50, 50],
            HapticPattern::Success => &[200, 100, 200],
            HapticPattern::Error => &[300, 100, 300, 100, 300],
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait FeedbackSink: Send + Sync {
    fn haptics_available(&self) -> bool;

    /// Request a vibration. Must never fail if unsupported.
    fn vibrate(&self, pattern: HapticPattern);

    /// Announce text on the assistive-technology channel (screen reader).
    fn announce(&self, text: &str);
}

/// Headless sink: records feedback intent in the log. The terminal frontend
/// has no vibration motor or screen reader to hand the request to.
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn haptics_available(&self) -> bool {
        false
    }

    fn vibrate(&self, pattern: HapticPattern) {
        tracing::debug!(?pattern, pulses = ?pattern.pulses_ms(), "haptic feedback requested");
    }

    fn announce(&self, text: &str) {
        tracing::debug!(text, "screen reader announcement");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_match_the_interaction_vocabulary() {
        assert_eq!(HapticPattern::Select.pulses_ms(), &[100]);
        assert_eq!(HapticPattern::Navigate.pulses_ms(), &[50, 50, 50]);
        assert_eq!(HapticPattern::Error.pulses_ms().len(), 5);
    }

    #[test]
    fn log_sink_never_panics() {
        let sink = LogFeedback;
        assert!(!sink.haptics_available());
        sink.vibrate(HapticPattern::Success);
        sink.announce("hello");
    }
}
