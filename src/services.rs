//! Injected platform services
//!
//! The game core never reaches for ambient globals; persistence and
//! haptic feedback are constructor-injected so tests and the native
//! build run with no-ops. Both services are best-effort: failures are
//! swallowed and must never surface into gameplay.

/// Haptic impact strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Haptic notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Warning,
    Error,
}

/// Single-value high-score persistence
pub trait ScoreStore {
    /// Load the stored high score; `None` when absent or unreadable
    fn load(&self) -> Option<u64>;
    /// Persist a new high score; best-effort
    fn save(&mut self, score: u64);
}

/// Fire-and-forget haptic feedback channel
pub trait Feedback {
    fn impact(&self, style: ImpactStyle);
    fn notification(&self, kind: NotifyKind);
    fn selection(&self);
}

/// Store that remembers nothing
pub struct NoopScores;

impl ScoreStore for NoopScores {
    fn load(&self) -> Option<u64> {
        None
    }

    fn save(&mut self, _score: u64) {}
}

/// Feedback that goes nowhere
pub struct NoopFeedback;

impl Feedback for NoopFeedback {
    fn impact(&self, _style: ImpactStyle) {}
    fn notification(&self, _kind: NotifyKind) {}
    fn selection(&self) {}
}

/// The bundle handed to the game at construction
pub struct Services {
    pub scores: Box<dyn ScoreStore>,
    pub feedback: Box<dyn Feedback>,
}

impl Services {
    /// All-stub services for tests and headless runs
    pub fn noop() -> Self {
        Self {
            scores: Box::new(NoopScores),
            feedback: Box::new(NoopFeedback),
        }
    }

    /// Browser services: LocalStorage persistence and Vibration-API
    /// haptics
    #[cfg(target_arch = "wasm32")]
    pub fn web() -> Self {
        Self {
            scores: Box::new(web::LocalStorageScores),
            feedback: Box::new(web::VibrationFeedback),
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{Feedback, ImpactStyle, NotifyKind, ScoreStore};

    /// LocalStorage key for the single-integer high score
    const HIGHSCORE_KEY: &str = "blockfall_highscore";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok()).flatten()
    }

    /// High score in LocalStorage as a plain integer string
    pub struct LocalStorageScores;

    impl ScoreStore for LocalStorageScores {
        fn load(&self) -> Option<u64> {
            let raw = storage()?.get_item(HIGHSCORE_KEY).ok()??;
            match raw.parse() {
                Ok(score) => {
                    log::info!("Loaded high score: {}", score);
                    Some(score)
                }
                Err(_) => {
                    log::warn!("Ignoring unparseable high score {:?}", raw);
                    None
                }
            }
        }

        fn save(&mut self, score: u64) {
            let Some(storage) = storage() else {
                log::warn!("LocalStorage unavailable, high score not saved");
                return;
            };
            if storage.set_item(HIGHSCORE_KEY, &score.to_string()).is_ok() {
                log::info!("High score saved: {}", score);
            } else {
                log::warn!("Failed to save high score");
            }
        }
    }

    /// Haptics through the browser Vibration API
    pub struct VibrationFeedback;

    impl VibrationFeedback {
        fn vibrate_ms(duration: u32) {
            if let Some(window) = web_sys::window() {
                let _ = window.navigator().vibrate_with_duration(duration);
            }
        }

        fn vibrate_pattern(pattern: &[u32]) {
            let Some(window) = web_sys::window() else { return };
            let array = js_sys::Array::new();
            for &ms in pattern {
                array.push(&wasm_bindgen::JsValue::from(ms));
            }
            let _ = window.navigator().vibrate_with_pattern(&array);
        }
    }

    impl Feedback for VibrationFeedback {
        fn impact(&self, style: ImpactStyle) {
            let duration = match style {
                ImpactStyle::Light => 10,
                ImpactStyle::Medium => 20,
                ImpactStyle::Heavy => 40,
            };
            Self::vibrate_ms(duration);
        }

        fn notification(&self, kind: NotifyKind) {
            let pattern: &[u32] = match kind {
                NotifyKind::Success => &[20, 50, 20],
                NotifyKind::Warning => &[20, 100, 20, 100, 20],
                NotifyKind::Error => &[50, 50, 50, 50, 50],
            };
            Self::vibrate_pattern(pattern);
        }

        fn selection(&self) {
            Self::vibrate_ms(5);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingFeedback {
        impacts: Rc<Cell<u32>>,
    }

    impl Feedback for CountingFeedback {
        fn impact(&self, _style: ImpactStyle) {
            self.impacts.set(self.impacts.get() + 1);
        }
        fn notification(&self, _kind: NotifyKind) {}
        fn selection(&self) {}
    }

    #[test]
    fn test_services_are_substitutable() {
        let impacts = Rc::new(Cell::new(0));
        let services = Services {
            scores: Box::new(NoopScores),
            feedback: Box::new(CountingFeedback { impacts: impacts.clone() }),
        };
        services.feedback.impact(ImpactStyle::Medium);
        services.feedback.impact(ImpactStyle::Heavy);
        assert_eq!(impacts.get(), 2);
        assert_eq!(services.scores.load(), None);
    }
}
