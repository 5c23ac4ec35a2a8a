//! Per-button press/release classification
//!
//! One [`ButtonClassifier`] owns the debounce state machine for one
//! physical button. Two timers drive it: the long-press timer armed on
//! every down edge, and the grace timer armed after the first release to
//! wait for a possible second click. All transitions run under the
//! per-button mutex so a firing timer and an incoming edge cannot race;
//! a timer that fires after being superseded re-checks its sequence
//! number under the lock and backs off.

use crate::registry::ListenerRegistry;
use casita_core::{ButtonEdge, ButtonId, Gesture};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Timing configuration for one classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureConfig {
    /// How long a button must stay held to classify as a long press
    pub long_press_threshold: Duration,
    /// How long after a release to wait for a second click
    pub double_click_window: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_threshold: Duration::from_secs(1),
            double_click_window: Duration::from_millis(500),
        }
    }
}

struct ArmedTimer {
    seq: u64,
    handle: AbortHandle,
}

#[derive(Default)]
struct ClassifierState {
    /// Down edges seen in the current click cycle; reset once per emitted
    /// gesture (or long-press firing)
    click_count: u32,
    /// A Press was seen without its matching Release
    pressed: bool,
    /// Monotonic time of the most recent down edge
    last_down: Option<Instant>,
    long_press: Option<ArmedTimer>,
    grace: Option<ArmedTimer>,
    seq: u64,
}

impl ClassifierState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// State machine turning one button's raw edges into gestures
///
/// Emission happens on the timer task that classified the gesture; the
/// listener is awaited there, so per-button emission order follows edge
/// order. Other buttons classify on their own tasks and are never
/// blocked.
pub struct ButtonClassifier {
    button: ButtonId,
    config: GestureConfig,
    registry: Arc<ListenerRegistry>,
    state: Mutex<ClassifierState>,
}

impl ButtonClassifier {
    pub fn new(button: ButtonId, config: GestureConfig, registry: Arc<ListenerRegistry>) -> Self {
        Self {
            button,
            config,
            registry,
            state: Mutex::new(ClassifierState::default()),
        }
    }

    /// The button this classifier belongs to
    pub fn button(&self) -> &ButtonId {
        &self.button
    }

    /// Feed one raw edge
    ///
    /// Must be called from within a tokio runtime; the classification
    /// timers are spawned onto it. The upstream bridge serializes edges
    /// per button, so no two calls for the same classifier overlap.
    pub fn handle_edge(self: Arc<Self>, edge: ButtonEdge) {
        match edge {
            ButtonEdge::Press => self.on_press(),
            ButtonEdge::Release => self.on_release(),
        }
    }

    fn on_press(self: Arc<Self>) {
        let mut state = self.state.lock().unwrap();
        state.pressed = true;
        state.click_count += 1;
        state.last_down = Some(Instant::now());
        trace!(button = %self.button, clicks = state.click_count, "down edge");

        // A long-press timer can only still be armed here if the matching
        // release was never delivered; supersede it.
        if let Some(timer) = state.long_press.take() {
            timer.handle.abort();
        }

        let seq = state.next_seq();
        let this = Arc::clone(&self);
        let delay = self.config.long_press_threshold;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.long_press_elapsed(seq).await;
        });
        state.long_press = Some(ArmedTimer {
            seq,
            handle: task.abort_handle(),
        });

        // An armed grace timer (this press may be the second click of a
        // double click) stays armed; it reads click_count when it fires.
    }

    fn on_release(self: Arc<Self>) {
        let mut state = self.state.lock().unwrap();
        if !state.pressed {
            // No matching Press was seen; ignore without touching state.
            trace!(button = %self.button, "orphan release ignored");
            return;
        }
        state.pressed = false;
        trace!(button = %self.button, clicks = state.click_count, "up edge");

        if state.click_count == 1 {
            let seq = state.next_seq();
            let this = Arc::clone(&self);
            let delay = self.config.double_click_window;
            let task = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                this.grace_elapsed(seq).await;
            });
            state.grace = Some(ArmedTimer {
                seq,
                handle: task.abort_handle(),
            });
        }

        // A release before the threshold means "not a long press".
        if let Some(timer) = state.long_press.take() {
            timer.handle.abort();
        }
    }

    async fn long_press_elapsed(self: Arc<Self>, seq: u64) {
        let emit = {
            let mut state = self.state.lock().unwrap();
            if state.long_press.as_ref().map(|t| t.seq) != Some(seq) {
                // Cancelled between firing and acquiring the lock.
                return;
            }
            state.long_press = None;
            let held = state
                .last_down
                .is_some_and(|down| down.elapsed() >= self.config.long_press_threshold);
            if held {
                // Suppress click classification for this press cycle.
                state.click_count = 0;
            }
            held
        };

        if emit {
            self.registry
                .dispatch(&self.button, Gesture::LongPress)
                .await;
        }
    }

    async fn grace_elapsed(self: Arc<Self>, seq: u64) {
        let gesture = {
            let mut state = self.state.lock().unwrap();
            if state.grace.as_ref().map(|t| t.seq) != Some(seq) {
                return;
            }
            state.grace = None;
            let gesture = match state.click_count {
                1 => Some(Gesture::SingleClick),
                2 => Some(Gesture::DoubleClick),
                n => {
                    if n > 2 {
                        debug!(button = %self.button, clicks = n, "swallowing excess clicks");
                    }
                    None
                }
            };
            state.click_count = 0;
            gesture
        };

        if let Some(gesture) = gesture {
            self.registry.dispatch(&self.button, gesture).await;
        }
    }
}
