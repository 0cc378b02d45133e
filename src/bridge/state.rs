//! Shared control state
//!
//! The single synchronization point between the device reader and the
//! periodic publisher. All reads and writes go through one mutex; the
//! handle is cloned into both sides instead of living in a global.

use std::sync::{Arc, Mutex};

/// Raw axis range reported by the device.
pub const MIN_AXES_VALUE: f32 = -32768.0;
pub const MAX_AXES_VALUE: f32 = 32767.0;

/// Sentinel for "no button latched yet".
pub const NO_BUTTON: i32 = -1;

/// Map a raw axis value onto [-1.0, 1.0] with the inverted convention:
/// the range minimum reads as +1.0 and the maximum as -1.0.
pub fn normalize_axis(raw: i16) -> f32 {
    let percent = (raw as f32 - MIN_AXES_VALUE) / (MAX_AXES_VALUE - MIN_AXES_VALUE);
    1.0 - 2.0 * percent
}

/// Latest control values as written by the reader.
///
/// `active_button` is sticky: it holds the most recently pressed button
/// index until another press arrives; releases never reset it. `failed`
/// records a fatal device read error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlValues {
    pub left: f32,
    pub right: f32,
    pub active_button: i32,
    pub failed: bool,
}

impl Default for ControlValues {
    fn default() -> Self {
        Self {
            left: 0.0,
            right: 0.0,
            active_button: NO_BUTTON,
            failed: false,
        }
    }
}

/// Cloneable handle to the mutex-guarded control values.
#[derive(Debug, Clone, Default)]
pub struct SharedControlState {
    inner: Arc<Mutex<ControlValues>>,
}

impl SharedControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current values, taken under the lock.
    pub fn snapshot(&self) -> ControlValues {
        *self.inner.lock().unwrap()
    }

    /// Run `apply` as one critical section over the values.
    ///
    /// The reader drains a whole burst of device events inside a single
    /// call, so the publisher can never observe a half-applied burst.
    pub fn update<R>(&self, apply: impl FnOnce(&mut ControlValues) -> R) -> R {
        let mut values = self.inner.lock().unwrap();
        apply(&mut values)
    }

    pub fn mark_failed(&self) {
        self.inner.lock().unwrap().failed = true;
    }

    pub fn is_failed(&self) -> bool {
        self.inner.lock().unwrap().failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_endpoints() {
        assert_eq!(normalize_axis(-32768), 1.0);
        assert_eq!(normalize_axis(32767), -1.0);
    }

    #[test]
    fn normalize_stays_in_range() {
        for raw in [-32768, -16384, -1, 0, 1, 12345, 32767] {
            let normalized = normalize_axis(raw);
            assert!((-1.0..=1.0).contains(&normalized), "raw {} -> {}", raw, normalized);
        }
    }

    #[test]
    fn normalize_is_monotonically_decreasing() {
        let samples = [-32768, -20000, -5000, 0, 5000, 20000, 32767];
        for pair in samples.windows(2) {
            assert!(
                normalize_axis(pair[0]) > normalize_axis(pair[1]),
                "expected normalize({}) > normalize({})",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn starts_with_safe_values() {
        let state = SharedControlState::new();
        let values = state.snapshot();
        assert_eq!(values.left, 0.0);
        assert_eq!(values.right, 0.0);
        assert_eq!(values.active_button, NO_BUTTON);
        assert!(!values.failed);
    }

    #[test]
    fn update_is_visible_to_snapshot() {
        let state = SharedControlState::new();
        state.update(|values| {
            values.left = 0.5;
            values.active_button = 2;
        });
        let values = state.snapshot();
        assert_eq!(values.left, 0.5);
        assert_eq!(values.active_button, 2);
    }

    #[test]
    fn mark_failed_is_sticky() {
        let state = SharedControlState::new();
        assert!(!state.is_failed());
        state.mark_failed();
        assert!(state.is_failed());
        state.update(|values| values.left = 1.0);
        assert!(state.is_failed());
    }
}
