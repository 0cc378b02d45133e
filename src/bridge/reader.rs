//! Device reader thread
//!
//! Continuously converts raw device events into shared-state updates. The
//! loop waits at most [`POLL_INTERVAL`] for the device to become readable,
//! so a shutdown signal is observed within one interval, then drains every
//! available event in a single critical section to keep backlog latency
//! out of the publisher's view.

use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::bridge::state::{normalize_axis, ControlValues, SharedControlState};
use crate::device::{DeviceError, DeviceEvent, InputDevice};

/// Bounded wait per loop iteration; also the shutdown responsiveness bound.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Reader errors
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Failed to start reader thread: {0}")]
    SpawnError(String),

    #[error("Reader thread panicked")]
    JoinError,

    #[error("Device failed: {0}")]
    DeviceFailure(#[from] DeviceError),
}

/// Which device axis indices feed the left and right control values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMapping {
    pub left: u8,
    pub right: u8,
}

/// Handle to the spawned reader thread.
#[derive(Debug)]
pub struct ReaderHandle {
    thread: thread::JoinHandle<Result<(), ReaderError>>,
}

impl ReaderHandle {
    /// Move the opened device onto a named reader thread.
    ///
    /// The thread owns the device handle for the duration of the loop and
    /// releases it on exit; `join` is how the controller waits for that.
    pub fn spawn<D>(
        device: D,
        state: SharedControlState,
        axes: AxisMapping,
        shutdown: CancellationToken,
    ) -> Result<Self, ReaderError>
    where
        D: InputDevice + 'static,
    {
        let thread = thread::Builder::new()
            .name("device-reader".to_string())
            .spawn(move || read_loop(device, state, axes, shutdown))
            .map_err(|e| ReaderError::SpawnError(e.to_string()))?;

        info!("Device reader spawned");
        Ok(Self { thread })
    }

    /// Wait for the reader thread to finish and report how it ended.
    pub fn join(self) -> Result<(), ReaderError> {
        self.thread.join().map_err(|_| ReaderError::JoinError)?
    }
}

fn read_loop<D: InputDevice>(
    mut device: D,
    state: SharedControlState,
    axes: AxisMapping,
    shutdown: CancellationToken,
) -> Result<(), ReaderError> {
    info!("Device reader loop started");

    while !shutdown.is_cancelled() {
        match device.poll_readable(POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {
                // One critical section per wakeup: drain everything that is
                // currently queued, then release the lock before waiting
                // again.
                let drained = state.update(|values| {
                    match drain_events(&mut device, values, axes) {
                        Ok(count) => Ok(count),
                        Err(e) => {
                            values.failed = true;
                            Err(e)
                        }
                    }
                });

                match drained {
                    Ok(count) => {
                        if count > 0 {
                            debug!("Applied {} device events", count);
                        }
                    }
                    Err(e) => {
                        error!("Device read failed: {}", e);
                        return Err(e.into());
                    }
                }
            }
            Err(e) => {
                error!("Device poll failed: {}", e);
                state.mark_failed();
                return Err(e.into());
            }
        }
    }

    info!("Device reader loop stopped");
    Ok(())
}

fn drain_events<D: InputDevice>(
    device: &mut D,
    values: &mut ControlValues,
    axes: AxisMapping,
) -> Result<usize, DeviceError> {
    let mut count = 0;
    while let Some(event) = device.read_event()? {
        apply_event(values, axes, event);
        count += 1;
    }
    Ok(count)
}

fn apply_event(values: &mut ControlValues, axes: AxisMapping, event: DeviceEvent) {
    match event {
        DeviceEvent::Axis { index, value } if index == axes.left => {
            values.left = normalize_axis(value);
        }
        DeviceEvent::Axis { index, value } if index == axes.right => {
            values.right = normalize_axis(value);
        }
        // Unconfigured axes, button releases, and replayed startup state
        // leave the control values untouched.
        DeviceEvent::Axis { .. } => {}
        DeviceEvent::Button { index, pressed } => {
            if pressed {
                values.active_button = index as i32;
            }
        }
        DeviceEvent::Init => {}
    }
}
