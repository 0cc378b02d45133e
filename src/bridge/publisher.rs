//! Periodic state publisher
//!
//! Invoked on every tick of the fixed-frequency trigger. Each tick takes
//! one snapshot of the shared control state and maps it to bus messages:
//! pedal positions go out only while the enable button is latched, the
//! switch state goes out unconditionally. The snapshot is copied under the
//! lock and published after release, so a slow sink never extends the
//! critical section.

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::bridge::state::{SharedControlState, NO_BUTTON};
use crate::bus::messages::{
    PedalPosition, SwitchState, CHANNEL_PEDAL_LEFT, CHANNEL_PEDAL_RIGHT, CHANNEL_SWITCH_STATE,
};
use crate::bus::PublishSink;

/// Button index that enables pedal-position publication.
pub const ENABLE_BUTTON: i32 = 0;

pub struct StatePublisher<S: PublishSink> {
    state: SharedControlState,
    sink: S,
    shutdown: CancellationToken,
}

impl<S: PublishSink> StatePublisher<S> {
    pub fn new(state: SharedControlState, sink: S, shutdown: CancellationToken) -> Self {
        Self {
            state,
            sink,
            shutdown,
        }
    }

    /// Emit the safe initial state so subscribers see a defined value
    /// before any device activity.
    pub fn publish_initial(&self) {
        self.sink.send(
            CHANNEL_PEDAL_LEFT,
            Local::now().naive_local(),
            PedalPosition { position: 0.0 }.into(),
        );
        self.sink.send(
            CHANNEL_PEDAL_RIGHT,
            Local::now().naive_local(),
            PedalPosition { position: 0.0 }.into(),
        );
        self.sink.send(
            CHANNEL_SWITCH_STATE,
            Local::now().naive_local(),
            SwitchState { state: NO_BUTTON }.into(),
        );
    }

    /// One publisher tick. Returns whether the trigger should keep firing.
    pub fn tick(&self) -> bool {
        let snapshot = self.state.snapshot();

        if snapshot.active_button == ENABLE_BUTTON {
            self.sink.send(
                CHANNEL_PEDAL_LEFT,
                Local::now().naive_local(),
                PedalPosition {
                    position: snapshot.left,
                }
                .into(),
            );
            self.sink.send(
                CHANNEL_PEDAL_RIGHT,
                Local::now().naive_local(),
                PedalPosition {
                    position: snapshot.right,
                }
                .into(),
            );
        }

        self.sink.send(
            CHANNEL_SWITCH_STATE,
            Local::now().naive_local(),
            SwitchState {
                state: snapshot.active_button,
            }
            .into(),
        );

        if snapshot.failed {
            debug!("Control state failed, requesting publisher stop");
            return false;
        }
        !self.shutdown.is_cancelled()
    }
}
