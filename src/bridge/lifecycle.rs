//! Bridge lifecycle controller
//!
//! Owns the path from opening the device to releasing it again:
//!
//! ```text
//! Init ──► DeviceOpened ──► Running ──► Draining ──► Closed
//! ```
//!
//! Each phase is a typestate; a bus session that never comes up, a reader
//! failure, and a termination request all converge on the same
//! Draining/Closed path.

use statum::{machine, state, transition};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bridge::publisher::StatePublisher;
use crate::bridge::reader::{AxisMapping, ReaderError, ReaderHandle};
use crate::bridge::state::SharedControlState;
use crate::bus::session::BusSession;
use crate::bus::PublishSink;
use crate::config::BridgeConfig;
use crate::device::{DeviceError, InputDevice, JoystickDevice};

/// Bridge errors
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Reader error: {0}")]
    ReaderError(#[from] ReaderError),
}

#[state]
#[derive(Debug, Clone)]
pub enum LifecyclePhase {
    Init,
    DeviceOpened,
    Running,
    Draining,
    Closed,
}

#[machine]
#[derive(Debug)]
pub struct Bridge<LifecyclePhase> {
    config: BridgeConfig,
    state: SharedControlState,
    shutdown: CancellationToken,
    device: Option<JoystickDevice>,
    reader: Option<ReaderHandle>,
}

impl<LifecyclePhase: LifecyclePhaseTrait> Bridge<LifecyclePhase> {
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn control_state(&self) -> SharedControlState {
        self.state.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Bridge<Init> {
    pub fn create(config: BridgeConfig) -> Self {
        Self::builder()
            .config(config)
            .state(SharedControlState::new())
            .shutdown(CancellationToken::new())
            .device(None)
            .reader(None)
            .build()
    }
}

#[transition]
impl Bridge<Init> {
    /// Open the joystick device. Failure here is fatal: nothing has been
    /// started yet, so the error propagates to the caller.
    pub fn open_device(mut self) -> ::core::result::Result<Bridge<DeviceOpened>, BridgeError> {
        let device = JoystickDevice::open(&self.config.device.path)?;

        let capabilities = device.capabilities();
        info!(
            "Found {}, number of axes: {}, number of buttons: {}",
            capabilities.name, capabilities.axes, capabilities.buttons
        );

        self.device = Some(device);
        Ok(self.transition())
    }
}

#[transition]
impl Bridge<DeviceOpened> {
    /// Hand the device to the reader thread.
    pub fn start_reader(mut self) -> ::core::result::Result<Bridge<Running>, BridgeError> {
        let device = match self.device.take() {
            Some(device) => device,
            None => {
                return Err(BridgeError::ReaderError(ReaderError::SpawnError(
                    "device handle already taken".to_string(),
                )))
            }
        };

        let axes = AxisMapping {
            left: self.config.device.axis_left,
            right: self.config.device.axis_right,
        };
        let reader = ReaderHandle::spawn(
            device,
            self.state.clone(),
            axes,
            self.shutdown.clone(),
        )?;

        self.reader = Some(reader);
        Ok(self.transition())
    }
}

#[transition]
impl Bridge<Running> {
    /// Signal shutdown to the reader and enter the drain phase.
    pub fn begin_drain(self) -> Bridge<Draining> {
        info!("Draining bridge");
        self.shutdown.cancel();
        self.transition()
    }
}

#[transition]
impl Bridge<Draining> {
    /// Wait for the reader to finish; its device handle is released when
    /// the thread exits.
    pub fn join_reader(mut self) -> Bridge<Closed> {
        if let Some(reader) = self.reader.take() {
            match reader.join() {
                Ok(()) => info!("Device reader finished cleanly"),
                Err(e) => warn!("Device reader finished with error: {}", e),
            }
        }
        info!("Bridge closed, device released");
        self.transition()
    }
}

/// Run the full bridge lifecycle to completion.
///
/// Startup failures (device open, reader spawn) surface as errors. A bus
/// session that fails after the device opened is an orderly shutdown: it
/// is logged, the bridge drains, and the call returns Ok.
pub async fn run(config: BridgeConfig) -> Result<(), BridgeError> {
    let bridge = Bridge::create(config).open_device()?.start_reader()?;

    match BusSession::open(&bridge.config().bus) {
        Ok(session) if session.is_running() => {
            let frequency = bridge.config().bus.frequency;
            let publisher = StatePublisher::new(
                bridge.control_state(),
                session,
                bridge.shutdown_token(),
            );

            publisher.publish_initial();
            info!("Publishing control state at {} Hz", frequency);

            tokio::select! {
                _ = crate::bus::run_periodic(frequency, || publisher.tick()) => {
                    info!("Publisher requested stop");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Termination requested");
                }
            }
        }
        Ok(_) => {
            error!("Bus session is not running, shutting down");
        }
        Err(e) => {
            error!("Failed to open bus session: {}", e);
        }
    }

    let _closed = bridge.begin_drain().join_reader();
    Ok(())
}
