//! Input device subsystem
//!
//! Models the joystick as an opened handle plus a stream of raw input
//! events. [`joystick`] talks to the Linux joystick character device;
//! [`mock`] provides a scripted stand-in for tests and development without
//! hardware.

pub mod joystick;
pub mod mock;

pub use joystick::{DeviceCapabilities, DeviceError, InputDevice, JoystickDevice};
pub use mock::{MockDevice, MockDeviceQueue};

/// Decoded event read from the input device.
///
/// Axis values are reported in the device range [-32768, 32767]. Events
/// carrying the synthetic-init flag are surfaced as [`DeviceEvent::Init`]
/// so consumers can skip the replayed startup state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    Axis { index: u8, value: i16 },
    Button { index: u8, pressed: bool },
    Init,
}
