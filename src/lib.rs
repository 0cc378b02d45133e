//! padbridge: Gamepad to Message Bus Bridge
//!
//! Reads a joystick character device on a dedicated thread, keeps the latest
//! normalized control values behind a single lock, and publishes them onto a
//! message bus at a fixed frequency.

pub mod bridge;
pub mod bus;
pub mod config;
pub mod device;

// Re-export commonly used items
pub use bridge::{ReaderHandle, SharedControlState, StatePublisher};
pub use bus::{BusSession, PublishSink};
pub use config::BridgeConfig;
pub use device::{DeviceEvent, InputDevice, JoystickDevice};
