//! Linux joystick device backend
//!
//! Wraps the `/dev/input/js*` character device: non-blocking open, a
//! best-effort capability query, a bounded readiness wait, and repeated
//! non-blocking reads of the fixed-size event records.

use std::ffi::CStr;
use std::ffi::CString;
use std::io;
use std::mem;
use std::time::Duration;

use tracing::{debug, warn};

use super::DeviceEvent;

/// Device errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to poll device: {0}")]
    PollError(String),

    #[error("Failed to read device event: {0}")]
    ReadError(String),
}

/// Capabilities reported by the device at open time.
///
/// The name query is best-effort; devices that refuse it are reported as
/// "Unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub axes: u8,
    pub buttons: u8,
    pub name: String,
}

/// Contract between the reader loop and an opened input device.
///
/// `read_event` returning `Ok(None)` means "no more data right now"; every
/// other failure is fatal to the stream.
pub trait InputDevice: Send {
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Wait up to `timeout` for the device to become readable.
    fn poll_readable(&mut self, timeout: Duration) -> Result<bool, DeviceError>;

    /// Non-blocking read of the next decoded event.
    fn read_event(&mut self) -> Result<Option<DeviceEvent>, DeviceError>;
}

// Joystick event record as defined by the kernel joydev interface.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct RawJsEvent {
    time: u32,
    value: i16,
    kind: u8,
    number: u8,
}

const EVENT_BUTTON: u8 = 0x01;
const EVENT_AXIS: u8 = 0x02;
const EVENT_INIT: u8 = 0x80;

// ioctl request codes for the joydev capability queries.
const JSIOCGAXES: libc::c_ulong = 0x8001_6a11;
const JSIOCGBUTTONS: libc::c_ulong = 0x8001_6a12;
const JSIOCGNAME_128: libc::c_ulong = 0x8080_6a13;

/// Handle to an opened joystick character device.
#[derive(Debug)]
pub struct JoystickDevice {
    fd: libc::c_int,
    capabilities: DeviceCapabilities,
}

impl JoystickDevice {
    /// Open the device in non-blocking mode and query its capabilities.
    pub fn open(path: &str) -> Result<Self, DeviceError> {
        let c_path = CString::new(path)
            .map_err(|e| DeviceError::OpenError(format!("{}: {}", path, e)))?;

        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY | libc::O_NONBLOCK) };
        if fd < 0 {
            return Err(DeviceError::OpenError(format!(
                "{}: {}",
                path,
                io::Error::last_os_error()
            )));
        }

        let capabilities = query_capabilities(fd);
        debug!(
            "Opened {} ({}, {} axes, {} buttons)",
            path, capabilities.name, capabilities.axes, capabilities.buttons
        );

        Ok(Self { fd, capabilities })
    }
}

// Best-effort: a device that rejects the queries still works as an event
// source, so failures only degrade the reported metadata.
fn query_capabilities(fd: libc::c_int) -> DeviceCapabilities {
    let mut axes: u8 = 0;
    let mut buttons: u8 = 0;

    unsafe {
        if libc::ioctl(fd, JSIOCGAXES, &mut axes) < 0 {
            warn!("Axis count query failed: {}", io::Error::last_os_error());
        }
        if libc::ioctl(fd, JSIOCGBUTTONS, &mut buttons) < 0 {
            warn!("Button count query failed: {}", io::Error::last_os_error());
        }
    }

    let mut name_buf = [0u8; 128];
    let name = if unsafe { libc::ioctl(fd, JSIOCGNAME_128, name_buf.as_mut_ptr()) } < 0 {
        String::from("Unknown")
    } else {
        CStr::from_bytes_until_nul(&name_buf)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("Unknown"))
    };

    DeviceCapabilities { axes, buttons, name }
}

impl InputDevice for JoystickDevice {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn poll_readable(&mut self, timeout: Duration) -> Result<bool, DeviceError> {
        let mut pollfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };

        let rc = unsafe { libc::poll(&mut pollfd, 1, timeout.as_millis() as libc::c_int) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(DeviceError::PollError(err.to_string()));
        }

        Ok(rc > 0 && pollfd.revents & libc::POLLIN != 0)
    }

    fn read_event(&mut self) -> Result<Option<DeviceEvent>, DeviceError> {
        let mut raw = RawJsEvent::default();
        let wanted = mem::size_of::<RawJsEvent>();

        let n = unsafe {
            libc::read(
                self.fd,
                &mut raw as *mut RawJsEvent as *mut libc::c_void,
                wanted,
            )
        };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(None);
            }
            return Err(DeviceError::ReadError(err.to_string()));
        }
        if n as usize != wanted {
            return Err(DeviceError::ReadError(format!(
                "short event record ({} of {} bytes)",
                n, wanted
            )));
        }

        Ok(Some(decode_event(raw)))
    }
}

fn decode_event(raw: RawJsEvent) -> DeviceEvent {
    if raw.kind & EVENT_INIT != 0 {
        return DeviceEvent::Init;
    }
    match raw.kind {
        EVENT_AXIS => DeviceEvent::Axis {
            index: raw.number,
            value: raw.value,
        },
        EVENT_BUTTON => DeviceEvent::Button {
            index: raw.number,
            pressed: raw.value == 1,
        },
        // Anything else is noise to the consumer, same as a replayed
        // startup record.
        _ => DeviceEvent::Init,
    }
}

impl Drop for JoystickDevice {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
