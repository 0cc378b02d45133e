//! Scripted mock device for tests and hardware-free development.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::joystick::{DeviceCapabilities, DeviceError, InputDevice};
use super::DeviceEvent;

/// One scripted outcome of a `read_event` call.
#[derive(Debug, Clone)]
pub enum MockStep {
    Event(DeviceEvent),
    ReadError(String),
}

/// Shared handle for feeding a [`MockDevice`] while its reader runs.
#[derive(Debug, Clone, Default)]
pub struct MockDeviceQueue {
    steps: Arc<Mutex<VecDeque<MockStep>>>,
}

impl MockDeviceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&self, event: DeviceEvent) {
        self.steps.lock().unwrap().push_back(MockStep::Event(event));
    }

    pub fn push_events(&self, events: impl IntoIterator<Item = DeviceEvent>) {
        let mut steps = self.steps.lock().unwrap();
        for event in events {
            steps.push_back(MockStep::Event(event));
        }
    }

    pub fn push_read_error(&self, message: &str) {
        self.steps
            .lock()
            .unwrap()
            .push_back(MockStep::ReadError(message.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.steps.lock().unwrap().is_empty()
    }

    fn pop(&self) -> Option<MockStep> {
        self.steps.lock().unwrap().pop_front()
    }
}

/// Input device that replays a scripted queue instead of hardware.
///
/// `poll_readable` reports ready while the queue is non-empty and otherwise
/// sleeps for the requested timeout, mimicking the bounded wait of the real
/// device.
#[derive(Debug)]
pub struct MockDevice {
    capabilities: DeviceCapabilities,
    queue: MockDeviceQueue,
}

impl MockDevice {
    pub fn new(queue: MockDeviceQueue) -> Self {
        Self {
            capabilities: DeviceCapabilities {
                axes: 4,
                buttons: 12,
                name: String::from("Mock Gamepad"),
            },
            queue,
        }
    }
}

impl InputDevice for MockDevice {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn poll_readable(&mut self, timeout: Duration) -> Result<bool, DeviceError> {
        if self.queue.is_empty() {
            thread::sleep(timeout);
            return Ok(!self.queue.is_empty());
        }
        Ok(true)
    }

    fn read_event(&mut self) -> Result<Option<DeviceEvent>, DeviceError> {
        match self.queue.pop() {
            Some(MockStep::Event(event)) => Ok(Some(event)),
            Some(MockStep::ReadError(message)) => Err(DeviceError::ReadError(message)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_queued_events_then_would_blocks() {
        let queue = MockDeviceQueue::new();
        queue.push_event(DeviceEvent::Axis { index: 0, value: 5 });
        queue.push_event(DeviceEvent::Init);

        let mut device = MockDevice::new(queue);
        assert!(device.poll_readable(Duration::from_millis(1)).unwrap());
        assert_eq!(
            device.read_event().unwrap(),
            Some(DeviceEvent::Axis { index: 0, value: 5 })
        );
        assert_eq!(device.read_event().unwrap(), Some(DeviceEvent::Init));
        assert_eq!(device.read_event().unwrap(), None);
    }

    #[test]
    fn scripted_error_surfaces_as_read_error() {
        let queue = MockDeviceQueue::new();
        queue.push_read_error("cable pulled");

        let mut device = MockDevice::new(queue);
        assert!(matches!(
            device.read_event(),
            Err(DeviceError::ReadError(msg)) if msg == "cable pulled"
        ));
    }
}
