//! End-to-end tests for the reader/publisher core over mock collaborators.

use std::time::{Duration, Instant};

use padbridge::bridge::publisher::ENABLE_BUTTON;
use padbridge::bridge::reader::{AxisMapping, ReaderHandle};
use padbridge::bridge::state::{ControlValues, SharedControlState, NO_BUTTON};
use padbridge::bridge::StatePublisher;
use padbridge::bus::messages::{
    BusPayload, PedalPosition, SwitchState, CHANNEL_PEDAL_LEFT, CHANNEL_PEDAL_RIGHT,
    CHANNEL_SWITCH_STATE,
};
use padbridge::bus::RecordingSink;
use padbridge::device::{DeviceEvent, MockDevice, MockDeviceQueue};
use tokio_util::sync::CancellationToken;

const AXES: AxisMapping = AxisMapping { left: 1, right: 4 };

fn wait_for(state: &SharedControlState, predicate: impl Fn(ControlValues) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if predicate(state.snapshot()) {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("reader did not reach expected state: {:?}", state.snapshot());
}

#[test]
fn axis_extremes_reach_the_bus_on_the_next_tick() {
    let queue = MockDeviceQueue::new();
    let state = SharedControlState::new();
    let shutdown = CancellationToken::new();
    let reader = ReaderHandle::spawn(
        MockDevice::new(queue.clone()),
        state.clone(),
        AXES,
        shutdown.clone(),
    )
    .unwrap();

    queue.push_events([
        DeviceEvent::Axis { index: 1, value: -32768 },
        DeviceEvent::Axis { index: 4, value: 32767 },
        DeviceEvent::Button { index: 0, pressed: true },
    ]);
    wait_for(&state, |values| {
        values.active_button == ENABLE_BUTTON && values.left == 1.0 && values.right == -1.0
    });

    let sink = RecordingSink::new();
    let publisher = StatePublisher::new(state, sink.clone(), shutdown.clone());
    assert!(publisher.tick());

    assert_eq!(
        sink.sent_on(CHANNEL_PEDAL_LEFT),
        vec![BusPayload::Pedal(PedalPosition { position: 1.0 })]
    );
    assert_eq!(
        sink.sent_on(CHANNEL_PEDAL_RIGHT),
        vec![BusPayload::Pedal(PedalPosition { position: -1.0 })]
    );

    shutdown.cancel();
    reader.join().unwrap();
}

#[test]
fn quiet_device_still_produces_a_state_message_every_tick() {
    let state = SharedControlState::new();
    let shutdown = CancellationToken::new();
    let reader = ReaderHandle::spawn(
        MockDevice::new(MockDeviceQueue::new()),
        state.clone(),
        AXES,
        shutdown.clone(),
    )
    .unwrap();

    let sink = RecordingSink::new();
    let publisher = StatePublisher::new(state, sink.clone(), shutdown.clone());
    publisher.publish_initial();
    for _ in 0..3 {
        assert!(publisher.tick());
    }

    let switch_states = sink.sent_on(CHANNEL_SWITCH_STATE);
    assert_eq!(switch_states.len(), 4);
    assert!(switch_states
        .iter()
        .all(|payload| *payload == BusPayload::Switch(SwitchState { state: NO_BUTTON })));
    // Pedals stay withheld without the enable button; only the initial
    // safe values were ever sent.
    assert_eq!(sink.sent_on(CHANNEL_PEDAL_LEFT).len(), 1);
    assert_eq!(sink.sent_on(CHANNEL_PEDAL_RIGHT).len(), 1);

    shutdown.cancel();
    reader.join().unwrap();
}

#[test]
fn pedal_stream_stops_when_another_button_takes_over() {
    let queue = MockDeviceQueue::new();
    let state = SharedControlState::new();
    let shutdown = CancellationToken::new();
    let reader = ReaderHandle::spawn(
        MockDevice::new(queue.clone()),
        state.clone(),
        AXES,
        shutdown.clone(),
    )
    .unwrap();

    let sink = RecordingSink::new();
    let publisher = StatePublisher::new(state.clone(), sink.clone(), shutdown.clone());

    queue.push_event(DeviceEvent::Button { index: 0, pressed: true });
    wait_for(&state, |values| values.active_button == ENABLE_BUTTON);
    assert!(publisher.tick());
    assert_eq!(sink.sent_on(CHANNEL_PEDAL_LEFT).len(), 1);

    queue.push_events([
        DeviceEvent::Button { index: 0, pressed: false },
        DeviceEvent::Button { index: 3, pressed: true },
    ]);
    wait_for(&state, |values| values.active_button == 3);
    sink.clear();

    assert!(publisher.tick());
    assert!(sink.sent_on(CHANNEL_PEDAL_LEFT).is_empty());
    assert!(sink.sent_on(CHANNEL_PEDAL_RIGHT).is_empty());
    assert_eq!(
        sink.sent_on(CHANNEL_SWITCH_STATE),
        vec![BusPayload::Switch(SwitchState { state: 3 })]
    );

    shutdown.cancel();
    reader.join().unwrap();
}

#[test]
fn device_failure_drains_the_whole_bridge() {
    let queue = MockDeviceQueue::new();
    let state = SharedControlState::new();
    let shutdown = CancellationToken::new();
    let reader = ReaderHandle::spawn(
        MockDevice::new(queue.clone()),
        state.clone(),
        AXES,
        shutdown.clone(),
    )
    .unwrap();

    queue.push_read_error("device vanished");
    wait_for(&state, |values| values.failed);

    let sink = RecordingSink::new();
    let publisher = StatePublisher::new(state, sink.clone(), shutdown.clone());
    assert!(!publisher.tick());
    // The final tick still reports the last known state.
    assert_eq!(sink.sent_on(CHANNEL_SWITCH_STATE).len(), 1);

    shutdown.cancel();
    assert!(reader.join().is_err());
}

#[test]
fn shutdown_joins_the_reader_promptly() {
    let state = SharedControlState::new();
    let shutdown = CancellationToken::new();
    let reader = ReaderHandle::spawn(
        MockDevice::new(MockDeviceQueue::new()),
        state,
        AXES,
        shutdown.clone(),
    )
    .unwrap();

    shutdown.cancel();
    let started = Instant::now();
    reader.join().unwrap();
    assert!(started.elapsed() < Duration::from_millis(200));
}
