//! Recording sink for tests and bus-free development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use super::messages::BusPayload;
use super::PublishSink;

/// One captured `send` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentMessage {
    pub channel: u32,
    pub stamp: NaiveDateTime,
    pub payload: BusPayload,
}

/// Publish sink that records every message instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    stopped: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that reports the session as not running.
    pub fn stopped() -> Self {
        let sink = Self::default();
        sink.stopped.store(true, Ordering::SeqCst);
        sink
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Payloads sent on one channel, in order.
    pub fn sent_on(&self, channel: u32) -> Vec<BusPayload> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|message| message.channel == channel)
            .map(|message| message.payload)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl PublishSink for RecordingSink {
    fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    fn send(&self, channel: u32, stamp: NaiveDateTime, payload: BusPayload) {
        self.sent.lock().unwrap().push(SentMessage {
            channel,
            stamp,
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::messages::{PedalPosition, CHANNEL_PEDAL_LEFT, CHANNEL_SWITCH_STATE};
    use crate::bus::messages::SwitchState;
    use chrono::Local;

    #[test]
    fn records_messages_per_channel() {
        let sink = RecordingSink::new();
        assert!(sink.is_running());

        let stamp = Local::now().naive_local();
        sink.send(
            CHANNEL_PEDAL_LEFT,
            stamp,
            BusPayload::Pedal(PedalPosition { position: 0.25 }),
        );
        sink.send(
            CHANNEL_SWITCH_STATE,
            stamp,
            BusPayload::Switch(SwitchState { state: 0 }),
        );

        assert_eq!(sink.sent().len(), 2);
        assert_eq!(
            sink.sent_on(CHANNEL_PEDAL_LEFT),
            vec![BusPayload::Pedal(PedalPosition { position: 0.25 })]
        );
    }

    #[test]
    fn stopped_sink_reports_not_running() {
        let sink = RecordingSink::stopped();
        assert!(!sink.is_running());
    }
}
