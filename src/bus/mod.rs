//! Message bus integration
//!
//! The bus is an opaque publish sink: `is_running` for session health and
//! a fire-and-forget `send` keyed by an integer channel id. The production
//! backend routes envelopes onto MQTT topics; [`mock::RecordingSink`]
//! captures traffic for tests.
//!
//! ```text
//! publisher tick ──► PublishSink::send(channel, stamp, payload)
//!                        │
//!                        ├── BusSession   (rumqttc, <session>/<channel>)
//!                        └── RecordingSink (tests)
//! ```

pub mod messages;
pub mod mock;
pub mod session;

pub use messages::{PedalPosition, SwitchState};
pub use mock::RecordingSink;
pub use session::{BusError, BusSession, ConnectionState};

use chrono::NaiveDateTime;
use std::time::Duration;

use messages::BusPayload;

/// Fire-and-forget publish sink with a health flag.
pub trait PublishSink: Send + Sync {
    /// Whether the underlying session is established and usable.
    fn is_running(&self) -> bool;

    /// Publish one payload on the given channel. Delivery is not
    /// acknowledged; failures are logged by the implementation.
    fn send(&self, channel: u32, stamp: NaiveDateTime, payload: BusPayload);
}

/// Invoke `tick` at a fixed frequency until it asks to stop.
///
/// The first invocation fires immediately; afterwards ticks are spaced at
/// `1 / frequency_hz` seconds.
pub async fn run_periodic<F>(frequency_hz: f32, mut tick: F)
where
    F: FnMut() -> bool,
{
    let period = Duration::from_secs_f32(1.0 / frequency_hz);
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        if !tick() {
            break;
        }
    }
}
