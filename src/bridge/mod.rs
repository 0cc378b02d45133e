//! Bridge core: reader, shared state, publisher, lifecycle
//!
//! Two concurrent activities composed around one piece of shared state:
//!
//! ```text
//! Device ──► reader thread ──► SharedControlState ──► publisher tick ──► Bus
//!            (20 ms poll)          (one mutex)          (fixed Hz)
//! ```
//!
//! The reader drains device events into the state under the lock; the
//! publisher samples the state on an independent clock. [`lifecycle`]
//! sequences startup and shutdown around both.

pub mod lifecycle;
pub mod publisher;
pub mod reader;
pub mod state;

pub use lifecycle::{run, Bridge, BridgeError};
pub use publisher::{StatePublisher, ENABLE_BUTTON};
pub use reader::{AxisMapping, ReaderError, ReaderHandle, POLL_INTERVAL};
pub use state::{normalize_axis, ControlValues, SharedControlState, NO_BUTTON};
