//! Questline in-process event bus.
//!
//! Domain actions (completions, verification resolutions, messages) publish
//! [`PlatformEvent`]s here; the API layer's notification router subscribes
//! and fans them out to WebSocket rooms and the notifications table.

pub mod bus;

pub use bus::{EventBus, PlatformEvent};
