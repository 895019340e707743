//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus and fans platform
//! events out to WebSocket clients (leaderboard updates and other realtime
//! signals that are not tied to a single request).

pub mod router;

pub use router::NotificationRouter;
