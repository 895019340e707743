//! HTTP request handlers, grouped by resource.

pub mod auth;
pub mod messages;
pub mod notification;
pub mod tasks;
pub mod verification;
