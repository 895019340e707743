//! Questline domain logic.
//!
//! Pure computation shared by the database and API layers: the streak/XP
//! engine, difficulty tiers, verification state machine, moderation roles,
//! the day-boundary policy, and credential encryption helpers. This crate
//! performs no I/O.

pub mod difficulty;
pub mod error;
pub mod roles;
pub mod secrets;
pub mod streak;
pub mod types;
pub mod verification;
