//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod completion;
pub mod conversation;
pub mod friendship;
pub mod group;
pub mod message;
pub mod notification;
pub mod refresh_token;
pub mod task;
pub mod user;
pub mod verification;
pub mod xp;
