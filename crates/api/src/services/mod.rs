//! Domain services sitting between handlers (REST and WebSocket) and the
//! repositories. Handlers stay thin; everything that combines validation,
//! persistence, events, and realtime fan-out lives here.

pub mod completion;
pub mod messaging;
pub mod verification;
