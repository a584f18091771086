//! SurrealDB repository implementations.

mod attendance;
mod session;

pub use attendance::SurrealAttendanceRepository;
pub use session::SurrealSessionRepository;
