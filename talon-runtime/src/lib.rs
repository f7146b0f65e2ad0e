//! talon-runtime - session lifecycle and scheduling
//!
//! Coordinates the lookup session: store load and periodic refresh,
//! degraded-mode search, and the debounce discipline for typed queries.

pub mod debounce;
pub mod refresh;
pub mod session;

pub use debounce::*;
pub use refresh::*;
pub use session::*;
