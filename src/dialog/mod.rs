//! The conversational session: trace normalization and turn sequencing.

pub mod session;
pub mod trace;

pub use session::{ChatSession, DEFAULT_GREETING, Message, Role};
pub use trace::{Button, NormalizedTurn, normalize_traces};
