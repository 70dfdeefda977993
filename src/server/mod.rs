//! Agent orchestration.
//!
//! Wires transport → parser → dispatcher → transport and owns lifecycle and
//! shutdown signaling.

mod agent;
mod signals;

pub use agent::Agent;
pub use signals::{wait_for_shutdown, Signal};
