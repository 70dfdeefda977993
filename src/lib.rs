//! # Bkknet
//!
//! Network control-plane agent for the Bkk320 embedded sensor device.
//!
//! Bkknet listens for a small fixed-format binary command protocol over UDP,
//! validates and decodes inbound frames, dispatches recognized commands to
//! handlers, and emits ordered binary responses back to the originating
//! endpoint. A secondary TCP listener acts as a raw byte log sink with no
//! protocol semantics.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      UDP Endpoint                        │
//! │   receive loop                     ordered send queue    │
//! └──────┬───────────────────────────────────────▲───────────┘
//!        │ (bytes, sender)            (response bytes, dest) │
//! ┌──────▼───────────┐                      ┌────────────────┴──┐
//! │   Frame Parser   │    (Frame, sender)   │  Message Manager  │
//! │ decode + validate├──────────────────────▶ command dispatch  │
//! └──────────────────┘                      └───────────────────┘
//! ```
//!
//! Each stage drains a private channel on a single task, so no two
//! operations of one stage ever interleave their side effects.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)] // Wire fields are fixed-width by contract

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod parser;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod util;

pub use config::Config;
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default UDP/TCP listen port of the agent.
pub const DEFAULT_PORT: u16 = 30720;
