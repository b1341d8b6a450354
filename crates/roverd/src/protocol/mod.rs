//! Rover control protocol implementation.
//!
//! The protocol stack is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │    Handshake / navigation / secret      │  session orchestration
//! ├─────────────────────────────────────────┤
//! │       Recharge interrupt handling       │  absorbed by the reader
//! ├─────────────────────────────────────────┤
//! │                Framing                  │  BEL+BS terminated text
//! ├─────────────────────────────────────────┤
//! │              TCP transport              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Module overview
//!
//! - [`wire`]: terminator, message limits, server message vocabulary
//! - [`error`]: [`SessionError`] and its wire-reply mapping
//! - [`framing`]: [`FrameReader`], the timeout-bounded frame extractor
//! - [`handshake`]: challenge-response authentication

pub mod error;
pub mod framing;
pub mod handshake;
pub mod wire;

pub use error::{SessionError, SessionResult};
pub use framing::{FrameReader, FramingConfig};
pub use handshake::authenticate;
pub use wire::{ServerMessage, TERMINATOR, send_message};
