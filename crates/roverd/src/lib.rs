//! roverd - TCP control server for remote rovers.
//!
//! A client connects, proves identity via a numeric
//! challenge-response handshake, then reports its coordinates after
//! each command the server issues. The server steers the rover to the
//! origin, retrieves the secret stored there, and logs the client out.
//! Clients may interrupt any exchange with a recharge announcement,
//! which the framing layer absorbs transparently.
//!
//! Library layout:
//!
//! - [`protocol`]: framing, handshake, wire vocabulary, error mapping
//! - [`session`]: per-connection orchestration
//! - [`server`]: TCP listener and task spawning
//!
//! Domain logic (key tables, hashing, navigation, configuration) lives
//! in the `rover-core` crate.

pub mod protocol;
pub mod server;
pub mod session;

pub use server::Server;
pub use session::Session;
