//! Domain logic for the rover control server.
//!
//! This crate holds everything that does not touch a socket:
//!
//! - [`auth`]: the fixed key tables and challenge-response hash
//!   computation used during the login handshake
//! - [`navigation`]: the rover state machine that infers heading from
//!   successive coordinate reports and picks the next command to steer
//!   the rover to the origin
//! - [`config`]: daemon configuration types and TOML loading
//!
//! The I/O layer lives in the `roverd` crate; keeping this crate free
//! of async code lets the navigation and hashing logic be tested as
//! plain functions.

pub mod auth;
pub mod config;
pub mod navigation;

pub use auth::{KeyId, client_hash, name_checksum, server_hash};
pub use config::{ConfigError, RoverConfig};
pub use navigation::{Command, Heading, Position, Rover};
