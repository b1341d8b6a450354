//! Per-connection session orchestration.
//!
//! One [`Session`] per accepted connection. It sequences handshake,
//! navigation, and secret retrieval, and is the single error boundary:
//! every protocol violation is turned into exactly one wire response
//! before the connection closes, while timeouts and transport failures
//! close the connection silently.

use rover_core::navigation::{BOOTSTRAP_SEQUENCE, Command, RECOVERY_SEQUENCE, Rover};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::protocol::error::SessionResult;
use crate::protocol::framing::{FrameReader, FramingConfig};
use crate::protocol::handshake::authenticate;
use crate::protocol::wire::{MAX_REPORT_LEN, MAX_SECRET_LEN, ServerMessage, send_message};

/// One client session over a bidirectional byte stream.
pub struct Session<R, W> {
    frames: FrameReader<R>,
    writer: W,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, framing: FramingConfig) -> Self {
        Self {
            frames: FrameReader::new(reader, framing),
            writer,
        }
    }

    /// Run the session to completion.
    ///
    /// Maps a failing session to its wire response (when one is owed)
    /// and returns the error for the caller to log. The connection is
    /// closed by dropping the halves, on every path.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`SessionError`] after the response (if
    /// any) has been sent; a failed response write is ignored since
    /// the session is over either way.
    pub async fn run(mut self) -> SessionResult<()> {
        match self.drive().await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(reply) = err.wire_reply() {
                    let _ = send_message(&mut self.writer, reply).await;
                }
                Err(err)
            },
        }
    }

    /// Handshake, then navigation, then the secret exchange.
    async fn drive(&mut self) -> SessionResult<()> {
        let mut rover = authenticate(&mut self.frames, &mut self.writer).await?;
        self.navigate(&mut rover).await?;
        let secret = self.frames.read_message(MAX_SECRET_LEN).await?;
        if !secret.is_empty() {
            info!(rover = %rover.name(), "secret retrieved, logging out");
            send_message(&mut self.writer, ServerMessage::Logout).await?;
        }
        Ok(())
    }

    /// Steer the rover to the origin and request the secret.
    async fn navigate(&mut self, rover: &mut Rover) -> SessionResult<()> {
        // The rover spawns with unknown pose. Two opposite turns
        // record two coordinate samples without changing position;
        // since turns never move, the samples match and the sidestep
        // below forces an observable move that reveals heading.
        for command in BOOTSTRAP_SEQUENCE {
            self.step(rover, command).await?;
        }
        if !rover.has_moved() {
            self.recover(rover).await?;
        }

        loop {
            let command = rover.next_command()?;
            if command == Command::PickUp {
                debug!(rover = %rover.name(), "origin reached");
                send_message(&mut self.writer, ServerMessage::GetMessage).await?;
                return Ok(());
            }
            self.step(rover, command).await?;
            if command == Command::Move && !rover.has_moved() {
                self.recover(rover).await?;
            }
        }
    }

    /// Sidestep an obstacle (or force the bootstrap move). The
    /// maneuver is not re-verified; the main loop resumes regardless.
    async fn recover(&mut self, rover: &mut Rover) -> SessionResult<()> {
        debug!(position = ?rover.position(), "blocked, sidestepping");
        for command in RECOVERY_SEQUENCE {
            self.step(rover, command).await?;
        }
        Ok(())
    }

    /// Send one command and record the coordinate report it provokes.
    async fn step(&mut self, rover: &mut Rover, command: Command) -> SessionResult<()> {
        send_message(&mut self.writer, command.into()).await?;
        let report = self.frames.read_message(MAX_REPORT_LEN).await?;
        rover.observe_report(&report)?;
        debug!(command = %command, position = ?rover.position(), "step");
        Ok(())
    }
}
