//! Navigation state machine steering the rover to the origin.
//!
//! The server never learns the rover's pose directly: the client
//! reports a coordinate after every command, and heading has to be
//! inferred from the displacement between successive reports. This
//! module tracks that state and picks the next command.
//!
//! # Heading inference
//!
//! Compare the newest sample against the previous one; a change in x
//! wins over a change in y. Pure turns produce no displacement and
//! leave the inferred heading untouched, which is why the session
//! bootstraps with a forced sidestep (see [`RECOVERY_SEQUENCE`]).
//!
//! # Per-step decision
//!
//! Drive x to zero first, then y. When the tracked heading differs
//! from the desired axis heading the engine emits `TURN RIGHT` and
//! rotates its tracked heading clockwise; it only emits `MOVE` once
//! aligned. Alignment always rotates clockwise even when a single
//! counter-clockwise turn would be shorter, costing at most three
//! extra turns per axis change.

use std::fmt;

use thiserror::Error;

/// Heading of the rover, clockwise-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    /// Toward positive y.
    Up,
    /// Toward positive x.
    Right,
    /// Toward negative y.
    Down,
    /// Toward negative x.
    Left,
}

impl Heading {
    /// The heading after one clockwise quarter turn.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        };
        write!(f, "{name}")
    }
}

/// Movement command the engine asks the session to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move forward one cell.
    Move,
    /// Rotate counter-clockwise in place.
    TurnLeft,
    /// Rotate clockwise in place.
    TurnRight,
    /// Request the secret payload; only emitted at the origin.
    PickUp,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Move => "MOVE",
            Self::TurnLeft => "TURN LEFT",
            Self::TurnRight => "TURN RIGHT",
            Self::PickUp => "GET MESSAGE",
        };
        write!(f, "{name}")
    }
}

/// Commands issued at session start to obtain two coordinate samples.
///
/// Two opposite turns restore the original heading while forcing the
/// client to report twice.
pub const BOOTSTRAP_SEQUENCE: [Command; 2] = [Command::TurnRight, Command::TurnLeft];

/// Sidestep maneuver issued when a `MOVE` produced no displacement.
///
/// Steps around the obstacle and restores the original heading. The
/// same maneuver doubles as the bootstrap fallback that forces an
/// observable move so heading can be inferred. Whether the sidestep
/// itself succeeded is not re-verified; the main loop simply resumes.
pub const RECOVERY_SEQUENCE: [Command; 4] = [
    Command::TurnRight,
    Command::Move,
    Command::TurnLeft,
    Command::Move,
];

/// A reported grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Parse a client coordinate report of the form `OK <x> <y>`.
    ///
    /// Exactly three space-separated tokens: the literal `OK`
    /// acknowledgement tag and two signed decimal integers (optional
    /// leading minus, no plus sign, no inner whitespace). A doubled
    /// separator yields an empty token and is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::MalformedReport`] for any deviation
    /// from the format above.
    pub fn parse_report(report: &str) -> Result<Self, NavigationError> {
        let mut tokens = report.split(' ');
        let (Some(tag), Some(x), Some(y), None) =
            (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(NavigationError::malformed_report(
                "expected exactly three tokens",
            ));
        };
        if tag != "OK" {
            return Err(NavigationError::malformed_report(format!(
                "expected OK acknowledgement tag, got {tag:?}"
            )));
        }
        Ok(Self {
            x: parse_coordinate(x)?,
            y: parse_coordinate(y)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Parse one signed decimal coordinate token.
fn parse_coordinate(token: &str) -> Result<i64, NavigationError> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NavigationError::malformed_report(format!(
            "invalid coordinate {token:?}"
        )));
    }
    token
        .parse()
        .map_err(|_| NavigationError::malformed_report(format!("coordinate {token:?} out of range")))
}

/// Failures raised by the navigation engine.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The coordinate report did not match `OK <x> <y>`.
    #[error("malformed coordinate report: {reason}")]
    MalformedReport {
        /// Description of the deviation.
        reason: String,
    },

    /// A step decision was requested before any coordinate was seen.
    #[error("position unknown: no coordinate report recorded yet")]
    PositionUnknown,

    /// Alignment was required but no heading could be inferred.
    ///
    /// Reachable only when the client keeps reporting identical
    /// coordinates through the forced sidestep, i.e. it violates the
    /// movement contract.
    #[error("heading unknown while aligning toward {desired}")]
    HeadingUnknown {
        /// Axis heading the engine was trying to reach.
        desired: Heading,
    },
}

impl NavigationError {
    fn malformed_report(reason: impl Into<String>) -> Self {
        Self::MalformedReport {
            reason: reason.into(),
        }
    }
}

/// Per-session rover state: coordinate history and inferred heading.
///
/// Owned exclusively by one session; never shared across connections.
#[derive(Debug)]
pub struct Rover {
    name: String,
    position: Option<Position>,
    previous: Option<Position>,
    heading: Option<Heading>,
}

impl Rover {
    /// Create a rover with unknown pose. Name length is validated by
    /// the handshake before construction.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            previous: None,
            heading: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    #[must_use]
    pub fn heading(&self) -> Option<Heading> {
        self.heading
    }

    /// Record a client coordinate report and re-infer heading.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::MalformedReport`] when the report is
    /// not a valid `OK <x> <y>` triple; the session maps this to a
    /// syntax-error response.
    pub fn observe_report(&mut self, report: &str) -> Result<(), NavigationError> {
        let position = Position::parse_report(report)?;
        self.record(position);
        Ok(())
    }

    /// Record an already-parsed coordinate sample.
    pub fn record(&mut self, position: Position) {
        self.previous = self.position;
        self.position = Some(position);
        self.infer_heading();
    }

    /// Whether the two most recent samples differ.
    ///
    /// Before the second sample this is trivially true; after a pure
    /// turn (or a `MOVE` blocked by an obstacle) it is false.
    #[must_use]
    pub fn has_moved(&self) -> bool {
        self.previous != self.position
    }

    /// Infer heading from the displacement between the last two
    /// samples. A change in x takes precedence over a change in y; no
    /// displacement leaves the previous inference in place.
    fn infer_heading(&mut self) {
        let (Some(prev), Some(cur)) = (self.previous, self.position) else {
            return;
        };
        if cur.x > prev.x {
            self.heading = Some(Heading::Right);
        } else if cur.x < prev.x {
            self.heading = Some(Heading::Left);
        } else if cur.y > prev.y {
            self.heading = Some(Heading::Up);
        } else if cur.y < prev.y {
            self.heading = Some(Heading::Down);
        }
    }

    /// Decide the next command toward the origin.
    ///
    /// Mutates the tracked heading when it emits a turn: the turn is
    /// applied optimistically, before the client confirms it, exactly
    /// once per emitted `TURN RIGHT`.
    ///
    /// # Errors
    ///
    /// [`NavigationError::PositionUnknown`] before any sample, and
    /// [`NavigationError::HeadingUnknown`] when alignment is needed
    /// but no displacement has ever been observed. Both map to a
    /// logic-error response.
    pub fn next_command(&mut self) -> Result<Command, NavigationError> {
        let position = self.position.ok_or(NavigationError::PositionUnknown)?;
        if position.x > 0 {
            self.align_or_move(Heading::Left)
        } else if position.x < 0 {
            self.align_or_move(Heading::Right)
        } else if position.y > 0 {
            self.align_or_move(Heading::Down)
        } else if position.y < 0 {
            self.align_or_move(Heading::Up)
        } else {
            Ok(Command::PickUp)
        }
    }

    fn align_or_move(&mut self, desired: Heading) -> Result<Command, NavigationError> {
        match self.heading {
            Some(heading) if heading == desired => Ok(Command::Move),
            Some(heading) => {
                self.heading = Some(heading.clockwise());
                Ok(Command::TurnRight)
            },
            None => Err(NavigationError::HeadingUnknown { desired }),
        }
    }
}
