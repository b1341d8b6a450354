//! End-to-end sessions against a real TCP listener.
//!
//! Each test binds the server on an ephemeral port, connects a
//! scripted or simulated client, and checks the full wire exchange.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use rover_core::navigation::{Heading, Position};
use rover_core::RoverConfig;
use roverd::Server;

const TERM: &[u8] = b"\x07\x08";

async fn start_server() -> std::net::SocketAddr {
    let config = RoverConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        read_timeout_ms: 500,
        recharge_timeout_ms: 1000,
        ..RoverConfig::default()
    };
    let server = Server::bind(&config).await.expect("bind");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(server.run());
    addr
}

/// Client-side frame buffer over the TCP stream.
struct Client {
    stream: TcpStream,
    pending: Vec<u8>,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        Self {
            stream: TcpStream::connect(addr).await.expect("connect"),
            pending: Vec::new(),
        }
    }

    async fn send_frame(&mut self, payload: &str) {
        self.stream.write_all(payload.as_bytes()).await.unwrap();
        self.stream.write_all(TERM).await.unwrap();
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    async fn next_frame(&mut self) -> String {
        loop {
            if let Some(pos) = self.pending.windows(2).position(|w| w == TERM) {
                let frame = String::from_utf8(self.pending[..pos].to_vec()).unwrap();
                self.pending.drain(..pos + 2);
                return frame;
            }
            let mut chunk = [0u8; 256];
            let n = self.stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "server closed before the expected frame");
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }

    async fn expect(&mut self, payload: &str) {
        assert_eq!(self.next_frame().await, payload);
    }

    async fn expect_eof(&mut self) {
        assert!(self.pending.is_empty(), "unconsumed frames: {:?}", self.pending);
        let mut rest = Vec::new();
        self.stream.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty(), "unexpected trailing bytes: {rest:?}");
    }

    async fn authenticate(&mut self, name: &str, key_id: &str, hash: &str, server_hash: &str) {
        self.send_frame(name).await;
        self.expect("107 KEY REQUEST").await;
        self.send_frame(key_id).await;
        self.expect(server_hash).await;
        self.send_frame(hash).await;
        self.expect("200 OK").await;
    }
}

/// Honest simulated rover: applies each command to a virtual pose and
/// reports truthfully. `walls` lists cells a MOVE cannot enter.
struct SimRover {
    pos: Position,
    heading: Heading,
    walls: Vec<Position>,
}

impl SimRover {
    fn target(&self) -> Position {
        match self.heading {
            Heading::Up => Position::new(self.pos.x, self.pos.y + 1),
            Heading::Right => Position::new(self.pos.x + 1, self.pos.y),
            Heading::Down => Position::new(self.pos.x, self.pos.y - 1),
            Heading::Left => Position::new(self.pos.x - 1, self.pos.y),
        }
    }

    /// Apply a server command; returns the coordinate report, or
    /// `None` for `105 GET MESSAGE`.
    fn apply(&mut self, command: &str) -> Option<String> {
        match command {
            "102 MOVE" => {
                let target = self.target();
                if !self.walls.contains(&target) {
                    self.pos = target;
                }
            },
            "103 TURN LEFT" => {
                // Three clockwise quarters.
                self.heading = self.heading.clockwise().clockwise().clockwise();
            },
            "104 TURN RIGHT" => self.heading = self.heading.clockwise(),
            "105 GET MESSAGE" => return None,
            other => panic!("unexpected server command {other:?}"),
        }
        Some(format!("OK {} {}", self.pos.x, self.pos.y))
    }
}

/// Drive a simulated rover until the server asks for the secret.
async fn drive_to_pickup(client: &mut Client, rover: &mut SimRover, step_budget: usize) {
    for _ in 0..step_budget {
        let command = client.next_frame().await;
        match rover.apply(&command) {
            Some(report) => client.send_frame(&report).await,
            None => {
                assert_eq!(rover.pos, Position::new(0, 0), "pickup away from origin");
                return;
            },
        }
    }
    panic!("no pickup within {step_budget} commands");
}

/// The reference exchange: authenticate as Mnau with key 0, report
/// from the origin, collect the logout.
#[tokio::test]
async fn reference_session_reaches_logout() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;
    client.authenticate("Mnau", "0", "39821", "30803").await;

    let mut rover = SimRover {
        pos: Position::new(0, 0),
        heading: Heading::Up,
        walls: Vec::new(),
    };
    drive_to_pickup(&mut client, &mut rover, 32).await;

    client.send_frame("Secret message.").await;
    client.expect("106 LOGOUT").await;
    client.expect_eof().await;
}

#[tokio::test]
async fn navigates_from_offset_spawn() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;
    client.authenticate("Mnau", "0", "39821", "30803").await;

    let mut rover = SimRover {
        pos: Position::new(4, -3),
        heading: Heading::Down,
        walls: Vec::new(),
    };
    drive_to_pickup(&mut client, &mut rover, 64).await;

    client.send_frame("Tajna zprava").await;
    client.expect("106 LOGOUT").await;
    client.expect_eof().await;
}

#[tokio::test]
async fn navigates_around_a_wall() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;
    client.authenticate("Mnau", "0", "39821", "30803").await;

    // After the bootstrap sidestep the rover travels left along
    // y = 1; the wall sits directly on that path.
    let mut rover = SimRover {
        pos: Position::new(3, 0),
        heading: Heading::Left,
        walls: vec![Position::new(1, 1)],
    };
    drive_to_pickup(&mut client, &mut rover, 96).await;

    client.send_frame("Za zdi").await;
    client.expect("106 LOGOUT").await;
    client.expect_eof().await;
}

/// Recharge announcements between messages are invisible to the
/// protocol flow, wherever they appear.
#[tokio::test]
async fn recharge_between_messages_is_absorbed() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send_frame("RECHARGING").await;
    client.send_frame("FULL POWER").await;
    client.send_frame("Mnau").await;
    client.expect("107 KEY REQUEST").await;
    client.send_frame("0").await;
    client.expect("30803").await;
    client.send_frame("RECHARGING").await;
    client.send_frame("FULL POWER").await;
    client.send_frame("39821").await;
    client.expect("200 OK").await;
}

#[tokio::test]
async fn recharge_without_full_power_is_logic_error() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send_frame("RECHARGING").await;
    client.send_frame("Mnau").await;
    client.expect("302 LOGIC ERROR").await;
    client.expect_eof().await;
}

#[tokio::test]
async fn wrong_hash_is_login_failed() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send_frame("Mnau").await;
    client.expect("107 KEY REQUEST").await;
    client.send_frame("0").await;
    client.expect("30803").await;
    client.send_frame("12345").await;
    client.expect("300 LOGIN FAILED").await;
    client.expect_eof().await;
}

#[tokio::test]
async fn oversized_name_is_syntax_error() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    // Streamed without a terminator: framing cuts it off.
    client.send_raw(b"ThisNameIsMuchTooLongForTheProtocol").await;
    client.expect("301 SYNTAX ERROR").await;
    client.expect_eof().await;
}

/// A silent client is dropped after the read timeout with no response.
#[tokio::test]
async fn silent_client_is_dropped_without_response() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    client.expect_eof().await;
}

/// Sessions are independent: one client failing does not disturb a
/// concurrent honest session.
#[tokio::test]
async fn concurrent_sessions_are_isolated() {
    let addr = start_server().await;

    let honest = tokio::spawn(async move {
        let mut client = Client::connect(addr).await;
        client.authenticate("Mnau", "0", "39821", "30803").await;
        let mut rover = SimRover {
            pos: Position::new(-2, 1),
            heading: Heading::Right,
            walls: Vec::new(),
        };
        drive_to_pickup(&mut client, &mut rover, 64).await;
        client.send_frame("Izolace").await;
        client.expect("106 LOGOUT").await;
    });

    let hostile = tokio::spawn(async move {
        let mut client = Client::connect(addr).await;
        client.send_frame("Eve").await;
        client.expect("107 KEY REQUEST").await;
        client.send_frame("99").await;
        client.expect("303 KEY OUT OF RANGE").await;
        client.expect_eof().await;
    });

    honest.await.unwrap();
    hostile.await.unwrap();
}
