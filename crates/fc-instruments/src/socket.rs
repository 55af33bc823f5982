//! Text-over-TCP adapters for the actuator gateway.
//!
//! Each device listens on its own port. Commands are sent as bare UTF-8
//! strings without framing; queries expect a single JSON reply of at most
//! one kilobyte.

use crate::error::{InstrumentError, InstrumentResult};
use crate::streaming::SampleSource;
use crate::traits::{BalanceReading, MassBalance, Pump, Valve, clamp_percent};
use fc_core::lock_or_recover;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REPLY_LIMIT: usize = 1024;

/// One connected TCP stream, serialised behind a mutex.
#[derive(Debug)]
struct Connection {
    peer: String,
    stream: Mutex<TcpStream>,
}

impl Connection {
    fn open(host: &str, port: u16, timeout: Duration) -> InstrumentResult<Self> {
        let peer = format!("{host}:{port}");
        let connect_err = |source| InstrumentError::Connect {
            what: peer.clone(),
            source,
        };
        let addrs = (host, port).to_socket_addrs().map_err(connect_err)?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    tracing::info!(%peer, "connected");
                    return Ok(Self {
                        peer,
                        stream: Mutex::new(stream),
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(connect_err(last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no address")
        })))
    }

    fn send(&self, message: &str) -> InstrumentResult<()> {
        lock_or_recover(&self.stream)
            .write_all(message.as_bytes())
            .map_err(|e| InstrumentError::from_socket(&self.peer, e))
    }

    fn query(&self, message: &str) -> InstrumentResult<String> {
        let mut stream = lock_or_recover(&self.stream);
        stream
            .write_all(message.as_bytes())
            .map_err(|e| InstrumentError::from_socket(&self.peer, e))?;
        let mut buf = [0u8; REPLY_LIMIT];
        let n = stream
            .read(&mut buf)
            .map_err(|e| InstrumentError::from_socket(&self.peer, e))?;
        if n == 0 {
            return Err(InstrumentError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("{} closed the connection", self.peer),
            )));
        }
        Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
    }
}

/// Pump speed is sent as the decimal text of the clamped percentage.
#[derive(Debug)]
pub struct SocketPump {
    name: String,
    conn: Connection,
    speed: Mutex<f64>,
}

impl SocketPump {
    pub fn connect(name: impl Into<String>, host: &str, port: u16) -> InstrumentResult<Self> {
        Ok(Self {
            name: name.into(),
            conn: Connection::open(host, port, CONNECT_TIMEOUT)?,
            speed: Mutex::new(0.0),
        })
    }
}

impl Pump for SocketPump {
    fn name(&self) -> &str {
        &self.name
    }

    fn speed_percent(&self) -> f64 {
        *lock_or_recover(&self.speed)
    }

    fn set_speed_percent(&self, percent: f64) -> InstrumentResult<()> {
        let value = clamp_percent(percent);
        self.conn.send(&format!("{value:?}"))?;
        *lock_or_recover(&self.speed) = value;
        Ok(())
    }
}

/// Valve state is sent as `True` (collection) or `False` (waste).
#[derive(Debug)]
pub struct SocketValve {
    conn: Connection,
    open: Mutex<bool>,
}

impl SocketValve {
    pub fn connect(host: &str, port: u16) -> InstrumentResult<Self> {
        Ok(Self {
            conn: Connection::open(host, port, CONNECT_TIMEOUT)?,
            open: Mutex::new(false),
        })
    }
}

impl Valve for SocketValve {
    fn is_open(&self) -> bool {
        *lock_or_recover(&self.open)
    }

    fn set_open(&self, open: bool) -> InstrumentResult<()> {
        self.conn.send(if open { "True" } else { "False" })?;
        *lock_or_recover(&self.open) = open;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SocketBalance {
    conn: Connection,
}

impl SocketBalance {
    pub fn connect(host: &str, port: u16) -> InstrumentResult<Self> {
        Ok(Self {
            conn: Connection::open(host, port, CONNECT_TIMEOUT)?,
        })
    }
}

impl MassBalance for SocketBalance {
    fn read(&self) -> InstrumentResult<BalanceReading> {
        let reply = self.conn.query("GetMass")?;
        Ok(serde_json::from_str(&reply)?)
    }
}

/// Polls a gateway value by sending a fixed query and reading a JSON number,
/// e.g. the pressure transmitter's `GetValue`.
#[derive(Debug)]
pub struct SocketQuerySource {
    conn: Connection,
    query: String,
}

impl SocketQuerySource {
    pub fn connect(host: &str, port: u16, query: impl Into<String>) -> InstrumentResult<Self> {
        Ok(Self {
            conn: Connection::open(host, port, CONNECT_TIMEOUT)?,
            query: query.into(),
        })
    }
}

impl SampleSource for SocketQuerySource {
    fn next_sample(&mut self) -> InstrumentResult<Option<f64>> {
        let reply = self.conn.query(&self.query)?;
        let value: Option<f64> = serde_json::from_str(&reply)?;
        Ok(value)
    }
}
