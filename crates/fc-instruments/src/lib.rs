//! Instrument and actuator adapters for flowcascade.
//!
//! The control loop only sees the capability traits in [`traits`]. Concrete
//! transports live behind them:
//! - [`tail`]: instrument logs followed like `tail -f` (flow meters, probes)
//! - [`socket`]: line-less text commands over TCP (pumps, valve, balance,
//!   pressure transmitter)
//! - [`manual`]: in-memory stand-ins for tests and dry runs

pub mod error;
pub mod manual;
pub mod reading;
pub mod socket;
pub mod streaming;
pub mod tail;
pub mod traits;

pub use error::{InstrumentError, InstrumentResult};
pub use manual::{FixedBalance, ManualInstrument, RecordingPump, RecordingValve};
pub use reading::ReadingCell;
pub use socket::{SocketBalance, SocketPump, SocketQuerySource, SocketValve};
pub use streaming::{SampleSource, StreamingInstrument, StreamingOptions};
pub use tail::{FlowMeterParser, LineParser, TailSource, TemperatureParser};
pub use traits::{BalanceReading, Instrument, MassBalance, OperatingRange, Pump, Subscriber, Valve};
