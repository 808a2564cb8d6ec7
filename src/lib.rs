//! Erlang port program for the DHT22 (AM2302) temperature and humidity
//! sensor.
//!
//! The crate bit-bangs the sensor's single-wire protocol on a GPIO line and
//! answers `{read, TimeoutMs}` commands arriving as length-prefixed external
//! term frames on one byte stream with `{ok, Humidity, Temperature}` or
//! `{timeout}` frames on another.
//!
//! # Layers
//! - [`dht22`]: edge decoder recovering 40 raw bits from pulse widths,
//!   generic over the [`embedded-hal`] `InputPin`/`OutputPin`/`DelayNs`
//!   traits so it runs against any HAL or a mock
//! - [`reading`]: checksum verification and conversion to tenths units
//! - [`scheduler`]: attempt spacing, retries, and the caller's deadline
//! - [`frame`], [`term`], [`proto`]: the framed term protocol
//! - [`port`]: the dispatch loop tying a stream pair to the scheduler
//! - [`hal`]: Raspberry Pi pin and delay implementations for the binary
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

pub mod dht22;
pub mod error;
pub mod frame;
pub mod hal;
pub mod port;
pub mod proto;
pub mod reading;
pub mod scheduler;
pub mod term;

pub use dht22::Dht22;
pub use error::{DhtError, PortError};
pub use proto::{Command, Response};
pub use reading::{RawSample, Reading};
pub use scheduler::{Clock, ReadScheduler, Sensor, SystemClock};
