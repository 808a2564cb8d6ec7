use crate::proto::ProtocolError;

/// Possible errors from one DHT22 decode attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// Fewer than 40 data bits were recovered before the sensor went quiet.
    InsufficientData {
        /// Bits decoded before the attempt was abandoned.
        bits: u8,
    },
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

/// Faults that abort the dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The request stream failed mid-frame or the response stream broke.
    #[error("stream I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The peer sent a frame this port cannot interpret.
    #[error("protocol fault: {0}")]
    Protocol(#[from] ProtocolError),
}
