//! Command and response values and their wire codecs.

use crate::reading::Reading;
use crate::term::{TermError, TermReader, TermWriter};

/// A decoded request. `{read, TimeoutMs}` is the only command the port
/// understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Read { timeout_ms: u64 },
}

/// Reply to a [`Command::Read`]: `{ok, Humidity, Temperature}` on a verified
/// reading, `{timeout}` when the deadline expired first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ok(Reading),
    Timeout,
}

/// Faults raised while interpreting a request frame. All of them are fatal
/// to the dispatch loop.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed term: {0}")]
    Term(#[from] TermError),
    #[error("unhandled command {0:?}")]
    UnknownCommand(String),
    #[error("read command with invalid arity {0}")]
    BadArity(u32),
}

/// Decodes one request payload into a [`Command`].
pub fn decode_command(payload: &[u8]) -> Result<Command, ProtocolError> {
    let mut reader = TermReader::new(payload);
    reader.read_version()?;
    let arity = reader.read_tuple_header()?;
    let key = reader.read_atom()?;
    match key {
        "read" => {
            if arity != 2 {
                return Err(ProtocolError::BadArity(arity));
            }
            let timeout_ms = reader.read_unsigned()?;
            Ok(Command::Read { timeout_ms })
        }
        other => Err(ProtocolError::UnknownCommand(other.to_owned())),
    }
}

/// Encodes one [`Response`] into a payload ready for framing.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut writer = TermWriter::new();
    match response {
        Response::Ok(reading) => {
            writer
                .tuple_header(3)
                .atom("ok")
                .unsigned(reading.humidity as u64)
                .signed(reading.temperature as i64);
        }
        Response::Timeout => {
            writer.tuple_header(1).atom("timeout");
        }
    }
    writer.into_bytes()
}
