//! The dispatch loop: one framed command in, one framed response out.

use std::io::{Read, Write};

use log::{info, warn};

use crate::error::PortError;
use crate::frame::{read_frame, write_frame};
use crate::proto::{Command, Response, decode_command, encode_response};

/// Seam between the dispatch loop and the sensor machinery, so the loop can
/// be exercised without hardware.
pub trait ReadHandler {
    fn handle_read(&mut self, timeout_ms: u64) -> Response;
}

/// Runs the dispatch loop until the request stream closes.
///
/// Exactly one command is in flight at a time. A clean end of stream returns
/// `Ok`; any protocol or I/O fault aborts the loop, leaving the diagnostics
/// to the caller.
pub fn run<H, R, W>(handler: &mut H, input: &mut R, output: &mut W) -> Result<(), PortError>
where
    H: ReadHandler,
    R: Read,
    W: Write,
{
    while let Some(payload) = read_frame(input)? {
        let Command::Read { timeout_ms } = decode_command(&payload)?;
        info!("received {{read, {timeout_ms}}}");

        let response = handler.handle_read(timeout_ms);
        match &response {
            Response::Ok(reading) => info!(
                "successful read: {:.1}% RH, {:.1} deg C",
                reading.relative_humidity(),
                reading.temperature_celsius()
            ),
            Response::Timeout => warn!("sensor read timed out"),
        }

        write_frame(output, &encode_response(&response))?;
    }
    Ok(())
}
