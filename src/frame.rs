//! Length-prefixed framing over the request/response byte streams.
//!
//! Every message travels as a 2-byte big-endian length followed by exactly
//! that many payload bytes. Reads and writes retry partial transfers until
//! the full count has moved; end-of-stream during a read means the peer
//! closed the port and is not an error.

use std::io::{self, Read, Write};

/// Size of the length prefix.
pub const LENGTH_BYTES: usize = 2;

/// Reads one frame, returning `None` on end-of-stream.
///
/// EOF anywhere, including mid-payload, is treated as a closed stream, the
/// way the controlling process tears a port down. Genuine I/O errors
/// propagate.
pub fn read_frame<R: Read>(input: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut header = [0u8; LENGTH_BYTES];
    if !read_exact_or_eof(input, &mut header)? {
        return Ok(None);
    }

    let length = u16::from_be_bytes(header) as usize;
    let mut payload = vec![0u8; length];
    if !read_exact_or_eof(input, &mut payload)? {
        return Ok(None);
    }

    Ok(Some(payload))
}

/// Writes one frame and flushes it so the peer sees the response promptly.
pub fn write_frame<W: Write>(output: &mut W, payload: &[u8]) -> io::Result<()> {
    let length = u16::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "frame payload exceeds the 16-bit length prefix",
        )
    })?;

    output.write_all(&length.to_be_bytes())?;
    output.write_all(payload)?;
    output.flush()
}

/// Fills `buf` completely, reporting `false` if the stream ended first.
fn read_exact_or_eof<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut got = 0;
    while got < buf.len() {
        match input.read(&mut buf[got..]) {
            Ok(0) => return Ok(false),
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}
