//! Minimal reader/writer for the Erlang external term format.
//!
//! Only the term shapes the port protocol uses are supported: the version
//! tag, tuples, atoms, and integers. Emitted bytes match what current `ei`
//! and `term_to_binary` produce, and the reader additionally accepts the
//! legacy atom encodings, so frames stay bit-compatible with the peer.

/// Leading byte of every encoded term.
pub const VERSION_MAGIC: u8 = 131;

const SMALL_INTEGER_EXT: u8 = 97;
const INTEGER_EXT: u8 = 98;
const ATOM_EXT: u8 = 100;
const SMALL_TUPLE_EXT: u8 = 104;
const LARGE_TUPLE_EXT: u8 = 105;
const SMALL_BIG_EXT: u8 = 110;
const SMALL_ATOM_EXT: u8 = 115;
const ATOM_UTF8_EXT: u8 = 118;
const SMALL_ATOM_UTF8_EXT: u8 = 119;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TermError {
    #[error("term ends unexpectedly")]
    Truncated,
    #[error("unsupported version tag {0}")]
    BadVersion(u8),
    #[error("unexpected term tag {0}")]
    UnexpectedTag(u8),
    #[error("atom is not valid UTF-8")]
    BadAtom,
    #[error("integer does not fit the expected range")]
    IntegerOutOfRange,
}

/// Cursor over one encoded term.
pub struct TermReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TermReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        TermReader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TermError> {
        let end = self.pos.checked_add(n).ok_or(TermError::Truncated)?;
        let bytes = self.buf.get(self.pos..end).ok_or(TermError::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn byte(&mut self) -> Result<u8, TermError> {
        Ok(self.take(1)?[0])
    }

    /// Consumes the leading version tag.
    pub fn read_version(&mut self) -> Result<(), TermError> {
        match self.byte()? {
            VERSION_MAGIC => Ok(()),
            other => Err(TermError::BadVersion(other)),
        }
    }

    /// Consumes a tuple header, returning its arity.
    pub fn read_tuple_header(&mut self) -> Result<u32, TermError> {
        match self.byte()? {
            SMALL_TUPLE_EXT => Ok(self.byte()? as u32),
            LARGE_TUPLE_EXT => {
                let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
                Ok(u32::from_be_bytes(bytes))
            }
            other => Err(TermError::UnexpectedTag(other)),
        }
    }

    /// Consumes an atom in any of its encodings.
    pub fn read_atom(&mut self) -> Result<&'a str, TermError> {
        let len = match self.byte()? {
            ATOM_EXT | ATOM_UTF8_EXT => {
                let bytes: [u8; 2] = self.take(2)?.try_into().unwrap();
                u16::from_be_bytes(bytes) as usize
            }
            SMALL_ATOM_EXT | SMALL_ATOM_UTF8_EXT => self.byte()? as usize,
            other => return Err(TermError::UnexpectedTag(other)),
        };
        core::str::from_utf8(self.take(len)?).map_err(|_| TermError::BadAtom)
    }

    /// Consumes a non-negative integer, in any encoding `ei` would accept
    /// for an unsigned long.
    pub fn read_unsigned(&mut self) -> Result<u64, TermError> {
        match self.byte()? {
            SMALL_INTEGER_EXT => Ok(self.byte()? as u64),
            INTEGER_EXT => {
                let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
                u64::try_from(i32::from_be_bytes(bytes)).map_err(|_| TermError::IntegerOutOfRange)
            }
            SMALL_BIG_EXT => {
                let len = self.byte()? as usize;
                let sign = self.byte()?;
                let digits = self.take(len)?;
                if sign != 0 || len > 8 {
                    return Err(TermError::IntegerOutOfRange);
                }
                // Digits are little-endian.
                let mut value = 0u64;
                for (i, digit) in digits.iter().enumerate() {
                    value |= (*digit as u64) << (8 * i);
                }
                Ok(value)
            }
            other => Err(TermError::UnexpectedTag(other)),
        }
    }
}

/// Builder for one encoded term, version tag included.
pub struct TermWriter {
    buf: Vec<u8>,
}

impl TermWriter {
    pub fn new() -> Self {
        TermWriter {
            buf: vec![VERSION_MAGIC],
        }
    }

    pub fn tuple_header(&mut self, arity: u8) -> &mut Self {
        self.buf.push(SMALL_TUPLE_EXT);
        self.buf.push(arity);
        self
    }

    /// Appends an atom. Names longer than 255 bytes are not representable
    /// in the small encoding and are not used by this protocol.
    pub fn atom(&mut self, name: &str) -> &mut Self {
        debug_assert!(name.len() <= u8::MAX as usize);
        self.buf.push(SMALL_ATOM_UTF8_EXT);
        self.buf.push(name.len() as u8);
        self.buf.extend_from_slice(name.as_bytes());
        self
    }

    pub fn unsigned(&mut self, value: u64) -> &mut Self {
        if value <= u8::MAX as u64 {
            self.buf.push(SMALL_INTEGER_EXT);
            self.buf.push(value as u8);
        } else if let Ok(value) = i32::try_from(value) {
            self.buf.push(INTEGER_EXT);
            self.buf.extend_from_slice(&value.to_be_bytes());
        } else {
            self.small_big(value, false);
        }
        self
    }

    pub fn signed(&mut self, value: i64) -> &mut Self {
        if let Ok(value) = u8::try_from(value) {
            self.buf.push(SMALL_INTEGER_EXT);
            self.buf.push(value);
        } else if let Ok(value) = i32::try_from(value) {
            self.buf.push(INTEGER_EXT);
            self.buf.extend_from_slice(&value.to_be_bytes());
        } else {
            self.small_big(value.unsigned_abs(), value < 0);
        }
        self
    }

    fn small_big(&mut self, magnitude: u64, negative: bool) {
        let digits = magnitude.to_le_bytes();
        let len = digits.iter().rposition(|b| *b != 0).map_or(1, |i| i + 1);
        self.buf.push(SMALL_BIG_EXT);
        self.buf.push(len as u8);
        self.buf.push(negative as u8);
        self.buf.extend_from_slice(&digits[..len]);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for TermWriter {
    fn default() -> Self {
        Self::new()
    }
}
