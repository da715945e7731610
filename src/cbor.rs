//! Minimal CBOR writer for the heartbeat event format.
//!
//! Covers exactly the subset the wire contract uses: definite-length maps,
//! arrays and text strings, unsigned integers, and negative integers, all
//! with 32-bit magnitudes. Values are always emitted in their shortest
//! encoding, which is what the remote decoder expects.

/// Returned by a [`CborSink`] that cannot accept more bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFull;

/// Destination for encoded bytes.
///
/// The serializer stages bytes into a storage transaction; the worst-case
/// estimator only counts them. Both run the same encoding path.
pub trait CborSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkFull>;
}

/// Sink that discards bytes and tracks the total that would be written.
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeSink {
    total: usize,
}

impl SizeSink {
    pub const fn new() -> Self {
        Self { total: 0 }
    }

    /// Number of bytes written so far.
    pub const fn total(&self) -> usize {
        self.total
    }
}

impl CborSink for SizeSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkFull> {
        self.total += bytes.len();
        Ok(())
    }
}

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

/// Widest encoding of a 32-bit unsigned integer (initial byte + 4 bytes).
pub const MAX_U32_ENCODED_LEN: usize = 5;

/// Widest encoding of a 32-bit signed integer. The negative range maps onto
/// a 32-bit magnitude, so the width matches the unsigned case.
pub const MAX_I32_ENCODED_LEN: usize = 5;

/// Streaming CBOR writer over a [`CborSink`].
pub struct CborWriter<S: CborSink> {
    sink: S,
}

impl<S: CborSink> CborWriter<S> {
    pub const fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Encodes an unsigned integer.
    pub fn unsigned(&mut self, value: u32) -> Result<(), SinkFull> {
        self.initial_byte_and_arg(MAJOR_UNSIGNED, value)
    }

    /// Encodes a signed integer. Negative values use the dedicated major
    /// type, which carries `-(n + 1)` as an unsigned magnitude.
    pub fn signed(&mut self, value: i32) -> Result<(), SinkFull> {
        if value < 0 {
            // Two's complement: !(value as u32) == -(value + 1) for value < 0.
            self.initial_byte_and_arg(MAJOR_NEGATIVE, !(value as u32))
        } else {
            self.initial_byte_and_arg(MAJOR_UNSIGNED, value as u32)
        }
    }

    /// Encodes a definite-length text string.
    pub fn text(&mut self, value: &str) -> Result<(), SinkFull> {
        self.initial_byte_and_arg(MAJOR_TEXT, value.len() as u32)?;
        self.sink.write(value.as_bytes())
    }

    /// Emits a definite-length map header for `len` key/value pairs.
    pub fn map_header(&mut self, len: usize) -> Result<(), SinkFull> {
        self.initial_byte_and_arg(MAJOR_MAP, len as u32)
    }

    /// Emits a definite-length array header for `len` elements.
    pub fn array_header(&mut self, len: usize) -> Result<(), SinkFull> {
        self.initial_byte_and_arg(MAJOR_ARRAY, len as u32)
    }

    /// Emits the initial byte for `major` with argument `arg` in its
    /// shortest form, followed by the big-endian argument bytes if any.
    fn initial_byte_and_arg(&mut self, major: u8, arg: u32) -> Result<(), SinkFull> {
        let m = major << 5;
        if arg < 24 {
            self.sink.write(&[m | arg as u8])
        } else if arg <= 0xff {
            self.sink.write(&[m | 24, arg as u8])
        } else if arg <= 0xffff {
            let b = (arg as u16).to_be_bytes();
            self.sink.write(&[m | 25, b[0], b[1]])
        } else {
            let b = arg.to_be_bytes();
            self.sink.write(&[m | 26, b[0], b[1], b[2], b[3]])
        }
    }
}
