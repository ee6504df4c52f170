//! # Serial line abstraction
//!
//! [SerialLink] is the byte stream the transport engine reads and writes through,
//! usually backed by the UART the ESP-AT module is attached to.
//!
//! Every engine owns exactly one link instance for its whole lifetime, so
//! implementations do not need any locking discipline. The only hard requirement
//! is that [SerialLink::read_line] never blocks past its time budget, even when
//! the line terminator never arrives.
use core::fmt::Debug;

/// Byte stream to the ESP-AT module
pub trait SerialLink {
    /// Upstream transport fault, e.g. a UART framing error
    type Error: Debug;

    /// Returns true if at least one byte is buffered and can be read without blocking
    fn data_available(&mut self) -> bool;

    /// Reads bytes into `buffer` until a `\n` byte was consumed, `buffer` is full or
    /// `timeout_ms` expired. Returns the number of bytes written to `buffer`, which
    /// may be zero or a partial line. The line terminator is kept in the buffer.
    fn read_line(&mut self, buffer: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Writes all given bytes. The data is assumed to be flushed eventually.
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}
