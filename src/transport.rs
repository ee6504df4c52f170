//! # AT transport engine
//!
//! [Transport] serializes a command, writes it to the serial link, waits a bounded
//! amount of time for the reply and classifies the outcome based on the terminal
//! tokens `OK`, `ERROR` and `FAIL`.
//!
//! The wait protocol has two phases. Phase one is a fixed one second budget of
//! 10 ms ticks during which every buffered line is collected. Long running
//! commands (scans, HTTP fetches) may deliver an open ended number of lines
//! afterwards, so if no terminal token was seen yet, a second extended phase
//! (5 s by default, caller overridable) keeps collecting until `OK`, `FAIL` or
//! budget exhaustion. Exhaustion without a terminal token is a *soft timeout*:
//! the collected lines are returned as-is, since several long running commands
//! never emit a terminal token at all.
//!
//! Reply lines are stored verbatim including their line terminators. Trimming is
//! only applied when comparing against the terminal tokens.
//!
//! ## Example
//!
//! ````
//! use esp_at_client::example::{ExampleSerialLink, ExampleTimer};
//! use esp_at_client::transport::Transport;
//!
//! let link = ExampleSerialLink::default();
//! let mut transport: Transport<_, _, 1_000_000, 128, 16> = Transport::new(link, ExampleTimer::default());
//!
//! let lines = transport.execute(b"AT", 0).unwrap();
//! assert!(lines.is_empty());
//! ````
use crate::commands::{serialize_args, CommandArg};
use crate::serial::SerialLink;
use core::fmt::Debug;
use fugit::ExtU32;
use fugit_timer::Timer;
use heapless::Vec;

/// A single raw reply line, trailing terminator included
pub type ReplyLine<const LINE_SIZE: usize> = Vec<u8, LINE_SIZE>;

/// The ordered reply lines of one command invocation
pub type ReplyLines<const LINE_SIZE: usize, const MAX_LINES: usize> = Vec<ReplyLine<LINE_SIZE>, MAX_LINES>;

/// Sub-wait tick length in ms
const TICK_MS: u32 = 10;

/// Phase one budget: 100 ticks of 10 ms each
const INITIAL_TICKS: u32 = 100;

/// Extended phase default budget: 500 ticks of 10 ms each
const EXTENDED_TICKS: u32 = 500;

/// Time budget for reading a single line
const LINE_READ_TIMEOUT_MS: u32 = 100;

/// Max. wait for the first boot message after a restart: 500 ticks of 10 ms each
const BOOT_WAIT_TICKS: u32 = 500;

/// Boot message collection window: 300 ticks of 20 ms each
const BOOT_WINDOW_TICKS: u32 = 300;

/// Transport and protocol faults
#[derive(Clone, Debug, PartialEq)]
pub enum Error<E: Debug> {
    /// The caller passed an empty command. Programmer error, nothing was written.
    EmptyCommand,

    /// The firmware replied with `ERROR`
    Protocol,

    /// The firmware replied with `FAIL` during the extended phase
    Failed,

    /// A query reply contained fewer than two lines
    TruncatedReply,

    /// Command, line or reply buffer capacity exceeded
    Overflow,

    /// Upstream serial link error
    Link(E),

    /// Upstream timer error
    TimerFault,
}

/// AT command engine owning the serial link
///
/// LINE_SIZE: Max. length in bytes of a single command or reply line.
///
/// MAX_LINES: Max. number of reply lines collected per command.
pub struct Transport<S: SerialLink, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const LINE_SIZE: usize, const MAX_LINES: usize>
{
    /// Serial link to the ESP-AT module, exclusively owned
    pub(crate) link: S,

    /// Timer used for all bounded sub-waits
    timer: T,
}

impl<S: SerialLink, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const LINE_SIZE: usize, const MAX_LINES: usize>
    Transport<S, T, TIMER_HZ, LINE_SIZE, MAX_LINES>
{
    pub fn new(link: S, timer: T) -> Self {
        Self { link, timer }
    }

    /// Sends an execute type command (`NAME`) and returns all reply lines which are
    /// neither command echo nor status frame.
    ///
    /// `extended_timeout_ms` overrides the extended phase budget, zero selects the
    /// 5 s default.
    pub fn execute(
        &mut self,
        command: &[u8],
        extended_timeout_ms: u32,
    ) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, Error<S::Error>> {
        let lines = self.transact(command, extended_timeout_ms)?;
        Ok(Self::strip_frame(lines))
    }

    /// Sends a set type command (`NAME=arg,arg,...`), same trimming rule as [Self::execute].
    ///
    /// This command type usually replies with echo and status frame only, so the
    /// result is an empty list in most cases.
    pub fn set(
        &mut self,
        command: &[u8],
        args: &[CommandArg<'_>],
        extended_timeout_ms: u32,
    ) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, Error<S::Error>> {
        let mut frame: Vec<u8, LINE_SIZE> = Vec::from_slice(command).map_err(|_| Error::Overflow)?;
        frame.push(b'=').map_err(|_| Error::Overflow)?;

        let arg_string: Vec<u8, LINE_SIZE> = serialize_args(args).map_err(|_| Error::Overflow)?;
        frame.extend_from_slice(&arg_string).map_err(|_| Error::Overflow)?;

        let lines = self.transact(&frame, extended_timeout_ms)?;
        Ok(Self::strip_frame(lines))
    }

    /// Sends a query type command (`NAME?`) and returns the line containing the
    /// queried parameter (reply index 1, right after the command echo), trimmed of
    /// trailing whitespace.
    pub fn query(
        &mut self,
        command: &[u8],
        extended_timeout_ms: u32,
    ) -> Result<ReplyLine<LINE_SIZE>, Error<S::Error>> {
        let mut frame: Vec<u8, LINE_SIZE> = Vec::from_slice(command).map_err(|_| Error::Overflow)?;
        frame.push(b'?').map_err(|_| Error::Overflow)?;

        let lines = self.transact(&frame, extended_timeout_ms)?;
        let line = lines.get(1).ok_or(Error::TruncatedReply)?;

        // from_slice can not fail, the trimmed line originates from a vector of the same bound
        ReplyLine::from_slice(trim_line(line)).map_err(|_| Error::Overflow)
    }

    /// Sends the raw command and collects the reply lines.
    ///
    /// An explicit `ERROR` or `FAIL` token is raised as a fault and discards all
    /// collected output. Absence of any terminal token is a soft timeout: the
    /// (possibly empty) line list is returned and left to the caller to interpret.
    pub fn transact(
        &mut self,
        command: &[u8],
        extended_timeout_ms: u32,
    ) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, Error<S::Error>> {
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }

        let mut frame: Vec<u8, LINE_SIZE> = Vec::from_slice(command).map_err(|_| Error::Overflow)?;
        frame.extend_from_slice(b"\r\n").map_err(|_| Error::Overflow)?;

        #[cfg(feature = "log")]
        log::trace!("TX: {}", core::str::from_utf8(&frame).unwrap_or("<binary>"));

        self.link.write(&frame).map_err(Error::Link)?;

        let mut lines = Vec::new();
        let mut okay = false;

        // Phase one: fixed one second budget. 'OK' does not stop the collection,
        // echo and status can interleave with payload still buffered by the UART.
        let mut budget = INITIAL_TICKS;
        while budget > 0 {
            if self.link.data_available() {
                okay |= self.collect_line(&mut lines)?;
            } else {
                self.wait_ms(TICK_MS)?;
            }
            budget -= 1;
        }

        // The final status line can arrive slightly after the fixed budget expired,
        // so drain everything that is buffered by now.
        while self.link.data_available() {
            okay |= self.collect_line(&mut lines)?;
        }

        if lines.is_empty() {
            #[cfg(feature = "log")]
            log::warn!("RX timeout, no answer after sending AT command");

            return Ok(lines);
        }

        let last = trim_line(lines.last().ok_or(Error::Overflow)?);
        if last == b"ERROR" {
            return Err(Error::Protocol);
        }

        if last == b"OK" {
            okay = true;
        }

        if !okay {
            // Extended phase for long running commands which yield their output (and
            // maybe a terminal token) with an open ended delay.
            let mut budget = if extended_timeout_ms == 0 {
                EXTENDED_TICKS
            } else {
                extended_timeout_ms / TICK_MS
            };

            while budget > 0 {
                if self.link.data_available() {
                    if self.collect_line(&mut lines)? {
                        return Ok(lines);
                    }

                    if let Some(line) = lines.last() {
                        if trim_line(line) == b"FAIL" {
                            return Err(Error::Failed);
                        }
                    }
                } else {
                    self.wait_ms(TICK_MS)?;
                }
                budget -= 1;
            }

            #[cfg(feature = "log")]
            log::warn!("RX timeout without 'OK' in extended phase");
        }

        Ok(lines)
    }

    /// Collects the boot log after a restart: waits up to 5 s for the first
    /// message, then reads every line appearing within a fixed 6 s window.
    pub fn collect_startup_lines(&mut self) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, Error<S::Error>> {
        let mut lines = Vec::new();

        let mut budget = BOOT_WAIT_TICKS;
        while !self.link.data_available() && budget > 0 {
            self.wait_ms(TICK_MS)?;
            budget -= 1;
        }

        let mut budget = BOOT_WINDOW_TICKS;
        while budget > 0 {
            if self.link.data_available() {
                self.collect_line(&mut lines)?;
            }

            self.wait_ms(2 * TICK_MS)?;
            budget -= 1;
        }

        Ok(lines)
    }

    /// Writes raw bytes to the link, bypassing command framing. Used for the data
    /// phase of a transmission.
    pub fn write_raw(&mut self, data: &[u8]) -> Result<(), Error<S::Error>> {
        self.link.write(data).map_err(Error::Link)
    }

    /// Reads one line, appends it raw and returns true if the trimmed line equals `OK`
    fn collect_line(&mut self, lines: &mut ReplyLines<LINE_SIZE, MAX_LINES>) -> Result<bool, Error<S::Error>> {
        let mut buffer = [0x0; LINE_SIZE];
        let length = self
            .link
            .read_line(&mut buffer, LINE_READ_TIMEOUT_MS)
            .map_err(Error::Link)?;

        #[cfg(feature = "log")]
        log::trace!("RX: {}", core::str::from_utf8(&buffer[..length]).unwrap_or("<binary>"));

        let line = ReplyLine::from_slice(&buffer[..length]).map_err(|_| Error::Overflow)?;
        let okay = trim_line(&line) == b"OK";
        lines.push(line).map_err(|_| Error::Overflow)?;
        Ok(okay)
    }

    /// Blocks for the given duration using the timer
    fn wait_ms(&mut self, duration_ms: u32) -> Result<(), Error<S::Error>> {
        self.timer.start(duration_ms.millis()).map_err(|_| Error::TimerFault)?;

        loop {
            match self.timer.wait() {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(Error::TimerFault),
            }
        }
    }

    /// Drops the command echo (first line) and the status frame (last two lines).
    ///
    /// A reply with fewer than three lines yields an empty result, not a fault.
    /// The firmware is trusted to always echo and to always terminate with exactly
    /// two non-payload lines; downstream decoders rely on this exact slicing.
    fn strip_frame(lines: ReplyLines<LINE_SIZE, MAX_LINES>) -> ReplyLines<LINE_SIZE, MAX_LINES> {
        let mut payload = Vec::new();

        if lines.len() < 3 {
            return payload;
        }

        for line in &lines[1..lines.len() - 2] {
            // capacity can not be exceeded, the source vector has the same bound
            let _ = payload.push(line.clone());
        }

        payload
    }
}

/// Returns the start index of the first occurrence of `needle`
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Parses a decimal number field, tolerating surrounding whitespace
pub(crate) fn parse_decimal<N: core::str::FromStr>(field: &[u8]) -> Option<N> {
    core::str::from_utf8(field).ok()?.trim().parse().ok()
}

/// Strips trailing whitespace including the line terminator
pub(crate) fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();

    while end > 0 && line[end - 1].is_ascii_whitespace() {
        end -= 1;
    }

    &line[..end]
}
