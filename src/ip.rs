//! # TCP/UDP session operations
//!
//! Single connection mode only: the commands operate on the one implicit link of
//! the firmware, multi-connection (`AT+CIPMUX=1`) session management is not
//! implemented.
//!
//! ## Example
//!
//! ````
//! use esp_at_client::example::{ExampleSerialLink, ExampleTimer};
//! use esp_at_client::ip::LinkProtocol;
//! use esp_at_client::wifi::Adapter;
//!
//! let link = ExampleSerialLink::default();
//! let mut adapter: Adapter<_, _, 1_000_000, 128, 16> = Adapter::new(link, ExampleTimer::default());
//!
//! adapter.connect_remote(LinkProtocol::Tcp, "10.0.0.1", 21).unwrap();
//! adapter.send_data(b"hallo!").unwrap();
//! adapter.close_connection().unwrap();
//! ````
use crate::commands::{self, CommandArg};
use crate::serial::SerialLink;
use crate::transport::{ReplyLines, Error as AtError};
use crate::wifi::Adapter;
use fugit_timer::Timer;

/// Transport protocol of a connection
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkProtocol {
    Tcp,
    Udp,
}

impl LinkProtocol {
    fn label(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

impl<S: SerialLink, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const LINE_SIZE: usize, const MAX_LINES: usize>
    Adapter<S, T, TIMER_HZ, LINE_SIZE, MAX_LINES>
{
    /// Queries the connection status as raw reply lines
    pub fn get_connection_status(&mut self) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, AtError<S::Error>> {
        self.transport.execute(commands::CONNECTION_STATUS, 0)
    }

    /// Starts a TCP connection or UDP transmission to the given remote
    pub fn connect_remote(&mut self, protocol: LinkProtocol, host: &str, port: u16) -> Result<(), AtError<S::Error>> {
        self.transport.set(
            commands::CONNECTION_START,
            &[
                CommandArg::Str(protocol.label()),
                CommandArg::Str(host),
                CommandArg::Int(port as i32),
            ],
            0,
        )?;

        Ok(())
    }

    /// Sends data over the current connection: announces the length via
    /// `AT+CIPSEND` and pushes the payload bytes once the firmware switched to
    /// data mode.
    pub fn send_data(&mut self, data: &[u8]) -> Result<(), AtError<S::Error>> {
        self.transport
            .set(commands::CONNECTION_SEND, &[CommandArg::Int(data.len() as i32)], 0)?;
        self.transport.write_raw(data)
    }

    /// Closes the current connection
    pub fn close_connection(&mut self) -> Result<(), AtError<S::Error>> {
        self.transport.execute(commands::CONNECTION_CLOSE, 0)?;
        Ok(())
    }

    /// Queries the local IP address as raw reply lines
    pub fn get_local_ip(&mut self) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, AtError<S::Error>> {
        self.transport.execute(commands::LOCAL_IP, 0)
    }

    /// Pings the given address or hostname and returns the raw reply lines
    pub fn ping(&mut self, destination: &str) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, AtError<S::Error>> {
        self.transport.set(commands::PING, &[CommandArg::Str(destination)], 0)
    }
}
