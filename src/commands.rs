//! # AT command catalogue and argument serialization
//!
//! The catalogue maps operation names to the ASCII command bytes of the ESP-AT
//! firmware. The tables are read-only; nothing mutates them at runtime.
//!
//! [serialize_args] implements the argument grammar of set commands: arguments
//! are joined with `,`, strings are double-quoted verbatim, raw bytes are
//! inserted unquoted, booleans map to `1`/`0` and omitted arguments are skipped
//! entirely.
use heapless::Vec;
use numtoa::NumToA;

/// Tests the AT interface
pub const TEST: &[u8] = b"AT";
/// Restarts the module
pub const RESTART: &[u8] = b"AT+RST";
/// Reads the firmware version information
pub const VERSION: &[u8] = b"AT+GMR";
/// Enters deep-sleep mode
pub const DEEP_SLEEP: &[u8] = b"AT+GSLP";
/// Switches command echoing on/off
pub const ECHO: &[u8] = b"ATE";
/// Restores the factory default settings
pub const FACTORY_RESET: &[u8] = b"AT+RESTORE";
/// Resets the default UART configuration stored in flash
pub const UART_CONFIG_DEFAULT: &[u8] = b"AT+UART_DEF=9600,8,1,0,0";

/// Sets/queries the WIFI mode (station, SoftAP, both)
pub const WIFI_MODE: &[u8] = b"AT+CWMODE";
/// Connects to an access point
pub const WIFI_JOIN: &[u8] = b"AT+CWJAP";
/// Scans for available access points
pub const WIFI_SCAN: &[u8] = b"AT+CWLAP";
/// Disconnects from the current access point
pub const WIFI_LEAVE: &[u8] = b"AT+CWQAP";
/// Sets/queries the SoftAP configuration
pub const SOFTAP_CONFIG: &[u8] = b"AT+CWSAP";
/// Lists the stations connected to the SoftAP
pub const SOFTAP_STATIONS: &[u8] = b"AT+CWLIF";
/// Sets/queries the DHCP configuration
pub const DHCP_CONFIG: &[u8] = b"AT+CWDHCP";
/// Sets whether the station connects on power-up
pub const AUTO_CONNECT: &[u8] = b"AT+CWAUTOCONN";
/// Sets the station MAC address
pub const STATION_MAC: &[u8] = b"AT+CIPSTAMAC";
/// Sets the SoftAP MAC address
pub const SOFTAP_MAC: &[u8] = b"AT+CIPAPMAC";
/// Sets/queries the station IP address
pub const STATION_IP: &[u8] = b"AT+CIPSTA";
/// Sets/queries the SoftAP IP address
pub const SOFTAP_IP: &[u8] = b"AT+CIPAP";

/// Queries the connection status
pub const CONNECTION_STATUS: &[u8] = b"AT+CIPSTATUS";
/// Establishes a TCP connection or UDP transmission
pub const CONNECTION_START: &[u8] = b"AT+CIPSTART";
/// Announces a data transmission of the given length
pub const CONNECTION_SEND: &[u8] = b"AT+CIPSEND";
/// Closes the connection
pub const CONNECTION_CLOSE: &[u8] = b"AT+CIPCLOSE";
/// Queries the local IP address
pub const LOCAL_IP: &[u8] = b"AT+CIFSR";
/// Enables/disables multiple connections
pub const MUX_MODE: &[u8] = b"AT+CIPMUX";
/// Configures a TCP server
pub const SERVER_CONFIG: &[u8] = b"AT+CIPSERVER";
/// Sets the transmission mode
pub const TRANSMISSION_MODE: &[u8] = b"AT+CIPMODE";
/// Sets the TCP server timeout
pub const SERVER_TIMEOUT: &[u8] = b"AT+CIPSTO";
/// Upgrades the firmware over the network
pub const UPGRADE: &[u8] = b"AT+CIUPDATE";
/// Pings a remote host
pub const PING: &[u8] = b"AT+PING";

/// Issues a HTTP client request
pub const HTTP_CLIENT: &[u8] = b"AT+HTTPCLIENT";

/// A single typed argument of a set command
#[derive(Copy, Clone, Debug)]
pub enum CommandArg<'a> {
    /// Double-quoted verbatim. Embedded quotes are not escaped, this is the
    /// caller's responsibility.
    Str(&'a str),
    /// Inserted without quoting
    Bytes(&'a [u8]),
    /// Serialized as `1`/`0`
    Bool(bool),
    /// Serialized as decimal
    Int(i32),
    /// Skipped entirely, no comma is emitted
    Omitted,
}

/// Argument string does not fit into the target buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CapacityError;

/// Joins the given arguments to the argument string of a set command.
///
/// Returns [CapacityError] if the serialized form exceeds `N` bytes.
pub fn serialize_args<const N: usize>(args: &[CommandArg<'_>]) -> Result<Vec<u8, N>, CapacityError> {
    let mut output = Vec::new();
    let mut first = true;

    for argument in args {
        if matches!(argument, CommandArg::Omitted) {
            continue;
        }

        if !first {
            push_slice(&mut output, b",")?;
        }
        first = false;

        match argument {
            CommandArg::Str(value) => {
                push_slice(&mut output, b"\"")?;
                push_slice(&mut output, value.as_bytes())?;
                push_slice(&mut output, b"\"")?;
            }
            CommandArg::Bytes(value) => push_slice(&mut output, value)?,
            CommandArg::Bool(value) => push_slice(&mut output, if *value { b"1" } else { b"0" })?,
            CommandArg::Int(value) => {
                let mut buffer = [0x0; 12];
                push_slice(&mut output, value.numtoa(10, &mut buffer))?;
            }
            CommandArg::Omitted => {}
        }
    }

    Ok(output)
}

fn push_slice<const N: usize>(output: &mut Vec<u8, N>, data: &[u8]) -> Result<(), CapacityError> {
    output.extend_from_slice(data).map_err(|_| CapacityError)
}
