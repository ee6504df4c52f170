//! # WIFI adapter
//!
//! [Adapter] bundles the transport engine with the WIFI related operations of the
//! ESP-AT firmware: joining a network, scanning for access points, SoftAP and
//! DHCP configuration and address management.
//!
//! ## Example
//!
//! ````
//! use esp_at_client::example::{ExampleSerialLink, ExampleTimer};
//! use esp_at_client::wifi::{Adapter, WifiMode};
//!
//! let link = ExampleSerialLink::default();
//! let mut adapter: Adapter<_, _, 1_000_000, 128, 16> = Adapter::new(link, ExampleTimer::default());
//!
//! assert_eq!(WifiMode::Station, adapter.get_mode().unwrap());
//!
//! // Join reports true once the firmware announced 'WIFI GOT IP'
//! assert!(adapter.join("test_wifi", "secret").unwrap());
//! ````
use crate::commands::{self, CommandArg};
use crate::serial::SerialLink;
use crate::transport::{find_subslice, parse_decimal, trim_line, Error as AtError, ReplyLine, ReplyLines, Transport};
use core::fmt::Debug;
use fugit_timer::Timer;
use heapless::{String, Vec};

/// Extended reply budget for joining an access point
const JOIN_TIMEOUT_MS: u32 = 20_000;

/// Extended reply budget for an access point scan
const SCAN_TIMEOUT_MS: u32 = 10_000;

/// WIFI operation modes of the module
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WifiMode {
    /// Client of an access point
    Station = 1,
    /// Access point mode
    SoftAp = 2,
    /// Access point and station in parallel
    SoftApStation = 3,
}

impl WifiMode {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Station),
            2 => Some(Self::SoftAp),
            3 => Some(Self::SoftApStation),
            _ => None,
        }
    }

    /// Returns true for the modes operating an access point
    pub fn is_accesspoint(&self) -> bool {
        matches!(self, Self::SoftAp | Self::SoftApStation)
    }
}

/// WIFI security protocols known to the module
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncryptionProtocol {
    Open = 0,
    Wep = 1,
    WpaPsk = 2,
    Wpa2Psk = 3,
    WpaWpa2Psk = 4,
    Wpa2Enterprise = 5,
    Wpa3Psk = 6,
    Wpa2Wpa3Psk = 7,
}

/// A single record of an access point scan
///
/// MAC address and channel are only reported by firmware configured to print
/// the extended record format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPoint {
    /// Numeric security protocol, s. [EncryptionProtocol]
    pub encryption_protocol: u8,

    /// Network name, surrounding quotes stripped
    pub ssid: String<32>,

    /// Signal strength in dBm
    pub rssi: i16,

    /// MAC address of the access point
    pub mac: Option<String<17>>,

    /// WIFI channel
    pub channel: Option<u8>,
}

impl AccessPoint {
    /// Parses the record body `enc,ssid,rssi[,mac,channel]`.
    ///
    /// Returns None if the body does not split into exactly 3 or 5 fields or a
    /// numeric field is garbled. Malformed records are dropped by the callers,
    /// partial scan results are preferred over a total failure.
    pub fn parse(record: &[u8]) -> Option<Self> {
        let mut fields: Vec<&[u8], 6> = Vec::new();
        for field in record.split(|byte| *byte == b',') {
            fields.push(field).ok()?;
        }

        if fields.len() != 3 && fields.len() != 5 {
            return None;
        }

        let mut access_point = Self {
            encryption_protocol: parse_decimal(fields[0])?,
            ssid: parse_quoted(fields[1])?,
            rssi: parse_decimal(fields[2])?,
            mac: None,
            channel: None,
        };

        if fields.len() == 5 {
            access_point.mac = Some(parse_quoted(fields[3])?);
            access_point.channel = Some(parse_decimal(fields[4])?);
        }

        Some(access_point)
    }
}

/// Parameters of the currently joined access point (`AT+CWJAP?`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedAccessPoint {
    pub ssid: String<32>,
    pub bssid: String<17>,
    pub channel: u8,
    pub rssi: i16,
    /// PCI authentication enabled?
    pub pci_en: u8,
    /// Reconnection interval in seconds
    pub reconn_interval: u16,
    /// Listen interval for beacons
    pub listen_interval: u16,
    /// Active vs. passive scanning
    pub scan_mode: u8,
}

/// SoftAP parameters for [Adapter::set_softap_config]
#[derive(Copy, Clone, Debug)]
pub struct SoftApConfig<'a> {
    pub ssid: &'a str,

    /// Key of the network, 8 to 64 characters
    pub password: &'a str,

    /// WIFI channel 1 to 14
    pub channel: u8,

    /// WEP and the enterprise/WPA3 protocols are rejected by the firmware
    pub encryption_protocol: EncryptionProtocol,
}

/// Current SoftAP configuration reported by the firmware
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoftApStatus {
    pub ssid: String<32>,
    pub password: String<64>,
    pub channel: u8,
    pub encryption_protocol: u8,
    pub max_connections: u8,
    pub ssid_hidden: bool,
}

/// DHCP state per operation mode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DhcpConfig {
    /// DHCP enabled in station mode
    pub station: bool,

    /// DHCP enabled in SoftAP mode
    pub soft_ap: bool,
}

/// WIFI related errors
#[derive(Clone, Debug, PartialEq)]
pub enum WifiError<E: Debug> {
    /// Transport engine fault
    Command(AtError<E>),

    /// The firmware reported a WIFI mode outside the known set
    UnknownMode(i32),

    /// Operation requires the module to operate an access point (SoftAp or
    /// SoftApStation mode)
    NotAccessPointMode,

    /// Parameter validation failed, nothing was sent
    InvalidParameter(&'static str),

    /// A reply line had an unexpected shape
    UnexpectedReply,
}

impl<E: Debug> From<AtError<E>> for WifiError<E> {
    fn from(error: AtError<E>) -> Self {
        Self::Command(error)
    }
}

/// Central client for the ESP-AT module
///
/// LINE_SIZE: Max. length in bytes of a single command or reply line.
///
/// MAX_LINES: Max. number of reply lines collected per command.
pub struct Adapter<S: SerialLink, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const LINE_SIZE: usize, const MAX_LINES: usize>
{
    /// AT transport engine, exclusively owning the serial link
    pub(crate) transport: Transport<S, T, TIMER_HZ, LINE_SIZE, MAX_LINES>,
}

impl<S: SerialLink, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const LINE_SIZE: usize, const MAX_LINES: usize>
    Adapter<S, T, TIMER_HZ, LINE_SIZE, MAX_LINES>
{
    pub fn new(link: S, timer: T) -> Self {
        Self {
            transport: Transport::new(link, timer),
        }
    }

    /// Tests the AT interface. Returns true if the module acknowledged without
    /// further output.
    pub fn test(&mut self) -> Result<bool, WifiError<S::Error>> {
        Ok(self.transport.execute(commands::TEST, 0)?.is_empty())
    }

    /// Reads the firmware version information
    pub fn version(&mut self) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, WifiError<S::Error>> {
        Ok(self.transport.execute(commands::VERSION, 0)?)
    }

    /// Restores factory defaults. Returns true if the last payload line was `OK`.
    pub fn factory_reset(&mut self) -> Result<bool, WifiError<S::Error>> {
        let lines = self.transport.execute(commands::FACTORY_RESET, 0)?;
        Ok(lines.last().map(|line| trim_line(line) == b"OK").unwrap_or(false))
    }

    /// Writes the default UART configuration to flash
    pub fn set_default_uart_config(&mut self) -> Result<(), WifiError<S::Error>> {
        self.transport.execute(commands::UART_CONFIG_DEFAULT, 0)?;
        Ok(())
    }

    /// Restarts the module and collects the boot log. Returns true if the module
    /// signaled `ready` as last boot message.
    pub fn restart(&mut self) -> Result<bool, WifiError<S::Error>> {
        self.transport.execute(commands::RESTART, 0)?;

        let boot_log = self.transport.collect_startup_lines()?;
        Ok(boot_log.last().map(|line| trim_line(line) == b"ready").unwrap_or(false))
    }

    /// Reads the current WIFI mode
    pub fn get_mode(&mut self) -> Result<WifiMode, WifiError<S::Error>> {
        let line = self.transport.query(commands::WIFI_MODE, 0)?;
        let code: i32 = field_after_colon(&line)
            .and_then(parse_decimal)
            .ok_or(WifiError::UnexpectedReply)?;

        WifiMode::from_code(code).ok_or(WifiError::UnknownMode(code))
    }

    /// Sets the WIFI mode
    pub fn set_mode(&mut self, mode: WifiMode) -> Result<(), WifiError<S::Error>> {
        self.transport.set(commands::WIFI_MODE, &[CommandArg::Int(mode as i32)], 0)?;
        Ok(())
    }

    /// Connects to the access point with the given SSID and pre shared key.
    ///
    /// Returns true if the firmware announced an assigned IP within the 20 s
    /// connect budget.
    pub fn join(&mut self, ssid: &str, key: &str) -> Result<bool, WifiError<S::Error>> {
        let lines = self.transport.set(
            commands::WIFI_JOIN,
            &[CommandArg::Str(ssid), CommandArg::Str(key)],
            JOIN_TIMEOUT_MS,
        )?;

        Ok(lines.last().map(|line| trim_line(line) == b"WIFI GOT IP").unwrap_or(false))
    }

    /// Reads the parameters of the currently joined access point, None if the
    /// module is not connected.
    pub fn get_joined_accesspoint(&mut self) -> Result<Option<JoinedAccessPoint>, WifiError<S::Error>> {
        let line = self.transport.query(commands::WIFI_JOIN, 0)?;

        if line.is_empty() || trim_line(&line) == b"No AP" {
            return Ok(None);
        }

        let start = find_subslice(&line, b"+CWJAP:").ok_or(WifiError::UnexpectedReply)?;
        let record = &line[start + b"+CWJAP:".len()..];

        let mut fields: Vec<&[u8], 10> = Vec::new();
        for field in record.split(|byte| *byte == b',') {
            fields.push(field).map_err(|_| WifiError::UnexpectedReply)?;
        }

        if fields.len() < 8 {
            return Ok(None);
        }

        let access_point = JoinedAccessPoint {
            ssid: parse_quoted(fields[0]).ok_or(WifiError::UnexpectedReply)?,
            bssid: parse_quoted(fields[1]).ok_or(WifiError::UnexpectedReply)?,
            channel: parse_decimal(fields[2]).ok_or(WifiError::UnexpectedReply)?,
            rssi: parse_decimal(fields[3]).ok_or(WifiError::UnexpectedReply)?,
            pci_en: parse_decimal(fields[4]).ok_or(WifiError::UnexpectedReply)?,
            reconn_interval: parse_decimal(fields[5]).ok_or(WifiError::UnexpectedReply)?,
            listen_interval: parse_decimal(fields[6]).ok_or(WifiError::UnexpectedReply)?,
            scan_mode: parse_decimal(fields[7]).ok_or(WifiError::UnexpectedReply)?,
        };

        Ok(Some(access_point))
    }

    /// Disconnects from the current access point. Returns true if the firmware
    /// acknowledged without further output.
    pub fn leave(&mut self) -> Result<bool, WifiError<S::Error>> {
        Ok(self.transport.execute(commands::WIFI_LEAVE, 0)?.is_empty())
    }

    /// Scans for all available access points. Garbled records are dropped.
    pub fn scan(&mut self) -> Result<Vec<AccessPoint, MAX_LINES>, WifiError<S::Error>> {
        let lines = self.transport.execute(commands::WIFI_SCAN, SCAN_TIMEOUT_MS)?;
        Ok(Self::parse_scan_lines(&lines))
    }

    /// Scans for access points matching the given filter arguments (SSID, MAC
    /// and/or channel as supported by the firmware).
    pub fn scan_filtered(&mut self, filter: &[CommandArg<'_>]) -> Result<Vec<AccessPoint, MAX_LINES>, WifiError<S::Error>> {
        let lines = self.transport.set(commands::WIFI_SCAN, filter, SCAN_TIMEOUT_MS)?;
        Ok(Self::parse_scan_lines(&lines))
    }

    /// Decodes scan reply lines of the shape `+CWLAP:(enc,ssid,rssi[,mac,channel])`.
    /// Lines not matching the record shape are skipped.
    pub(crate) fn parse_scan_lines(lines: &ReplyLines<LINE_SIZE, MAX_LINES>) -> Vec<AccessPoint, MAX_LINES> {
        let mut access_points = Vec::new();

        for line in lines {
            let trimmed = trim_line(line);

            let record = match find_subslice(trimmed, b"+CWLAP:") {
                Some(start) => &trimmed[start + b"+CWLAP:".len()..],
                None => continue,
            };

            // Strip the surrounding parentheses
            if record.len() < 2 {
                continue;
            }

            if let Some(access_point) = AccessPoint::parse(&record[1..record.len() - 1]) {
                // Capacity matches the reply line bound, push can not fail
                let _ = access_points.push(access_point);
            }
        }

        access_points
    }

    /// Configures the SoftAP parameters and restarts the module to activate them.
    ///
    /// The module must be in an access point mode, otherwise
    /// [WifiError::NotAccessPointMode] is returned. Password length and channel
    /// are validated before sending, WEP and the enterprise/WPA3 protocols are
    /// rejected.
    pub fn set_softap_config(&mut self, config: &SoftApConfig<'_>) -> Result<(), WifiError<S::Error>> {
        self.require_accesspoint_mode()?;

        if config.password.len() < 8 || config.password.len() > 64 {
            return Err(WifiError::InvalidParameter("password length (8..64)"));
        }

        if config.channel < 1 || config.channel > 14 {
            return Err(WifiError::InvalidParameter("WIFI channel"));
        }

        if !matches!(
            config.encryption_protocol,
            EncryptionProtocol::Open
                | EncryptionProtocol::WpaPsk
                | EncryptionProtocol::Wpa2Psk
                | EncryptionProtocol::WpaWpa2Psk
        ) {
            return Err(WifiError::InvalidParameter("encryption protocol"));
        }

        self.transport.set(
            commands::SOFTAP_CONFIG,
            &[
                CommandArg::Str(config.ssid),
                CommandArg::Str(config.password),
                CommandArg::Int(config.channel as i32),
                CommandArg::Int(config.encryption_protocol as i32),
            ],
            0,
        )?;

        self.restart()?;
        Ok(())
    }

    /// Reads the current SoftAP configuration. The module must be in an access
    /// point mode.
    pub fn get_softap_config(&mut self) -> Result<SoftApStatus, WifiError<S::Error>> {
        self.require_accesspoint_mode()?;

        let line = self.transport.query(commands::SOFTAP_CONFIG, 0)?;
        let record = field_after_colon(&line).ok_or(WifiError::UnexpectedReply)?;

        let mut fields: Vec<&[u8], 6> = Vec::new();
        for field in record.split(|byte| *byte == b',') {
            fields.push(field).map_err(|_| WifiError::UnexpectedReply)?;
        }

        if fields.len() != 6 {
            return Err(WifiError::UnexpectedReply);
        }

        Ok(SoftApStatus {
            ssid: parse_quoted(fields[0]).ok_or(WifiError::UnexpectedReply)?,
            password: parse_quoted(fields[1]).ok_or(WifiError::UnexpectedReply)?,
            channel: parse_decimal(fields[2]).ok_or(WifiError::UnexpectedReply)?,
            encryption_protocol: parse_decimal(fields[3]).ok_or(WifiError::UnexpectedReply)?,
            max_connections: parse_decimal(fields[4]).ok_or(WifiError::UnexpectedReply)?,
            ssid_hidden: parse_decimal::<u8>(fields[5]).ok_or(WifiError::UnexpectedReply)? != 0,
        })
    }

    /// Lists the stations connected to the SoftAP as raw reply lines
    pub fn list_stations(&mut self) -> Result<ReplyLines<LINE_SIZE, MAX_LINES>, WifiError<S::Error>> {
        Ok(self.transport.execute(commands::SOFTAP_STATIONS, 0)?)
    }

    /// Reads the DHCP state of both operation modes
    pub fn get_dhcp_config(&mut self) -> Result<DhcpConfig, WifiError<S::Error>> {
        let line = self.transport.query(commands::DHCP_CONFIG, 0)?;
        let state: u8 = field_after_colon(&line)
            .and_then(parse_decimal)
            .ok_or(WifiError::UnexpectedReply)?;

        Ok(DhcpConfig {
            station: state & 0x01 != 0,
            soft_ap: state & 0x02 != 0,
        })
    }

    /// Enables/disables DHCP for the modes selected by `mode_mask`
    /// (bit 0: station, bit 1: SoftAP)
    pub fn set_dhcp_config(&mut self, mode_mask: u8, enabled: bool) -> Result<(), WifiError<S::Error>> {
        self.transport.set(
            commands::DHCP_CONFIG,
            &[CommandArg::Int(enabled as i32), CommandArg::Int(mode_mask as i32)],
            0,
        )?;
        Ok(())
    }

    /// Sets whether the module joins the stored access point on power-up
    pub fn set_auto_connect(&mut self, auto_connect: bool) -> Result<(), WifiError<S::Error>> {
        self.transport
            .set(commands::AUTO_CONNECT, &[CommandArg::Bool(auto_connect)], 0)?;
        Ok(())
    }

    /// Reads the station IP address line. No parsing is applied.
    pub fn get_station_ip(&mut self) -> Result<ReplyLine<LINE_SIZE>, WifiError<S::Error>> {
        Ok(self.transport.query(commands::STATION_IP, 0)?)
    }

    /// Sets the station IP address. The address is passed through unvalidated.
    pub fn set_station_ip(&mut self, ip: &str) -> Result<(), WifiError<S::Error>> {
        self.transport.set(commands::STATION_IP, &[CommandArg::Str(ip)], 0)?;
        Ok(())
    }

    /// Reads the SoftAP IP address line. No parsing is applied.
    pub fn get_softap_ip(&mut self) -> Result<ReplyLine<LINE_SIZE>, WifiError<S::Error>> {
        Ok(self.transport.query(commands::SOFTAP_IP, 0)?)
    }

    /// Sets the SoftAP IP address. The address is passed through unvalidated.
    pub fn set_softap_ip(&mut self, ip: &str) -> Result<(), WifiError<S::Error>> {
        self.transport.set(commands::SOFTAP_IP, &[CommandArg::Str(ip)], 0)?;
        Ok(())
    }

    /// Asserts that the module operates an access point
    fn require_accesspoint_mode(&mut self) -> Result<(), WifiError<S::Error>> {
        if !self.get_mode()?.is_accesspoint() {
            return Err(WifiError::NotAccessPointMode);
        }

        Ok(())
    }
}

/// Returns the data after the first `:` of the line
pub(crate) fn field_after_colon(line: &[u8]) -> Option<&[u8]> {
    let position = line.iter().position(|byte| *byte == b':')?;
    Some(&line[position + 1..])
}

/// Decodes a field into a bounded string, stripping surrounding double quotes
fn parse_quoted<const N: usize>(field: &[u8]) -> Option<String<N>> {
    let mut inner = field;

    if inner.len() >= 2 && inner.first() == Some(&b'"') && inner.last() == Some(&b'"') {
        inner = &inner[1..inner.len() - 1];
    }

    String::try_from(core::str::from_utf8(inner).ok()?).ok()
}
