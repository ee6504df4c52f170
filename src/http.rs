//! # HTTP client
//!
//! Wraps the `AT+HTTPCLIENT` command of the firmware. The reply carries the body
//! as repeated length-prefixed chunk markers (`+HTTPCLIENT:<len>,<data>`) which
//! get reassembled in order and truncated to the declared total length.
//!
//! ## Example
//!
//! ````
//! use esp_at_client::example::{ExampleSerialLink, ExampleTimer};
//! use esp_at_client::http::{HttpContentType, HttpMethod};
//! use esp_at_client::wifi::Adapter;
//!
//! let link = ExampleSerialLink::default();
//! let mut adapter: Adapter<_, _, 1_000_000, 128, 16> = Adapter::new(link, ExampleTimer::default());
//!
//! let response = adapter
//!     .http_request::<64>("http://example.com/index.html", HttpMethod::Get, HttpContentType::FormUrlEncoded, None)
//!     .unwrap();
//!
//! assert_eq!(11, response.size);
//! assert_eq!(b"helloworld!", response.data.as_slice());
//! ````
use crate::commands::{self, CommandArg};
use crate::serial::SerialLink;
use crate::transport::{parse_decimal, Error as AtError, ReplyLines};
use crate::wifi::Adapter;
use core::fmt::Debug;
use fugit_timer::Timer;
use heapless::{String, Vec};

/// Chunk marker prefixing every body fragment in the reply
const CHUNK_MARKER: &[u8] = b"+HTTPCLIENT:";

/// HTTP request methods and their firmware codes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Head = 1,
    Get = 2,
    Post = 3,
    Put = 4,
    Delete = 5,
}

/// Content type codes of the request body
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HttpContentType {
    FormUrlEncoded = 0,
    Json = 1,
    Multipart = 2,
    Xml = 3,
}

/// HTTP client errors
#[derive(Clone, Debug, PartialEq)]
pub enum HttpError<E: Debug> {
    /// Transport engine fault
    Command(AtError<E>),

    /// URL is not of the shape `http[s]://host[:port][/path]`
    InvalidUrl,

    /// A chunk marker line was garbled (missing comma or non-numeric length)
    MalformedChunk,

    /// The reassembled body exceeds the response buffer
    BodyOverflow,
}

impl<E: Debug> From<AtError<E>> for HttpError<E> {
    fn from(error: AtError<E>) -> Self {
        Self::Command(error)
    }
}

/// Reassembled HTTP reply
///
/// DATA_SIZE: Max. body length in bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse<const DATA_SIZE: usize> {
    /// Total body length declared by the chunk markers
    pub size: usize,

    /// Reassembled body, truncated to the declared length
    pub data: Vec<u8, DATA_SIZE>,
}

/// Chunk reassembly faults
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkError {
    /// Marker line without comma separator or with a non-numeric length
    Malformed,

    /// Body does not fit into the response buffer
    Overflow,
}

impl<const DATA_SIZE: usize> HttpResponse<DATA_SIZE> {
    /// Reassembles the body from the reply lines.
    ///
    /// Marker lines contribute their declared length to the running total and
    /// their payload (line terminator stripped) to the body. Other lines are
    /// appended verbatim. The body is truncated to the running total, which
    /// drops stray trailing terminators.
    pub fn from_lines<const LINE_SIZE: usize, const MAX_LINES: usize>(
        lines: &ReplyLines<LINE_SIZE, MAX_LINES>,
    ) -> Result<Self, ChunkError> {
        let mut size = 0;
        let mut data: Vec<u8, DATA_SIZE> = Vec::new();

        for line in lines {
            if let Some(chunk) = line.strip_prefix(CHUNK_MARKER) {
                let comma = chunk.iter().position(|byte| *byte == b',').ok_or(ChunkError::Malformed)?;
                let declared: usize = parse_decimal(&chunk[..comma]).ok_or(ChunkError::Malformed)?;

                size += declared;
                data.extend_from_slice(strip_terminator(&chunk[comma + 1..]))
                    .map_err(|_| ChunkError::Overflow)?;
            } else {
                data.extend_from_slice(line).map_err(|_| ChunkError::Overflow)?;
            }

            if data.len() > size {
                data.truncate(size);
            }
        }

        Ok(Self { size, data })
    }
}

impl<S: SerialLink, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const LINE_SIZE: usize, const MAX_LINES: usize>
    Adapter<S, T, TIMER_HZ, LINE_SIZE, MAX_LINES>
{
    /// Fetches the given URL and reassembles the response body.
    ///
    /// The URL is split into scheme, host and path; a `:port` suffix of the host
    /// is stripped before it is handed to the firmware. `https:` selects the SSL
    /// transport of the firmware.
    pub fn http_request<const DATA_SIZE: usize>(
        &mut self,
        url: &str,
        method: HttpMethod,
        content_type: HttpContentType,
        body: Option<&str>,
    ) -> Result<HttpResponse<DATA_SIZE>, HttpError<S::Error>> {
        let mut parts = url.splitn(4, '/');
        let scheme = parts.next().ok_or(HttpError::InvalidUrl)?;
        parts.next().ok_or(HttpError::InvalidUrl)?;
        let authority = parts.next().ok_or(HttpError::InvalidUrl)?;
        let tail = parts.next().unwrap_or("");

        let transport_type = match scheme {
            "http:" => 1,
            "https:" => 2,
            _ => return Err(HttpError::InvalidUrl),
        };

        let host = authority.split(':').next().unwrap_or(authority);

        let mut path: String<LINE_SIZE> = String::new();
        path.push('/').map_err(|_| HttpError::Command(AtError::Overflow))?;
        path.push_str(tail).map_err(|_| HttpError::Command(AtError::Overflow))?;

        let body_arg = match body {
            Some(content) => CommandArg::Str(content),
            None => CommandArg::Omitted,
        };

        let lines = self.transport.set(
            commands::HTTP_CLIENT,
            &[
                CommandArg::Int(method as i32),
                CommandArg::Int(content_type as i32),
                CommandArg::Str(url),
                CommandArg::Str(host),
                CommandArg::Str(path.as_str()),
                CommandArg::Int(transport_type),
                body_arg,
            ],
            0,
        )?;

        HttpResponse::from_lines(&lines).map_err(|error| match error {
            ChunkError::Malformed => HttpError::MalformedChunk,
            ChunkError::Overflow => HttpError::BodyOverflow,
        })
    }
}

/// Strips the trailing line terminator, keeping any other whitespace
fn strip_terminator(data: &[u8]) -> &[u8] {
    let mut end = data.len();

    while end > 0 && (data[end - 1] == b'\r' || data[end - 1] == b'\n') {
        end -= 1;
    }

    &data[..end]
}
