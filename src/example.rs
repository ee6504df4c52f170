//! Mocks for doc examples
use crate::serial::SerialLink;
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer;
use heapless::{Deque, Vec};

/// Serial link mock replying with a scripted set of reply lines per command
#[derive(Default)]
pub struct ExampleSerialLink {
    /// Lines buffered for the next reads
    pending: Deque<Vec<u8, 128>, 16>,
}

impl ExampleSerialLink {
    fn push_line(&mut self, line: &[u8]) {
        let _ = self.pending.push_back(Vec::from_slice(line).unwrap());
    }

    fn push_status(&mut self) {
        self.push_line(b"\r\n");
        self.push_line(b"OK\r\n");
    }
}

impl SerialLink for ExampleSerialLink {
    type Error = u32;

    fn data_available(&mut self) -> bool {
        !self.pending.is_empty()
    }

    fn read_line(&mut self, buffer: &mut [u8], _timeout_ms: u32) -> Result<usize, Self::Error> {
        match self.pending.pop_front() {
            Some(line) => {
                let length = line.len().min(buffer.len());
                buffer[..length].copy_from_slice(&line[..length]);
                Ok(length)
            }
            None => Ok(0),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        // Raw payload pushed in data mode is not echoed
        if !data.starts_with(b"AT") || !data.ends_with(b"\r\n") {
            return Ok(());
        }

        // Command echo
        self.push_line(data);

        if data.starts_with(b"AT+CWJAP=") {
            self.push_line(b"WIFI CONNECTED\r\n");
            self.push_line(b"WIFI GOT IP\r\n");
        } else if data == b"AT+CWMODE?\r\n" {
            self.push_line(b"+CWMODE:1\r\n");
        } else if data.starts_with(b"AT+HTTPCLIENT=") {
            self.push_line(b"+HTTPCLIENT:5,hello\r\n");
            self.push_line(b"+HTTPCLIENT:6,world!\r\n");
        }

        self.push_status();
        Ok(())
    }
}

/// Timer mock with instantly elapsing waits
#[derive(Default)]
pub struct ExampleTimer {}

impl Timer<1_000_000> for ExampleTimer {
    type Error = u32;

    fn now(&mut self) -> TimerInstantU32<1000000> {
        unimplemented!()
    }

    fn start(&mut self, _duration: TimerDurationU32<1000000>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        unimplemented!()
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        nb::Result::Ok(())
    }
}
