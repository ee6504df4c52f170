use crate::serial::SerialLink;
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer as FugitTimer;
use mockall::mock;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

/// Scripted behavior of the serial link, consumed in insertion order
enum LinkEvent {
    /// A full reply line ready to be read
    Line(Vec<u8>),

    /// No data is available for the given number of polls
    Quiet(usize),
}

/// Custom mock for [SerialLink]. The poll driven read protocol (availability
/// polls interleaved with line reads) is easier to script with an explicit
/// event queue than with mockall expectations.
pub struct MockSerialLink {
    /// Scripted events in delivery order
    events: VecDeque<LinkEvent>,

    /// All written byte sequences, one entry per write call
    writes: Vec<Vec<u8>>,

    /// Simulates an upstream fault at the given write call index
    write_error_at: Option<usize>,
}

impl SerialLink for MockSerialLink {
    type Error = u32;

    fn data_available(&mut self) -> bool {
        loop {
            match self.events.front_mut() {
                Some(LinkEvent::Quiet(0)) => {
                    self.events.pop_front();
                }
                Some(LinkEvent::Quiet(count)) => {
                    *count -= 1;
                    return false;
                }
                Some(LinkEvent::Line(_)) => return true,
                None => return false,
            }
        }
    }

    fn read_line(&mut self, buffer: &mut [u8], _timeout_ms: u32) -> Result<usize, Self::Error> {
        match self.events.pop_front() {
            Some(LinkEvent::Line(line)) => {
                let length = line.len().min(buffer.len());
                buffer[..length].copy_from_slice(&line[..length]);
                Ok(length)
            }
            _ => Ok(0),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.write_error_at == Some(self.writes.len()) {
            return Err(42);
        }

        self.writes.push(data.to_vec());
        Ok(())
    }
}

impl MockSerialLink {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            writes: vec![],
            write_error_at: None,
        }
    }

    /// Queues a reply line, terminator included
    pub fn add_line(&mut self, line: &'static [u8]) {
        self.events.push_back(LinkEvent::Line(line.to_vec()));
    }

    /// Queues the given number of availability polls returning no data
    pub fn add_quiet(&mut self, polls: usize) {
        self.events.push_back(LinkEvent::Quiet(polls));
    }

    /// Queues the closing status frame (blank line + OK)
    pub fn add_ok_tail(&mut self) {
        self.add_line(b"\r\n");
        self.add_line(b"OK\r\n");
    }

    /// Simulates an upstream fault at the given write call index
    pub fn fail_write_at(&mut self, call_index: usize) {
        self.write_error_at = Some(call_index);
    }

    /// Returns a copy of all written byte sequences
    pub fn get_writes_as_strings(&self) -> Vec<String> {
        let mut writes = vec![];

        for write in &self.writes {
            writes.push(String::from_utf8(write.clone()).unwrap());
        }

        writes
    }
}

mock! {
    pub Timer{}

    impl FugitTimer<1_000_000> for Timer {
        type Error = u32;

        fn now(&mut self) -> TimerInstantU32<1000000>;
        fn start(&mut self, duration: TimerDurationU32<1000000>) -> Result<(), u32>;
        fn cancel(&mut self) -> Result<(), u32>;
        fn wait(&mut self) -> nb::Result<(), u32>;
    }
}

impl MockTimer {
    /// Timer whose waits elapse instantly, used by all tests not asserting
    /// timer interaction
    pub fn ready() -> Self {
        let mut timer = Self::new();
        timer.expect_start().returning(|_| Ok(()));
        timer.expect_wait().returning(|| nb::Result::Ok(()));
        timer
    }
}
