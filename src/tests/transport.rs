use crate::commands::CommandArg;
use crate::tests::mock::{MockSerialLink, MockTimer};
use crate::transport::{Error, Transport};

type TransportType = Transport<MockSerialLink, MockTimer, 1_000_000, 128, 16>;

fn transport(link: MockSerialLink) -> TransportType {
    Transport::new(link, MockTimer::ready())
}

#[test]
fn test_execute_empty_reply() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT\r\n");
    link.add_line(b"OK\r\n");

    let mut transport = transport(link);
    let lines = transport.execute(b"AT", 0).unwrap();

    assert!(lines.is_empty());

    let writes = transport.link.get_writes_as_strings();
    assert_eq!(1, writes.len());
    assert_eq!("AT\r\n", writes[0]);
}

#[test]
fn test_execute_strips_echo_and_two_status_lines() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+GMR\r\n");
    link.add_line(b"line1\r\n");
    link.add_line(b"line2\r\n");
    link.add_line(b"OK\r\n");

    let mut transport = transport(link);
    let lines = transport.execute(b"AT+GMR", 0).unwrap();

    // Echo and the last two lines are removed, not just the final OK
    assert_eq!(1, lines.len());
    assert_eq!(b"line1\r\n", lines[0].as_slice());
}

#[test]
fn test_execute_error_reply() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWQAP\r\n");
    link.add_line(b"ERROR\r\n");

    let mut transport = transport(link);
    let error = transport.execute(b"AT+CWQAP", 0).unwrap_err();

    assert_eq!(Error::Protocol, error);
}

#[test]
fn test_error_discards_preceding_payload() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWJAP=\"a\",\"b\"\r\n");
    link.add_line(b"+CWJAP:1\r\n");
    link.add_line(b"ERROR\r\n");

    let mut transport = transport(link);
    assert_eq!(Error::Protocol, transport.transact(b"AT+CWJAP=\"a\",\"b\"", 0).unwrap_err());
}

#[test]
fn test_empty_command_rejected_before_write() {
    let mut transport = transport(MockSerialLink::new());
    let error = transport.transact(b"", 0).unwrap_err();

    assert_eq!(Error::EmptyCommand, error);
    assert!(transport.link.get_writes_as_strings().is_empty());
}

#[test]
fn test_soft_timeout_returns_partial_lines() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CIPSTATUS\r\n");
    link.add_line(b"STATUS:2\r\n");

    let mut transport = transport(link);
    let lines = transport.transact(b"AT+CIPSTATUS", 100).unwrap();

    assert_eq!(2, lines.len());
    assert_eq!(b"STATUS:2\r\n", lines[1].as_slice());
}

#[test]
fn test_soft_timeout_without_any_lines() {
    let mut transport = transport(MockSerialLink::new());
    let lines = transport.transact(b"AT+CWLAP", 100).unwrap();

    assert!(lines.is_empty());
}

#[test]
fn test_empty_reply_skips_extended_phase() {
    let mut link = MockSerialLink::new();
    link.add_quiet(150);
    link.add_line(b"OK\r\n");

    let mut transport = transport(link);
    let lines = transport.transact(b"AT+CWLAP", 10_000).unwrap();

    // Nothing arrived within the initial budget, so the extended phase is
    // skipped and the late OK stays unread
    assert!(lines.is_empty());
}

#[test]
fn test_ok_latch_keeps_draining() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT\r\n");
    link.add_line(b"OK\r\n");
    link.add_line(b"late\r\n");

    let mut transport = transport(link);
    let lines = transport.transact(b"AT", 100).unwrap();

    // The OK latch prevents the extended phase even though the last line is payload
    assert_eq!(3, lines.len());
    assert_eq!(b"late\r\n", lines[2].as_slice());
}

#[test]
fn test_status_arriving_after_initial_budget_is_drained() {
    let mut link = MockSerialLink::new();
    link.add_quiet(100);
    link.add_line(b"AT\r\n");
    link.add_line(b"OK\r\n");

    let mut transport = transport(link);
    let lines = transport.execute(b"AT", 100).unwrap();

    assert!(lines.is_empty());
}

#[test]
fn test_extended_phase_collects_late_lines() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWLAP\r\n");
    link.add_line(b"+CWLAP:(3,\"net\",-40)\r\n");
    link.add_quiet(150);
    link.add_line(b"+CWLAP:(4,\"other\",-60)\r\n");
    link.add_line(b"OK\r\n");

    let mut transport = transport(link);
    let lines = transport.transact(b"AT+CWLAP", 10_000).unwrap();

    assert_eq!(4, lines.len());
    assert_eq!(b"OK\r\n", lines[3].as_slice());
}

#[test]
fn test_fail_in_extended_phase() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWJAP=\"a\",\"b\"\r\n");
    link.add_line(b"busy\r\n");
    link.add_quiet(120);
    link.add_line(b"FAIL\r\n");

    let mut transport = transport(link);
    let error = transport.transact(b"AT+CWJAP=\"a\",\"b\"", 20_000).unwrap_err();

    assert_eq!(Error::Failed, error);
}

#[test]
fn test_fail_before_extended_phase_is_payload() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWJAP=\"a\",\"b\"\r\n");
    link.add_line(b"FAIL\r\n");

    let mut transport = transport(link);
    let lines = transport.transact(b"AT+CWJAP=\"a\",\"b\"", 100).unwrap();

    // FAIL is only honored as terminal token for lines read in the extended phase
    assert_eq!(2, lines.len());
}

#[test]
fn test_query_returns_second_line_trimmed() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWMODE?\r\n");
    link.add_line(b"+CWMODE:1\r\n");
    link.add_ok_tail();

    let mut transport = transport(link);
    let line = transport.query(b"AT+CWMODE", 0).unwrap();

    assert_eq!(b"+CWMODE:1", line.as_slice());

    let writes = transport.link.get_writes_as_strings();
    assert_eq!("AT+CWMODE?\r\n", writes[0]);
}

#[test]
fn test_query_truncated_reply() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWMODE?\r\n");

    let mut transport = transport(link);
    let error = transport.query(b"AT+CWMODE", 100).unwrap_err();

    assert_eq!(Error::TruncatedReply, error);
}

#[test]
fn test_set_serializes_arguments() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT+CWJAP=\"net\",\"pass\"\r\n");
    link.add_line(b"OK\r\n");

    let mut transport = transport(link);
    let lines = transport
        .set(b"AT+CWJAP", &[CommandArg::Str("net"), CommandArg::Str("pass")], 0)
        .unwrap();

    assert!(lines.is_empty());

    let writes = transport.link.get_writes_as_strings();
    assert_eq!("AT+CWJAP=\"net\",\"pass\"\r\n", writes[0]);
}

#[test]
fn test_stored_lines_keep_terminators() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT\r\n");
    link.add_line(b"OK\r\n");

    let mut transport = transport(link);
    let lines = transport.transact(b"AT", 0).unwrap();

    assert_eq!(b"AT\r\n", lines[0].as_slice());
    assert_eq!(b"OK\r\n", lines[1].as_slice());
}

#[test]
fn test_link_write_error() {
    let mut link = MockSerialLink::new();
    link.fail_write_at(0);

    let mut transport = transport(link);
    let error = transport.transact(b"AT", 0).unwrap_err();

    assert_eq!(Error::Link(42), error);
}

#[test]
fn test_timer_fault() {
    let mut timer = MockTimer::new();
    timer.expect_start().returning(|_| Err(7));

    let mut transport: TransportType = Transport::new(MockSerialLink::new(), timer);
    let error = transport.transact(b"AT", 0).unwrap_err();

    assert_eq!(Error::TimerFault, error);
}

#[test]
fn test_reply_line_overflow() {
    let mut link = MockSerialLink::new();
    link.add_line(b"AT\r\n");
    link.add_line(b"a\r\n");
    link.add_line(b"b\r\n");

    let mut transport: Transport<MockSerialLink, MockTimer, 1_000_000, 128, 2> =
        Transport::new(link, MockTimer::ready());
    let error = transport.transact(b"AT", 0).unwrap_err();

    assert_eq!(Error::Overflow, error);
}
