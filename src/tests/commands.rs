use crate::commands::{serialize_args, CapacityError, CommandArg};
use heapless::Vec;

fn serialized(args: &[CommandArg<'_>]) -> String {
    let output: Vec<u8, 128> = serialize_args(args).unwrap();
    String::from_utf8(output.to_vec()).unwrap()
}

#[test]
fn test_string_argument_is_quoted() {
    assert_eq!("\"a\"", serialized(&[CommandArg::Str("a")]));
}

#[test]
fn test_string_quotes_are_not_escaped() {
    assert_eq!("\"a\"b\"", serialized(&[CommandArg::Str("a\"b")]));
}

#[test]
fn test_bytes_are_inserted_verbatim() {
    assert_eq!("TCP", serialized(&[CommandArg::Bytes(b"TCP")]));
}

#[test]
fn test_booleans() {
    assert_eq!("1", serialized(&[CommandArg::Bool(true)]));
    assert_eq!("0", serialized(&[CommandArg::Bool(false)]));
}

#[test]
fn test_integers() {
    assert_eq!("8080", serialized(&[CommandArg::Int(8080)]));
    assert_eq!("-40", serialized(&[CommandArg::Int(-40)]));
    assert_eq!("0", serialized(&[CommandArg::Int(0)]));
}

#[test]
fn test_sole_omitted_argument_yields_empty_string() {
    assert_eq!("", serialized(&[CommandArg::Omitted]));
}

#[test]
fn test_omitted_arguments_leave_no_dangling_comma() {
    assert_eq!(
        "\"a\",5",
        serialized(&[CommandArg::Str("a"), CommandArg::Omitted, CommandArg::Int(5)])
    );
    assert_eq!(
        "\"a\",5",
        serialized(&[CommandArg::Str("a"), CommandArg::Int(5), CommandArg::Omitted])
    );
}

#[test]
fn test_arguments_keep_their_order() {
    assert_eq!(
        "2,1,\"http://a/b\",0",
        serialized(&[
            CommandArg::Int(2),
            CommandArg::Bool(true),
            CommandArg::Str("http://a/b"),
            CommandArg::Int(0),
        ])
    );
}

#[test]
fn test_token_count_matches_present_arguments() {
    let args = [
        CommandArg::Str("x"),
        CommandArg::Omitted,
        CommandArg::Int(1),
        CommandArg::Bool(false),
        CommandArg::Omitted,
        CommandArg::Bytes(b"raw"),
    ];

    let output = serialized(&args);
    assert_eq!(4, output.split(',').count());
}

#[test]
fn test_capacity_overflow() {
    let result: Result<Vec<u8, 4>, CapacityError> = serialize_args(&[CommandArg::Str("too long")]);
    assert_eq!(Err(CapacityError), result);
}
