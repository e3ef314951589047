//! ASCII, space-delimited control frames prefixed with a configurable magic
//! token. Anything whose first token isn't the magic is raw DATA to forward.

#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    Hello { session_id: &'a str, slot: Option<&'a str> },
    Bye { session_id: &'a str },
    Ping { session_id: &'a str },
    UnknownCommand { session_id: &'a str },
    Data,
}

pub fn parse_frame<'a>(magic: &str, data: &'a [u8]) -> Frame<'a> {
    let Ok(text) = std::str::from_utf8(data) else {
        return Frame::Data;
    };
    let mut tokens = text.split_whitespace();
    let Some(first) = tokens.next() else {
        return Frame::Data;
    };
    if first != magic {
        return Frame::Data;
    }
    let Some(cmd) = tokens.next() else {
        return Frame::Data;
    };
    match cmd {
        "HELLO" => match tokens.next() {
            Some(session_id) => Frame::Hello { session_id, slot: tokens.next() },
            None => Frame::Data,
        },
        "BYE" => match tokens.next() {
            Some(session_id) => Frame::Bye { session_id },
            None => Frame::Data,
        },
        "PING" => match tokens.next() {
            Some(session_id) => Frame::Ping { session_id },
            None => Frame::Data,
        },
        _ => match tokens.next() {
            Some(session_id) => Frame::UnknownCommand { session_id },
            None => Frame::Data,
        },
    }
}

pub fn encode_wait(magic: &str, session_id: &str, slot: u8) -> String {
    format!("{magic} WAIT {session_id} {slot}\n")
}

pub fn encode_ready(magic: &str, session_id: &str, slot: u8) -> String {
    format!("{magic} READY {session_id} {slot}\n")
}

pub fn encode_full(magic: &str, session_id: &str) -> String {
    format!("{magic} FULL {session_id}\n")
}

pub fn encode_busy(magic: &str, session_id: &str) -> String {
    format!("{magic} BUSY {session_id}\n")
}

pub fn encode_err(magic: &str, session_id: &str, reason: &str) -> String {
    format!("{magic} ERR {session_id} {reason}\n")
}

pub fn encode_ok(magic: &str, session_id: &str) -> String {
    format!("{magic} OK {session_id}\n")
}

pub fn encode_pong(magic: &str, session_id: &str) -> String {
    format!("{magic} PONG {session_id}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: &str = "RARELAY1";

    #[test]
    fn parses_hello_with_explicit_slot() {
        let frame = parse_frame(MAGIC, b"RARELAY1 HELLO abc123 2");
        assert_eq!(frame, Frame::Hello { session_id: "abc123", slot: Some("2") });
    }

    #[test]
    fn parses_hello_without_slot() {
        let frame = parse_frame(MAGIC, b"RARELAY1 HELLO abc123");
        assert_eq!(frame, Frame::Hello { session_id: "abc123", slot: None });
    }

    #[test]
    fn parses_bye_and_ping() {
        assert_eq!(parse_frame(MAGIC, b"RARELAY1 BYE abc"), Frame::Bye { session_id: "abc" });
        assert_eq!(parse_frame(MAGIC, b"RARELAY1 PING abc"), Frame::Ping { session_id: "abc" });
    }

    #[test]
    fn unknown_command_carries_session_id() {
        assert_eq!(
            parse_frame(MAGIC, b"RARELAY1 FOO abc"),
            Frame::UnknownCommand { session_id: "abc" }
        );
    }

    #[test]
    fn unknown_command_without_third_token_is_data() {
        assert_eq!(parse_frame(MAGIC, b"RARELAY1 FOO"), Frame::Data);
    }

    #[test]
    fn mismatched_magic_is_data() {
        assert_eq!(parse_frame(MAGIC, b"not the magic at all"), Frame::Data);
    }

    #[test]
    fn raw_binary_payload_is_data() {
        let payload = [0xffu8, 0x00, 0x01, 0x02];
        assert_eq!(parse_frame(MAGIC, &payload), Frame::Data);
    }
}
