//! Memcache text protocol codec
//!
//! Incremental decoder for command lines and data blocks, and the encoder for
//! replies. The decoder keeps the parsed header of a storage command while its
//! data block is still in flight.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{ProtocolError, Result};
use crate::models::{Command, Response};

// == Limits ==
/// Maximum key length in bytes
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Longest command line accepted before the data block
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

const CRLF: &[u8] = b"\r\n";

// == Decoder ==
/// Storage command waiting for its data block.
#[derive(Debug)]
struct PendingStore {
    key: Bytes,
    flags: u32,
    exptime: u64,
    len: usize,
    cas: Option<u64>,
    noreply: bool,
}

impl PendingStore {
    fn into_command(self, value: Bytes) -> Command {
        match self.cas {
            Some(cas) => Command::Cas {
                key: self.key,
                flags: self.flags,
                exptime: self.exptime,
                cas,
                value,
                noreply: self.noreply,
            },
            None => Command::Set {
                key: self.key,
                flags: self.flags,
                exptime: self.exptime,
                value,
                noreply: self.noreply,
            },
        }
    }
}

enum Parsed {
    Ready(Command),
    AwaitingData(PendingStore),
}

/// Stateful decoder for one connection.
#[derive(Debug, Default)]
pub struct CommandDecoder {
    pending: Option<PendingStore>,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the next command from `buf`, consuming its bytes.
    ///
    /// Returns `Ok(None)` when more input is needed.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Command>> {
        if self.pending.is_none() {
            let Some(line) = take_line(buf)? else {
                return Ok(None);
            };

            match parse_line(&line)? {
                Parsed::Ready(command) => return Ok(Some(command)),
                Parsed::AwaitingData(pending) => self.pending = Some(pending),
            }
        }

        let needed = match &self.pending {
            Some(pending) => pending.len + CRLF.len(),
            None => return Ok(None),
        };
        if buf.len() < needed {
            return Ok(None);
        }

        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        let value = buf.split_to(pending.len).freeze();
        if &buf[..CRLF.len()] != CRLF {
            return Err(ProtocolError::Client("bad data chunk".into()));
        }
        buf.advance(CRLF.len());

        Ok(Some(pending.into_command(value)))
    }
}

/// Splits one CRLF-terminated line off the front of `buf`, without the CRLF.
fn take_line(buf: &mut BytesMut) -> Result<Option<BytesMut>> {
    match buf.windows(CRLF.len()).position(|window| window == CRLF) {
        Some(end) => {
            let line = buf.split_to(end);
            buf.advance(CRLF.len());
            Ok(Some(line))
        }
        None if buf.len() > MAX_LINE_LENGTH => {
            Err(ProtocolError::Client("line too long".into()))
        }
        None => Ok(None),
    }
}

fn parse_line(line: &[u8]) -> Result<Parsed> {
    let mut tokens = line
        .split(|byte| *byte == b' ')
        .filter(|token| !token.is_empty());

    let Some(name) = tokens.next() else {
        return Err(ProtocolError::UnknownCommand);
    };
    let args: Vec<&[u8]> = tokens.collect();

    if name.eq_ignore_ascii_case(b"get") {
        Ok(Parsed::Ready(Command::Get {
            keys: parse_keys(&args)?,
        }))
    } else if name.eq_ignore_ascii_case(b"gets") {
        Ok(Parsed::Ready(Command::Gets {
            keys: parse_keys(&args)?,
        }))
    } else if name.eq_ignore_ascii_case(b"delete") {
        parse_delete(&args).map(Parsed::Ready)
    } else if name.eq_ignore_ascii_case(b"set") {
        parse_storage(&args, false).map(Parsed::AwaitingData)
    } else if name.eq_ignore_ascii_case(b"cas") {
        parse_storage(&args, true).map(Parsed::AwaitingData)
    } else {
        Err(ProtocolError::UnknownCommand)
    }
}

fn parse_keys(args: &[&[u8]]) -> Result<Vec<Bytes>> {
    if args.is_empty() {
        return Err(ProtocolError::Client("expected at least one key".into()));
    }
    args.iter().map(|key| parse_key(key)).collect()
}

fn parse_delete(args: &[&[u8]]) -> Result<Command> {
    match args {
        [key] => Ok(Command::Delete {
            key: parse_key(key)?,
            noreply: false,
        }),
        [key, flag] => Ok(Command::Delete {
            key: parse_key(key)?,
            noreply: parse_noreply(flag)?,
        }),
        _ => Err(ProtocolError::Client("bad command line format".into())),
    }
}

/// `<key> <flags> <exptime> <bytes> [<cas unique>] [noreply]`
fn parse_storage(args: &[&[u8]], with_cas: bool) -> Result<PendingStore> {
    let required = if with_cas { 5 } else { 4 };
    if args.len() != required && args.len() != required + 1 {
        return Err(ProtocolError::Client("bad command line format".into()));
    }

    let key = parse_key(args[0])?;
    let flags = parse_number(args[1])?;
    let exptime = parse_number(args[2])?;
    let len: usize = parse_number(args[3])?;
    let cas = if with_cas {
        Some(parse_number(args[4])?)
    } else {
        None
    };
    let noreply = match args.get(required) {
        Some(flag) => parse_noreply(flag)?,
        None => false,
    };

    if len > MAX_VALUE_SIZE {
        return Err(ProtocolError::Server("object too large for cache".into()));
    }

    Ok(PendingStore {
        key,
        flags,
        exptime,
        len,
        cas,
        noreply,
    })
}

fn parse_key(raw: &[u8]) -> Result<Bytes> {
    if raw.len() > MAX_KEY_LENGTH {
        return Err(ProtocolError::Client(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if raw.iter().any(|byte| byte.is_ascii_control()) {
        return Err(ProtocolError::Client("key contains control characters".into()));
    }
    Ok(Bytes::copy_from_slice(raw))
}

fn parse_number<T: std::str::FromStr>(raw: &[u8]) -> Result<T> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| ProtocolError::Client("bad command line format".into()))
}

fn parse_noreply(raw: &[u8]) -> Result<bool> {
    if raw.eq_ignore_ascii_case(b"noreply") {
        Ok(true)
    } else {
        Err(ProtocolError::Client("bad command line format".into()))
    }
}

// == Encoder ==
/// Appends the wire form of `response` to `dst`.
pub fn encode_response(response: &Response, dst: &mut BytesMut) {
    match response {
        Response::Values { items, with_cas } => {
            for item in items {
                dst.extend_from_slice(b"VALUE ");
                dst.extend_from_slice(&item.key);
                let header = if *with_cas {
                    format!(" {} {} {}", item.flags, item.value.len(), item.cas)
                } else {
                    format!(" {} {}", item.flags, item.value.len())
                };
                dst.extend_from_slice(header.as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&item.value);
                dst.extend_from_slice(CRLF);
            }
            dst.extend_from_slice(b"END\r\n");
        }
        Response::Stored => dst.extend_from_slice(b"STORED\r\n"),
        Response::Exists => dst.extend_from_slice(b"EXISTS\r\n"),
        Response::NotFound => dst.extend_from_slice(b"NOT_FOUND\r\n"),
        Response::Deleted => dst.extend_from_slice(b"DELETED\r\n"),
    }
}

/// Appends the error line for `error` to `dst`, if it has one.
pub fn encode_error(error: &ProtocolError, dst: &mut BytesMut) {
    if let Some(line) = error.reply_line() {
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(CRLF);
    }
}
