//! RESP2 protocol implementation
//!
//! This module implements the Redis Serialization Protocol (RESP2) for
//! encoding commands and decoding replies.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use redis_keeper_core::{
    error::{RedisError, RedisResult},
    types::RedisValue,
    value::RespValue,
};
use std::io::Cursor;

const CRLF: &[u8] = b"\r\n";

/// Encodes commands and RESP values into bytes
pub struct RespEncoder;

impl RespEncoder {
    /// Encode a RESP value into a buffer
    pub fn encode(value: &RespValue, buf: &mut BytesMut) {
        match value {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Error(e) => {
                buf.put_u8(b'-');
                buf.put_slice(e.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buf.put_u8(b':');
                buf.put_slice(i.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::BulkString(data) => Self::put_bulk(data, buf),
            RespValue::Null => {
                buf.put_slice(b"$-1\r\n");
            }
            RespValue::Array(arr) => {
                Self::put_len(b'*', arr.len(), buf);
                for item in arr {
                    Self::encode(item, buf);
                }
            }
        }
    }

    /// Append a command with arguments to `buf`.
    ///
    /// Clients must send commands as arrays of bulk strings, so every
    /// argument is written in its bulk form regardless of its type.
    pub fn encode_command_into(command: &str, args: &[RedisValue], buf: &mut BytesMut) {
        Self::put_len(b'*', 1 + args.len(), buf);
        Self::put_bulk(command.as_bytes(), buf);
        for arg in args {
            Self::put_bulk(&arg.to_bytes(), buf);
        }
    }

    /// Encode a command with arguments
    pub fn encode_command(command: &str, args: &[RedisValue]) -> Bytes {
        let mut buf = BytesMut::new();
        Self::encode_command_into(command, args, &mut buf);
        buf.freeze()
    }

    fn put_len(prefix: u8, len: usize, buf: &mut BytesMut) {
        buf.put_u8(prefix);
        buf.put_slice(len.to_string().as_bytes());
        buf.put_slice(CRLF);
    }

    fn put_bulk(data: &[u8], buf: &mut BytesMut) {
        Self::put_len(b'$', data.len(), buf);
        buf.put_slice(data);
        buf.put_slice(CRLF);
    }
}

/// Decodes RESP values from bytes
pub struct RespDecoder;

impl RespDecoder {
    /// Decode one RESP value from a buffer.
    ///
    /// Returns `Ok(None)` when the buffer holds only part of a value; the
    /// cursor position is meaningless in that case and callers retry from
    /// the start once more bytes arrive.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        if !buf.has_remaining() {
            return Ok(None);
        }

        let type_byte = buf.chunk()[0];

        match type_byte {
            b'+' => Self::decode_simple_string(buf),
            b'-' => Self::decode_error(buf),
            b':' => Self::decode_integer(buf),
            b'$' => Self::decode_bulk_string(buf),
            b'*' => Self::decode_array(buf),
            _ => Err(RedisError::Protocol(format!(
                "Invalid RESP type byte: {}",
                type_byte as char
            ))),
        }
    }

    fn decode_simple_string(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        buf.advance(1); // Skip '+'

        match Self::read_line(buf)? {
            Some(line) => Ok(Some(RespValue::SimpleString(Self::line_str(line)?))),
            None => Ok(None),
        }
    }

    fn decode_error(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        buf.advance(1); // Skip '-'

        match Self::read_line(buf)? {
            Some(line) => Ok(Some(RespValue::Error(Self::line_str(line)?))),
            None => Ok(None),
        }
    }

    fn decode_integer(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        buf.advance(1); // Skip ':'

        match Self::read_line(buf)? {
            Some(line) => Ok(Some(RespValue::Integer(Self::parse_int(line, "integer")?))),
            None => Ok(None),
        }
    }

    fn decode_bulk_string(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        buf.advance(1); // Skip '$'

        let len = match Self::read_line(buf)? {
            Some(line) => Self::parse_int(line, "bulk string length")?,
            None => return Ok(None),
        };

        if len == -1 {
            return Ok(Some(RespValue::Null));
        }
        let len = usize::try_from(len)
            .map_err(|_| RedisError::Protocol(format!("Invalid bulk string length: {len}")))?;

        // Payload plus trailing CRLF
        if buf.remaining() < len + 2 {
            return Ok(None);
        }

        let data = Bytes::copy_from_slice(&buf.chunk()[..len]);
        buf.advance(len);

        if &buf.chunk()[..2] != CRLF {
            return Err(RedisError::Protocol(
                "Bulk string not terminated by CRLF".to_string(),
            ));
        }
        buf.advance(2);

        Ok(Some(RespValue::BulkString(data)))
    }

    fn decode_array(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        buf.advance(1); // Skip '*'

        let len = match Self::read_line(buf)? {
            Some(line) => Self::parse_int(line, "array length")?,
            None => return Ok(None),
        };

        if len == -1 {
            return Ok(Some(RespValue::Null));
        }
        let len = usize::try_from(len)
            .map_err(|_| RedisError::Protocol(format!("Invalid array length: {len}")))?;

        // Length comes off the wire, so the preallocation is capped
        let mut arr = Vec::with_capacity(len.min(1024));

        for _ in 0..len {
            match Self::decode(buf)? {
                Some(value) => arr.push(value),
                None => return Ok(None),
            }
        }

        Ok(Some(RespValue::Array(arr)))
    }

    fn read_line<'a>(buf: &mut Cursor<&'a [u8]>) -> RedisResult<Option<&'a [u8]>> {
        let start = buf.position() as usize;
        let slice: &'a [u8] = *buf.get_ref();

        // Find CRLF
        for i in start..slice.len().saturating_sub(1) {
            if slice[i] == b'\r' && slice[i + 1] == b'\n' {
                buf.set_position((i + 2) as u64);
                return Ok(Some(&slice[start..i]));
            }
        }

        Ok(None)
    }

    fn line_str(line: &[u8]) -> RedisResult<String> {
        String::from_utf8(line.to_vec())
            .map_err(|e| RedisError::Protocol(format!("Invalid UTF-8: {}", e)))
    }

    fn parse_int(line: &[u8], what: &str) -> RedisResult<i64> {
        std::str::from_utf8(line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                RedisError::Protocol(format!(
                    "Invalid {}: {:?}",
                    what,
                    String::from_utf8_lossy(line)
                ))
            })
    }
}
