use std::mem;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::Error;

pub trait Decoder {
    fn decode<T>(buffer: &mut T) -> crate::Result<Self>
    where
        Self: Sized,
        T: Buf;
}

pub trait Encoder {
    fn encode(&self, buffer: &mut BytesMut);
    fn encoded_size(&self) -> usize {
        mem::size_of_val(self)
    }
}

fn encode_var_byte_integer(value: u32, encoded: &mut BytesMut) {
    let mut x = value;

    loop {
        let mut encoded_byte: u8 = (x % 128) as u8;
        x /= 128;

        if x > 0 {
            encoded_byte |= 0b1000_0000;
        }

        encoded.put_u8(encoded_byte);

        if x == 0 {
            break;
        }
    }
}

fn decode_var_byte_integer<T: Buf>(encoded: &mut T) -> crate::Result<VariableByteInteger> {
    let mut multiplier = 1;
    let mut value: u32 = 0;

    loop {
        // A fourth continuation bit is malformed whether or not more bytes
        // have arrived.
        if multiplier > (128 * 128 * 128) {
            return Err(Error::MalformedPacket("remaining length exceeds four bytes"));
        }

        if !encoded.has_remaining() {
            return Err(Error::PacketIncomplete);
        }

        let encoded_byte = encoded.get_u8();
        value += (encoded_byte & 0b0111_1111) as u32 * multiplier;
        multiplier *= 128;

        if (encoded_byte & 0b1000_0000) == 0 {
            break;
        }
    }

    Ok(VariableByteInteger(value))
}

/// Remaining length field of the fixed header.
#[derive(PartialEq, Eq, Debug, Default)]
pub struct VariableByteInteger(pub u32);

impl Encoder for VariableByteInteger {
    fn encode(&self, buffer: &mut BytesMut) {
        encode_var_byte_integer(self.0, buffer);
    }

    fn encoded_size(&self) -> usize {
        match self.0 {
            0..=127 => 1,
            128..=16383 => 2,
            16384..=2097151 => 3,
            _ => 4,
        }
    }
}

impl Decoder for VariableByteInteger {
    fn decode<T: Buf>(buffer: &mut T) -> crate::Result<Self> {
        decode_var_byte_integer(buffer)
    }
}

/// Length-prefixed UTF-8 string. An empty string decodes fine; callers that
/// forbid it check on their side.
impl Decoder for String {
    fn decode<T: Buf>(buffer: &mut T) -> crate::Result<Self> {
        if buffer.remaining() < 2 {
            return Err(Error::PacketIncomplete);
        }

        let length = buffer.get_u16() as usize;
        if buffer.remaining() < length {
            return Err(Error::PacketIncomplete);
        }

        let bytes = buffer.copy_to_bytes(length);

        String::from_utf8(bytes.to_vec()).map_err(|_| Error::MalformedPacket("invalid UTF-8"))
    }
}

impl Encoder for u8 {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.put_u8(*self);
    }
}

impl Decoder for u8 {
    fn decode<T: Buf>(buffer: &mut T) -> crate::Result<Self> {
        if !buffer.has_remaining() {
            return Err(Error::PacketIncomplete);
        }

        Ok(buffer.get_u8())
    }
}

impl Encoder for u16 {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.put_u16(*self);
    }
}

impl Decoder for u16 {
    fn decode<T: Buf>(buffer: &mut T) -> crate::Result<Self> {
        if buffer.remaining() < 2 {
            return Err(Error::PacketIncomplete);
        }

        Ok(buffer.get_u16())
    }
}

/// Removes one complete packet from the front of `src`.
///
/// Returns the fixed header byte and the body that follows the remaining
/// length field, or `None` when `src` does not hold a whole packet yet. On
/// `None` the buffer is left untouched.
pub fn split_frame(src: &mut BytesMut) -> crate::Result<Option<(u8, Bytes)>> {
    if src.is_empty() {
        return Ok(None);
    }

    let mut peeker = &src[1..];
    let remaining_len = match VariableByteInteger::decode(&mut peeker) {
        Ok(len) => len,
        Err(Error::PacketIncomplete) => return Ok(None),
        Err(e) => return Err(e),
    };

    // Non-minimal encodings are accepted, so count what was consumed.
    let header_len = src.len() - peeker.len();
    let frame_len = header_len + remaining_len.0 as usize;
    if src.len() < frame_len {
        return Ok(None);
    }

    let mut frame = src.split_to(frame_len);
    let header = frame[0];
    frame.advance(header_len);

    Ok(Some((header, frame.freeze())))
}
