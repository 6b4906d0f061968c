//! Decoders for the control packets a client receives.
//!
//! Every decoder works on the packet body, i.e. the bytes that follow the
//! remaining length field. The fixed header byte is passed separately where
//! its flags carry meaning.

pub mod connack;
pub mod publish;
pub mod pubrel;
pub mod suback;

use std::{convert::TryFrom, fmt};

use crate::error::Error;

/// MQTT 3.1.1 control packet types (high nibble of the fixed header).
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PacketType {
    Connect = 0x01,
    ConnAck,
    Publish,
    PubAck,
    PubRec,
    PubRel,
    PubComp,
    Subscribe,
    SubAck,
    Unsubscribe,
    UnsubAck,
    PingReq,
    PingResp,
    Disconnect,
}

impl PacketType {
    /// Splits a fixed header byte into its packet type.
    pub fn from_header(header: u8) -> crate::Result<Self> {
        Self::try_from(header >> 4)
    }

    /// Fixed header byte for this type with the given low nibble.
    pub fn header(self, flags: u8) -> u8 {
        ((self as u8) << 4) | (flags & 0x0f)
    }
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use PacketType::*;

        let res = match value {
            0x01 => Connect,
            0x02 => ConnAck,
            0x03 => Publish,
            0x04 => PubAck,
            0x05 => PubRec,
            0x06 => PubRel,
            0x07 => PubComp,
            0x08 => Subscribe,
            0x09 => SubAck,
            0x0a => Unsubscribe,
            0x0b => UnsubAck,
            0x0c => PingReq,
            0x0d => PingResp,
            0x0e => Disconnect,
            _ => return Err(Error::UnsupportedCommand(value)),
        };

        Ok(res)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PacketType::*;

        let name = match self {
            Connect => "CONNECT",
            ConnAck => "CONNACK",
            Publish => "PUBLISH",
            PubAck => "PUBACK",
            PubRec => "PUBREC",
            PubRel => "PUBREL",
            PubComp => "PUBCOMP",
            Subscribe => "SUBSCRIBE",
            SubAck => "SUBACK",
            Unsubscribe => "UNSUBSCRIBE",
            UnsubAck => "UNSUBACK",
            PingReq => "PINGREQ",
            PingResp => "PINGRESP",
            Disconnect => "DISCONNECT",
        };

        f.write_str(name)
    }
}
