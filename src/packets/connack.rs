use std::fmt;

use bytes::Buf;

use crate::{codec::Decoder, error::Error};

/// Connect return code, see section 3.2.2.3 of MQTT 3.1.1.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ConnectReturnCode {
    Accepted,
    UnacceptableProtocolVersion,
    IdentifierRejected,
    ServerUnavailable,
    BadUserNameOrPassword,
    NotAuthorized,
    Reserved(u8),
}

impl From<u8> for ConnectReturnCode {
    fn from(code: u8) -> Self {
        use ConnectReturnCode::*;

        match code {
            0x00 => Accepted,
            0x01 => UnacceptableProtocolVersion,
            0x02 => IdentifierRejected,
            0x03 => ServerUnavailable,
            0x04 => BadUserNameOrPassword,
            0x05 => NotAuthorized,
            n => Reserved(n),
        }
    }
}

impl fmt::Display for ConnectReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConnectReturnCode::*;

        match self {
            Accepted => write!(f, "Connection accepted"),
            UnacceptableProtocolVersion => write!(f, "Unacceptable protocol version"),
            IdentifierRejected => write!(f, "Identifier rejected"),
            ServerUnavailable => write!(f, "Server unavailable"),
            BadUserNameOrPassword => write!(f, "Bad user name or password"),
            NotAuthorized => write!(f, "Not authorized"),
            Reserved(n) => write!(f, "Reserved return code {:#04x}", n),
        }
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct ConnAckPacket {
    pub flags: u8,
    pub return_code: u8,
}

impl ConnAckPacket {
    pub fn session_present(&self) -> bool {
        (self.flags & 0b0000_0001) != 0
    }

    pub fn accepted(&self) -> bool {
        self.return_code == 0x00
    }

    pub fn reason(&self) -> ConnectReturnCode {
        self.return_code.into()
    }
}

impl Decoder for ConnAckPacket {
    fn decode<T: Buf>(buffer: &mut T) -> crate::Result<Self> {
        if buffer.remaining() != 2 {
            return Err(Error::MalformedPacket("CONNACK body must be 2 bytes"));
        }

        let flags = u8::decode(buffer)?;
        let return_code = u8::decode(buffer)?;

        Ok(ConnAckPacket { flags, return_code })
    }
}
