use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Packet is not complete")]
    PacketIncomplete,

    #[error("Malformed packet: {0}")]
    MalformedPacket(&'static str),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(&'static str),

    #[error("Unsupported command: {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("Packet identifier {0} is already in use")]
    PacketIdentifierInUse(u16),

    #[error("Panic while handling packet: {0}")]
    Panicked(String),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Decode errors and protocol anomalies are expected from a misbehaving
    /// peer; everything else points at the local side.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Error::PacketIncomplete
                | Error::MalformedPacket(_)
                | Error::ProtocolViolation(_)
                | Error::UnsupportedCommand(_)
                | Error::PacketIdentifierInUse(_)
        )
    }
}
