use bytes::Buf;

use crate::{codec::Decoder, error::Error};

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct PubRelPacket {
    pub packet_id: u16,
}

impl Decoder for PubRelPacket {
    fn decode<T: Buf>(buffer: &mut T) -> crate::Result<Self> {
        let packet_id = u16::decode(buffer)?;

        if buffer.has_remaining() {
            return Err(Error::MalformedPacket("PUBREL body must be 2 bytes"));
        }

        Ok(PubRelPacket { packet_id })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::packets::pubrel::*;

    #[test]
    fn test_pubrel_packet_decode() {
        let mut bytes = Bytes::from_static(&[0x01, 0x02]);

        let packet = PubRelPacket::decode(&mut bytes).expect("Unexpected error");
        assert_eq!(packet.packet_id, 0x0102);
    }

    #[test]
    fn test_pubrel_packet_bad_length() {
        let mut short = Bytes::from_static(&[0x01]);
        assert!(matches!(
            PubRelPacket::decode(&mut short),
            Err(Error::PacketIncomplete)
        ));

        let mut long = Bytes::from_static(&[0x00, 0x01, 0x00]);
        assert!(matches!(
            PubRelPacket::decode(&mut long),
            Err(Error::MalformedPacket(_))
        ));
    }
}
