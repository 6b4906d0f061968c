use bytes::Buf;

use crate::codec::Decoder;

/// Return code signalling a rejected subscription.
pub const SUBSCRIPTION_FAILURE: u8 = 0x80;

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct SubAckPacket {
    pub packet_id: u16,
    /// One entry per requested topic filter: the granted QoS (0, 1, 2) or
    /// `SUBSCRIPTION_FAILURE`.
    pub return_codes: Vec<u8>,
}

impl SubAckPacket {
    pub fn failures(&self) -> usize {
        self.return_codes
            .iter()
            .filter(|code| **code == SUBSCRIPTION_FAILURE)
            .count()
    }
}

impl Decoder for SubAckPacket {
    /// Decodes a SUBACK body in MQTT 3.x format: packet id + return codes.
    fn decode<T: Buf>(buffer: &mut T) -> crate::Result<Self> {
        let packet_id = u16::decode(buffer)?;

        let mut return_codes = Vec::with_capacity(buffer.remaining());
        while buffer.has_remaining() {
            return_codes.push(buffer.get_u8());
        }

        Ok(SubAckPacket {
            packet_id,
            return_codes,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{error::Error, packets::suback::*};

    #[test]
    fn test_suback_packet_decode() {
        let mut bytes = Bytes::from_static(&[0x00, 0x01, 0x00, 0x01, 0x80]);

        let packet = SubAckPacket::decode(&mut bytes).expect("Unexpected error");

        assert_eq!(packet.packet_id, 1);
        assert_eq!(packet.return_codes, vec![0, 1, 128]);
        assert_eq!(packet.failures(), 1);
    }

    #[test]
    fn test_suback_packet_truncated() {
        let mut bytes = Bytes::from_static(&[0x00]);

        assert!(matches!(
            SubAckPacket::decode(&mut bytes),
            Err(Error::PacketIncomplete)
        ));
    }
}
