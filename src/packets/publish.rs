use std::convert::TryFrom;

use bytes::{Buf, Bytes};

use crate::{codec::Decoder, error::Error, qos::QoS};

/// Flags carried in the low nibble of a PUBLISH fixed header.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct PublishFlags {
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
}

impl PublishFlags {
    pub fn from_header(header: u8) -> crate::Result<Self> {
        Ok(PublishFlags {
            dup: (header & 0b0000_1000) != 0,
            qos: QoS::try_from((header & 0b0000_0110) >> 1)?,
            retain: (header & 0b0000_0001) != 0,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishPacket {
    pub dup: bool,
    pub qos_level: QoS,
    pub retain: bool,
    pub topic_name: String,
    pub packet_id: Option<u16>,
    pub payload: Bytes,
}

impl PublishPacket {
    /// Decodes a PUBLISH body using the flags of its fixed header.
    pub fn decode_with_header<T: Buf>(header: u8, buffer: &mut T) -> crate::Result<Self> {
        let flags = PublishFlags::from_header(header)?;

        let topic_name = String::decode(buffer)?;
        if topic_name.is_empty() {
            return Err(Error::ProtocolViolation("topic name is empty"));
        }

        let packet_id = match flags.qos {
            QoS::AtMostOnce => None,
            QoS::AtLeastOnce | QoS::ExactlyOnce => Some(u16::decode(buffer)?),
        };

        let payload = buffer.copy_to_bytes(buffer.remaining());

        Ok(PublishPacket {
            dup: flags.dup,
            qos_level: flags.qos,
            retain: flags.retain,
            topic_name,
            packet_id,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::packets::publish::*;

    #[test]
    fn test_publish_flags() {
        let flags = PublishFlags::from_header(0x3d).expect("Unexpected error");

        assert!(flags.dup);
        assert_eq!(flags.qos, QoS::ExactlyOnce);
        assert!(flags.retain);

        assert!(matches!(
            PublishFlags::from_header(0x36),
            Err(Error::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_publish_packet_decode_qos0() {
        let mut bytes = Bytes::from_static(&[0x00, 0x03, b'a', b'/', b'b', b'h', b'i']);

        let packet = PublishPacket::decode_with_header(0x30, &mut bytes).expect("Unexpected error");

        assert_eq!(packet.topic_name, "a/b");
        assert_eq!(packet.packet_id, None);
        assert_eq!(packet.payload, Bytes::from_static(b"hi"));
        assert_eq!(packet.qos_level, QoS::AtMostOnce);
    }

    #[test]
    fn test_publish_packet_decode_qos1() {
        let mut bytes = Bytes::from_static(&[0x00, 0x01, b't', 0x12, 0x34, 0xde, 0xad]);

        let packet = PublishPacket::decode_with_header(0x32, &mut bytes).expect("Unexpected error");

        assert_eq!(packet.topic_name, "t");
        assert_eq!(packet.packet_id, Some(0x1234));
        assert_eq!(packet.payload, Bytes::from_static(&[0xde, 0xad]));
        assert!(!packet.dup);
        assert!(!packet.retain);
    }

    #[test]
    fn test_publish_packet_empty_payload() {
        let mut bytes = Bytes::from_static(&[0x00, 0x01, b't', 0x00, 0x01]);

        let packet = PublishPacket::decode_with_header(0x34, &mut bytes).expect("Unexpected error");

        assert_eq!(packet.packet_id, Some(1));
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_publish_packet_empty_topic() {
        let mut bytes = Bytes::from_static(&[0x00, 0x00, b'x']);

        assert!(matches!(
            PublishPacket::decode_with_header(0x30, &mut bytes),
            Err(Error::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_publish_packet_missing_packet_id() {
        let mut bytes = Bytes::from_static(&[0x00, 0x01, b't', 0x01]);

        assert!(matches!(
            PublishPacket::decode_with_header(0x32, &mut bytes),
            Err(Error::PacketIncomplete)
        ));
    }
}
