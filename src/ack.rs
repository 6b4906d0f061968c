//! Outbound acknowledgment frames.
//!
//! The handler never owns the socket. Whatever owns it implements
//! [`AckSender`] and receives one call per acknowledgment to transmit.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;

use crate::{
    codec::{Encoder, VariableByteInteger},
    packets::PacketType,
};

const DUP_FLAG: u8 = 0b0000_1000;

/// Encodes a 4-byte acknowledgment: fixed header, remaining length (always
/// 2) and the packet id in network byte order.
pub fn encode(header: u8, packet_id: u16, dup: bool) -> Bytes {
    let mut buffer = BytesMut::with_capacity(4);

    let header = if dup { header | DUP_FLAG } else { header };
    header.encode(&mut buffer);
    VariableByteInteger(packet_id.encoded_size() as u32).encode(&mut buffer);
    packet_id.encode(&mut buffer);

    buffer.freeze()
}

pub trait AckSender {
    /// Transmits a control packet made of `header` and `packet_id` only.
    fn send_control_with_id(&mut self, header: u8, packet_id: u16, dup: bool) -> crate::Result<()>;

    fn send_puback(&mut self, packet_id: u16) -> crate::Result<()> {
        self.send_control_with_id(PacketType::PubAck.header(0), packet_id, false)
    }

    fn send_pubrec(&mut self, packet_id: u16) -> crate::Result<()> {
        self.send_control_with_id(PacketType::PubRec.header(0), packet_id, false)
    }

    /// PUBREL carries the reserved flag bits `0b0010`.
    fn send_pubrel(&mut self, packet_id: u16, dup: bool) -> crate::Result<()> {
        self.send_control_with_id(PacketType::PubRel.header(0b0010), packet_id, dup)
    }

    fn send_pubcomp(&mut self, packet_id: u16) -> crate::Result<()> {
        self.send_control_with_id(PacketType::PubComp.header(0), packet_id, false)
    }
}

impl<A: AckSender + ?Sized> AckSender for &mut A {
    fn send_control_with_id(&mut self, header: u8, packet_id: u16, dup: bool) -> crate::Result<()> {
        (**self).send_control_with_id(header, packet_id, dup)
    }
}

impl<A: AckSender + ?Sized> AckSender for Box<A> {
    fn send_control_with_id(&mut self, header: u8, packet_id: u16, dup: bool) -> crate::Result<()> {
        (**self).send_control_with_id(header, packet_id, dup)
    }
}

/// Appends frames to a write buffer that the transport flushes.
impl AckSender for BytesMut {
    fn send_control_with_id(&mut self, header: u8, packet_id: u16, dup: bool) -> crate::Result<()> {
        self.put(encode(header, packet_id, dup));
        Ok(())
    }
}

impl AckSender for Vec<Bytes> {
    fn send_control_with_id(&mut self, header: u8, packet_id: u16, dup: bool) -> crate::Result<()> {
        self.push(encode(header, packet_id, dup));
        Ok(())
    }
}

/// Hands frames to a writer task.
impl AckSender for mpsc::UnboundedSender<Bytes> {
    fn send_control_with_id(&mut self, header: u8, packet_id: u16, dup: bool) -> crate::Result<()> {
        self.send(encode(header, packet_id, dup))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "ack channel closed"))?;
        Ok(())
    }
}

/// Never waits for capacity: `handle` runs on the read path and must not
/// block, so a full channel is reported as an error instead.
impl AckSender for mpsc::Sender<Bytes> {
    fn send_control_with_id(&mut self, header: u8, packet_id: u16, dup: bool) -> crate::Result<()> {
        self.try_send(encode(header, packet_id, dup))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    io::Error::new(io::ErrorKind::WouldBlock, "ack channel full")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    io::Error::new(io::ErrorKind::BrokenPipe, "ack channel closed")
                }
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};
    use tokio::sync::mpsc;

    use crate::{ack::*, error::Error};

    #[test]
    fn test_encode_ack() {
        assert_eq!(encode(0x40, 0x0102, false), Bytes::from_static(&[0x40, 0x02, 0x01, 0x02]));
        assert_eq!(encode(0x62, 7, true), Bytes::from_static(&[0x6a, 0x02, 0x00, 0x07]));
    }

    #[test]
    fn test_helpers_use_expected_headers() -> crate::Result<()> {
        let mut sent: Vec<Bytes> = Vec::new();

        sent.send_puback(1)?;
        sent.send_pubrec(2)?;
        sent.send_pubrel(3, false)?;
        sent.send_pubcomp(4)?;

        let headers: Vec<u8> = sent.iter().map(|frame| frame[0]).collect();
        assert_eq!(headers, vec![0x40, 0x50, 0x62, 0x70]);
        assert!(sent.iter().all(|frame| frame.len() == 4));

        Ok(())
    }

    #[test]
    fn test_bytes_mut_sender() -> crate::Result<()> {
        let mut buffer = BytesMut::new();

        buffer.send_puback(9)?;
        buffer.send_pubcomp(10)?;

        assert_eq!(&buffer[..], &[0x40, 0x02, 0x00, 0x09, 0x70, 0x02, 0x00, 0x0a]);

        Ok(())
    }

    #[tokio::test]
    async fn test_channel_sender() {
        let (mut tx, mut rx) = mpsc::unbounded_channel::<Bytes>();

        tx.send_pubrec(5).expect("Unexpected error");
        assert_eq!(rx.recv().await, Some(Bytes::from_static(&[0x50, 0x02, 0x00, 0x05])));

        drop(rx);
        assert!(matches!(tx.send_pubrec(6), Err(Error::Io(_))));
    }

    #[test]
    fn test_bounded_channel_full() {
        let (mut tx, _rx) = mpsc::channel::<Bytes>(1);

        tx.send_puback(1).expect("Unexpected error");
        match tx.send_puback(2) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
