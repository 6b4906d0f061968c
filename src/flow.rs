//! Receiver side of the QoS 2 handshake.
//!
//! A message enters the table when its PUBLISH is answered with PUBREC and
//! leaves it when the matching PUBREL arrives. Only then is it handed to the
//! application, which is what makes delivery exactly-once.

use std::collections::{hash_map::Entry, HashMap};

use bytes::Bytes;

use crate::{error::Error, qos::QoS};

/// QoS 2 message held between PUBREC and PUBREL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub packet_id: u16,
    pub topic: String,
    pub payload: Bytes,
    pub qos: QoS,
}

#[derive(Debug, Default)]
pub struct InboundFlow {
    pending: HashMap<u16, InboundMessage>,
}

impl InboundFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message awaiting PUBREL.
    ///
    /// Fails with `PacketIdentifierInUse` if the id is already pending; the
    /// stored message is kept as is.
    pub fn store(&mut self, message: InboundMessage) -> crate::Result<()> {
        match self.pending.entry(message.packet_id) {
            Entry::Occupied(_) => Err(Error::PacketIdentifierInUse(message.packet_id)),
            Entry::Vacant(slot) => {
                slot.insert(message);
                Ok(())
            }
        }
    }

    /// Removes and returns the message released by a PUBREL.
    pub fn resolve(&mut self, packet_id: u16) -> Option<InboundMessage> {
        self.pending.remove(&packet_id)
    }

    pub fn contains(&self, packet_id: u16) -> bool {
        self.pending.contains_key(&packet_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending message. Called when the connection goes away.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{error::Error, flow::*, qos::QoS};

    fn create_test_message(packet_id: u16, payload: &'static str) -> InboundMessage {
        InboundMessage {
            packet_id,
            topic: "sensors/temp".to_string(),
            payload: Bytes::from(payload),
            qos: QoS::ExactlyOnce,
        }
    }

    #[test]
    fn test_store_and_resolve() {
        let mut flow = InboundFlow::new();

        flow.store(create_test_message(1, "21.5")).unwrap();
        assert!(flow.contains(1));
        assert_eq!(flow.len(), 1);

        let message = flow.resolve(1).unwrap();
        assert_eq!(message.payload, Bytes::from("21.5"));
        assert!(flow.is_empty());

        // Released exactly once.
        assert!(flow.resolve(1).is_none());
    }

    #[test]
    fn test_duplicate_id_keeps_first_message() {
        let mut flow = InboundFlow::new();

        flow.store(create_test_message(7, "first")).unwrap();

        match flow.store(create_test_message(7, "second")) {
            Err(Error::PacketIdentifierInUse(7)) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(flow.resolve(7).unwrap().payload, Bytes::from("first"));
    }

    #[test]
    fn test_clear() {
        let mut flow = InboundFlow::new();

        flow.store(create_test_message(1, "a")).unwrap();
        flow.store(create_test_message(2, "b")).unwrap();

        assert_eq!(flow.clear(), 2);
        assert!(flow.is_empty());
        assert!(!flow.contains(1));
    }
}
