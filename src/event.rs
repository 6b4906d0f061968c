//! Application-facing events.
//!
//! Callbacks run synchronously on the packet processing path. Anything slow
//! should be handed off, e.g. by using the channel-backed sink, which turns
//! every callback into an [`Event`].

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::qos::QoS;

/// Receives the events produced by the packet handler.
///
/// Every method defaults to a no-op, so implementors only override what they
/// care about. `&mut self` plays the role of the client handle: whatever
/// state a callback needs lives in the implementor.
pub trait EventHandler {
    fn on_connect(&mut self, flags: u8, result: u8) {
        let _ = (flags, result);
    }

    fn on_message(&mut self, topic: &str, payload: &Bytes, qos: QoS) {
        let _ = (topic, payload, qos);
    }

    /// `packet` is the raw DISCONNECT body.
    fn on_disconnect(&mut self, packet: &Bytes) {
        let _ = packet;
    }

    /// `granted_qos` holds one return code per requested subscription.
    fn on_subscribe(&mut self, packet_id: u16, granted_qos: &[u8]) {
        let _ = (packet_id, granted_qos);
    }
}

impl EventHandler for () {}

impl<E: EventHandler + ?Sized> EventHandler for Box<E> {
    fn on_connect(&mut self, flags: u8, result: u8) {
        (**self).on_connect(flags, result)
    }

    fn on_message(&mut self, topic: &str, payload: &Bytes, qos: QoS) {
        (**self).on_message(topic, payload, qos)
    }

    fn on_disconnect(&mut self, packet: &Bytes) {
        (**self).on_disconnect(packet)
    }

    fn on_subscribe(&mut self, packet_id: u16, granted_qos: &[u8]) {
        (**self).on_subscribe(packet_id, granted_qos)
    }
}

type ConnectCallback = Box<dyn FnMut(u8, u8) + Send>;
type MessageCallback = Box<dyn FnMut(&str, &Bytes, QoS) + Send>;
type DisconnectCallback = Box<dyn FnMut(&Bytes) + Send>;
type SubscribeCallback = Box<dyn FnMut(u16, &[u8]) + Send>;

/// Closure-backed [`EventHandler`] with four independent slots.
pub struct Callbacks {
    on_connect: ConnectCallback,
    on_message: MessageCallback,
    on_disconnect: DisconnectCallback,
    on_subscribe: SubscribeCallback,
}

impl Default for Callbacks {
    fn default() -> Self {
        Callbacks {
            on_connect: Box::new(|_, _| {}),
            on_message: Box::new(|_, _, _| {}),
            on_disconnect: Box::new(|_| {}),
            on_subscribe: Box::new(|_, _| {}),
        }
    }
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_on_connect<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(u8, u8) + Send + 'static,
    {
        self.on_connect = Box::new(callback);
        self
    }

    pub fn set_on_message<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&str, &Bytes, QoS) + Send + 'static,
    {
        self.on_message = Box::new(callback);
        self
    }

    pub fn set_on_disconnect<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&Bytes) + Send + 'static,
    {
        self.on_disconnect = Box::new(callback);
        self
    }

    pub fn set_on_subscribe<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(u16, &[u8]) + Send + 'static,
    {
        self.on_subscribe = Box::new(callback);
        self
    }
}

impl EventHandler for Callbacks {
    fn on_connect(&mut self, flags: u8, result: u8) {
        (self.on_connect)(flags, result)
    }

    fn on_message(&mut self, topic: &str, payload: &Bytes, qos: QoS) {
        (self.on_message)(topic, payload, qos)
    }

    fn on_disconnect(&mut self, packet: &Bytes) {
        (self.on_disconnect)(packet)
    }

    fn on_subscribe(&mut self, packet_id: u16, granted_qos: &[u8]) {
        (self.on_subscribe)(packet_id, granted_qos)
    }
}

/// Events forwarded to an async consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected {
        flags: u8,
        result: u8,
    },

    Message {
        topic: String,
        payload: Bytes,
        qos: QoS,
    },

    Disconnected {
        packet: Bytes,
    },

    Subscribed {
        packet_id: u16,
        granted_qos: Vec<u8>,
    },
}

impl EventHandler for mpsc::UnboundedSender<Event> {
    fn on_connect(&mut self, flags: u8, result: u8) {
        forward(self, Event::Connected { flags, result });
    }

    fn on_message(&mut self, topic: &str, payload: &Bytes, qos: QoS) {
        forward(
            self,
            Event::Message {
                topic: topic.to_string(),
                payload: payload.clone(),
                qos,
            },
        );
    }

    fn on_disconnect(&mut self, packet: &Bytes) {
        forward(
            self,
            Event::Disconnected {
                packet: packet.clone(),
            },
        );
    }

    fn on_subscribe(&mut self, packet_id: u16, granted_qos: &[u8]) {
        forward(
            self,
            Event::Subscribed {
                packet_id,
                granted_qos: granted_qos.to_vec(),
            },
        );
    }
}

fn forward(tx: &mpsc::UnboundedSender<Event>, event: Event) {
    if let Err(e) = tx.send(event) {
        debug!("Event receiver dropped, discarding {:?}", e.0);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use crate::{event::*, qos::QoS};

    #[test]
    fn test_default_callbacks_are_noops() {
        let mut callbacks = Callbacks::new();

        callbacks.on_connect(0, 0);
        callbacks.on_message("a/b", &Bytes::from("x"), QoS::AtMostOnce);
        callbacks.on_disconnect(&Bytes::new());
        callbacks.on_subscribe(1, &[0]);
    }

    #[test]
    fn test_slots_are_independent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = Callbacks::new();

        let log = seen.clone();
        callbacks.set_on_message(move |topic, payload, qos| {
            log.lock()
                .unwrap()
                .push(format!("{} {:?} {:?}", topic, payload, qos));
        });

        let log = seen.clone();
        callbacks.set_on_subscribe(move |packet_id, granted| {
            log.lock()
                .unwrap()
                .push(format!("{} {:?}", packet_id, granted));
        });

        callbacks.on_connect(1, 0);
        callbacks.on_message("t", &Bytes::from("p"), QoS::AtLeastOnce);
        callbacks.on_subscribe(3, &[0x80]);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["t b\"p\" AtLeastOnce".to_string(), "3 [128]".to_string()]
        );
    }

    #[test]
    fn test_setter_replaces_slot() {
        let count = Arc::new(Mutex::new((0, 0)));
        let mut callbacks = Callbacks::new();

        let c = count.clone();
        callbacks.set_on_connect(move |_, _| c.lock().unwrap().0 += 1);
        let c = count.clone();
        callbacks.set_on_connect(move |_, _| c.lock().unwrap().1 += 1);

        callbacks.on_connect(0, 0);

        assert_eq!(*count.lock().unwrap(), (0, 1));
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (mut tx, mut rx) = mpsc::unbounded_channel::<Event>();

        tx.on_subscribe(1, &[0, 1, 128]);
        tx.on_message("a", &Bytes::from("b"), QoS::ExactlyOnce);

        assert_eq!(
            rx.recv().await,
            Some(Event::Subscribed {
                packet_id: 1,
                granted_qos: vec![0, 1, 128],
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(Event::Message {
                topic: "a".to_string(),
                payload: Bytes::from("b"),
                qos: QoS::ExactlyOnce,
            })
        );

        drop(rx);
        tx.on_connect(0, 0);
    }
}
