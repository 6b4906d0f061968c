//! Inbound packet dispatch.
//!
//! The transport read loop calls [`PacketHandler::handle`] once per framed
//! packet. Decoding, acknowledgments and application callbacks all happen
//! inside that call, in packet arrival order, and nothing escapes it: a bad
//! packet or a panicking callback costs that one packet, never the
//! connection.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    time::Instant,
};

use bytes::Bytes;
use tracing::{debug, error, info, warn, Span};

use crate::{
    ack::AckSender,
    codec::Decoder,
    config::{HandlerOptions, ReadinessPolicy},
    error::Error,
    event::{Callbacks, EventHandler},
    flow::{InboundFlow, InboundMessage},
    packets::{
        connack::ConnAckPacket, publish::PublishPacket, pubrel::PubRelPacket,
        suback::SubAckPacket, PacketType,
    },
    qos::QoS,
    ready::ConnectionReady,
};

pub struct PacketHandler<S, E = Callbacks> {
    sender: S,
    events: E,
    inflight: InboundFlow,
    ready: ConnectionReady,
    options: HandlerOptions,
    last_activity: Option<Instant>,
    span: Span,
}

impl<S: AckSender> PacketHandler<S, Callbacks> {
    /// Create a handler with no-op callbacks; register them through
    /// [`events_mut`](Self::events_mut).
    pub fn new(sender: S) -> Self {
        Self::with_events(sender, Callbacks::new())
    }
}

impl<S: AckSender, E: EventHandler> PacketHandler<S, E> {
    pub fn with_events(sender: S, events: E) -> Self {
        PacketHandler {
            sender,
            events,
            inflight: InboundFlow::new(),
            ready: ConnectionReady::new(),
            options: HandlerOptions::default(),
            last_activity: None,
            span: Span::none(),
        }
    }

    /// Replace the options. Invalid options are rejected here, before any
    /// packet is processed.
    pub fn with_options(mut self, options: HandlerOptions) -> crate::Result<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Span entered for every handled packet, typically carrying the client
    /// id or peer address.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Share an existing readiness flag instead of the handler's own.
    pub fn with_readiness(mut self, ready: ConnectionReady) -> Self {
        self.ready = ready;
        self
    }

    /// Handle to the readiness flag of this connection.
    pub fn ready(&self) -> ConnectionReady {
        self.ready.clone()
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn sender_mut(&mut self) -> &mut S {
        &mut self.sender
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// QoS 2 messages received but not yet released.
    pub fn inflight(&self) -> &InboundFlow {
        &self.inflight
    }

    /// When the last packet was handled successfully.
    pub fn last_activity(&self) -> Option<Instant> {
        self.last_activity
    }

    /// Forget pending QoS 2 messages. The transport calls this when the
    /// connection is gone; returns how many were dropped.
    pub fn reset_session(&mut self) -> usize {
        let dropped = self.inflight.clear();
        if dropped > 0 {
            warn!("Dropped {} unreleased QoS 2 messages", dropped);
        }
        dropped
    }

    pub fn into_parts(self) -> (S, E) {
        (self.sender, self.events)
    }

    /// Process one packet. `header` is the fixed header byte (packet type and
    /// flags), `body` everything after the remaining length.
    pub fn handle(&mut self, header: u8, body: Bytes) {
        let span = self.span.clone();
        let _enter = span.enter();

        debug!("[CMD {:#04x}] {} bytes", header, body.len());

        match self.guarded_dispatch(header, &body) {
            Ok(()) => self.last_activity = Some(Instant::now()),
            Err(e) => self.report(header, &body, &e),
        }
    }

    /// Runs `dispatch`, turning a panic from a decoder or a callback into
    /// `Error::Panicked`.
    fn guarded_dispatch(&mut self, header: u8, body: &Bytes) -> crate::Result<()> {
        panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(header, body.clone())))
            .unwrap_or_else(|payload| Err(Error::Panicked(panic_message(payload))))
    }

    fn dispatch(&mut self, header: u8, mut body: Bytes) -> crate::Result<()> {
        use PacketType::*;

        let packet_type = PacketType::from_header(header)?;

        match packet_type {
            ConnAck => self.handle_connack(&mut body),
            Publish => self.handle_publish(header, &mut body),
            PubRel => self.handle_pubrel(&mut body),
            SubAck => self.handle_suback(&mut body),
            Disconnect => {
                info!("Received DISCONNECT");
                self.events.on_disconnect(&body);
                Ok(())
            }
            PingReq => {
                info!("[PING REQUEST]");
                Ok(())
            }
            PingResp => {
                info!("[PING RESPONSE]");
                Ok(())
            }
            // Acknowledgments of client-initiated publishes; tracking those
            // belongs to the outbound side.
            PubAck | PubRec | PubComp => {
                debug!("Received {} for {:?}", packet_type, u16::decode(&mut body).ok());
                Ok(())
            }
            Connect | Subscribe | Unsubscribe | UnsubAck => {
                debug!("Ignoring {}", packet_type);
                Ok(())
            }
        }
    }

    fn handle_connack(&mut self, body: &mut Bytes) -> crate::Result<()> {
        let packet = ConnAckPacket::decode(body)?;

        debug!(
            "[CONNACK] flags: {:#04x}, result: {:#04x}",
            packet.flags, packet.return_code
        );

        let ready = match self.options.readiness {
            ReadinessPolicy::SuccessOnly => packet.accepted(),
            ReadinessPolicy::AnyConnack => true,
        };

        if ready && self.ready.set() {
            info!(
                "Connection ready, session_present: {}",
                packet.session_present()
            );
        }

        if !packet.accepted() {
            warn!("Connection refused: {}", packet.reason());
        }

        self.events.on_connect(packet.flags, packet.return_code);

        Ok(())
    }

    fn handle_publish(&mut self, header: u8, body: &mut Bytes) -> crate::Result<()> {
        let packet = PublishPacket::decode_with_header(header, body)?;

        debug!(
            "[RECV {} with QoS: {:?}] {} bytes, dup: {}, retain: {}",
            packet.topic_name,
            packet.qos_level,
            packet.payload.len(),
            packet.dup,
            packet.retain
        );

        match packet.qos_level {
            QoS::AtMostOnce => {
                self.events
                    .on_message(&packet.topic_name, &packet.payload, QoS::AtMostOnce);
            }
            QoS::AtLeastOnce => {
                let packet_id = packet
                    .packet_id
                    .ok_or(Error::MalformedPacket("missing packet identifier"))?;

                self.sender.send_puback(packet_id)?;
                self.events
                    .on_message(&packet.topic_name, &packet.payload, QoS::AtLeastOnce);
            }
            QoS::ExactlyOnce => {
                let packet_id = packet
                    .packet_id
                    .ok_or(Error::MalformedPacket("missing packet identifier"))?;

                let message = InboundMessage {
                    packet_id,
                    topic: packet.topic_name,
                    payload: packet.payload,
                    qos: QoS::ExactlyOnce,
                };

                // A retransmission of a message still awaiting PUBREL: keep
                // the first copy and acknowledge again.
                if let Err(e) = self.inflight.store(message) {
                    warn!("{} (dup: {}), keeping the pending message", e, packet.dup);
                }

                self.sender.send_pubrec(packet_id)?;
            }
        }

        Ok(())
    }

    fn handle_pubrel(&mut self, body: &mut Bytes) -> crate::Result<()> {
        let packet = PubRelPacket::decode(body)?;

        match self.inflight.resolve(packet.packet_id) {
            Some(message) => {
                self.events
                    .on_message(&message.topic, &message.payload, message.qos);
            }
            None => {
                debug!(
                    "PUBREL for unknown packet id {}, completing without delivery",
                    packet.packet_id
                );
            }
        }

        self.sender.send_pubcomp(packet.packet_id)
    }

    fn handle_suback(&mut self, body: &mut Bytes) -> crate::Result<()> {
        let packet = SubAckPacket::decode(body)?;

        info!("[SUBACK] {} {:?}", packet.packet_id, packet.return_codes);
        if packet.failures() > 0 {
            warn!(
                "{} of {} subscriptions rejected for packet id {}",
                packet.failures(),
                packet.return_codes.len(),
                packet.packet_id
            );
        }

        self.events
            .on_subscribe(packet.packet_id, &packet.return_codes);

        Ok(())
    }

    fn report(&self, header: u8, body: &Bytes, e: &Error) {
        let limit = self.options.payload_log_limit.min(body.len());
        let shown = body.slice(..limit);
        let truncated = if body.len() > limit { "..." } else { "" };

        if e.is_protocol_error() {
            warn!(
                "Dropping packet {:#04x} {:?}{}: {}",
                header, shown, truncated, e
            );
        } else {
            error!(
                "Error handling packet {:#04x} {:?}{}: {}",
                header, shown, truncated, e
            );
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
