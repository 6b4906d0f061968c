//! Mercurio inbound packet processing
//!
//! This crate implements the receiving half of an MQTT 3.1.1 client: it
//! decodes the control packets sent by a broker, runs the QoS 1 and QoS 2
//! acknowledgment flows and hands the results to application callbacks.
//! Socket I/O stays with the transport, which frames packets (see
//! [`codec::split_frame`]) and transmits acknowledgments through an
//! [`AckSender`].
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use mercurio_inbound::PacketHandler;
//!
//! let mut handler = PacketHandler::new(Vec::<Bytes>::new());
//!
//! handler.events_mut().set_on_message(|topic, payload, qos| {
//!     println!("{}: {:?} ({:?})", topic, payload, qos);
//! });
//!
//! // QoS 1 PUBLISH on "a/b" with packet id 10
//! handler.handle(
//!     0x32,
//!     Bytes::from_static(&[0x00, 0x03, b'a', b'/', b'b', 0x00, 0x0a, b'h', b'i']),
//! );
//!
//! assert_eq!(
//!     handler.sender()[0],
//!     Bytes::from_static(&[0x40, 0x02, 0x00, 0x0a])
//! );
//! ```

pub mod ack;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod flow;
pub mod handler;
pub mod packets;
pub mod qos;
pub mod ready;

pub use ack::AckSender;
pub use config::{HandlerOptions, ReadinessPolicy};
pub use error::Error;
pub use event::{Callbacks, Event, EventHandler};
pub use flow::InboundMessage;
pub use handler::PacketHandler;
pub use qos::QoS;
pub use ready::ConnectionReady;

/// A specialized `Result` type for mercurio operations
///
/// This is defined as a convenience
pub type Result<T> = std::result::Result<T, crate::error::Error>;
