//! inbound-replay - feed a captured broker stream through the packet handler

use std::{fs, path::PathBuf};

use bytes::BytesMut;
use clap::Parser;
use mercurio_inbound::{codec::split_frame, HandlerOptions, PacketHandler};
use tracing::{info, info_span, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "inbound-replay")]
#[command(about = "Replay a captured broker-to-client MQTT 3.1.1 stream")]
#[command(version)]
struct Args {
    /// Capture file with the raw bytes sent by the broker
    capture: PathBuf,

    /// Handler options (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write the acknowledgments produced during the replay to this file
    #[arg(long)]
    acks: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).init();

    let options = match &args.config {
        Some(path) => HandlerOptions::from_file(path)?,
        None => HandlerOptions::default(),
    };

    let mut handler = PacketHandler::new(BytesMut::new())
        .with_options(options)?
        .with_span(info_span!("replay", capture = %args.capture.display()));

    handler
        .events_mut()
        .set_on_connect(|flags, result| {
            info!("on_connect flags: {:#04x}, result: {:#04x}", flags, result)
        })
        .set_on_message(|topic, payload, qos| {
            info!("on_message {} ({:?}): {:?}", topic, qos, payload)
        })
        .set_on_disconnect(|packet| info!("on_disconnect {:?}", packet))
        .set_on_subscribe(|packet_id, granted_qos| {
            info!("on_subscribe {} {:?}", packet_id, granted_qos)
        });

    let mut buffer = BytesMut::from(&fs::read(&args.capture)?[..]);
    let mut packets = 0;

    while let Some((header, body)) = split_frame(&mut buffer)? {
        handler.handle(header, body);
        packets += 1;
    }

    if !buffer.is_empty() {
        warn!(
            "{} trailing bytes do not form a complete packet",
            buffer.len()
        );
    }

    info!(
        "Replayed {} packets, {} QoS 2 messages left unreleased",
        packets,
        handler.inflight().len()
    );

    let (acks, _) = handler.into_parts();

    if let Some(path) = &args.acks {
        fs::write(path, &acks)?;
        info!("Wrote {} bytes of acknowledgments to {}", acks.len(), path.display());
    }

    Ok(())
}
