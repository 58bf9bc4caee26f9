//! Connection handshake and variant detection.

use tracing::{debug, info, warn};

use crate::encoding::{encode, CommandKind};
use crate::error::{Error, Result};
use crate::heartbeat::HeartbeatScheduler;
use crate::session::Session;
use crate::transport::{Channel, ScalePeripheral, TransportError};
use crate::variant::Variant;

/// Characteristics bound to a detected variant.
///
/// The write characteristic may be missing; that only surfaces when the
/// first command is written.
pub struct Binding<C> {
    pub variant: Variant,
    pub read: C,
    pub write: Option<C>,
}

/// Detects which protocol variant `peripheral` speaks.
///
/// Variants are tried in [`Variant::PROBE_ORDER`]. The first one whose read
/// characteristic is present and subscribable wins.
pub fn probe_variant<P: ScalePeripheral>(peripheral: &P) -> Option<Binding<P::Channel>> {
    Variant::PROBE_ORDER.into_iter().find_map(|variant| {
        let read = peripheral.characteristic(variant.read_uuid())?;
        if !read.can_subscribe() {
            debug!("{} read characteristic cannot notify", variant);
            return None;
        }
        Some(Binding {
            variant,
            read,
            write: peripheral.characteristic(variant.write_uuid()),
        })
    })
}

/// Connects to `peripheral` and runs the protocol handshake.
///
/// On success the returned session is connected. On failure after the
/// connection was made, the peripheral is disconnected again before the
/// error is returned.
pub async fn establish<P: ScalePeripheral>(
    peripheral: P,
    heartbeat: HeartbeatScheduler,
) -> Result<Session<P>> {
    info!("Connecting to {}", peripheral.address());
    peripheral.connect().await.map_err(|e| {
        warn!("Failed to connect: {}", e);
        Error::ConnectFailed(e)
    })?;

    match negotiate(&peripheral).await {
        Ok((variant, read, write)) => {
            debug!("{} scale ready", variant);
            Ok(Session::new(peripheral, variant, read, write, heartbeat))
        }
        Err(e) => {
            warn!("Handshake failed: {}", e);
            if let Err(e) = peripheral.disconnect().await {
                warn!("Failed to disconnect after handshake failure: {}", e);
            }
            Err(e)
        }
    }
}

async fn negotiate<P: ScalePeripheral>(
    peripheral: &P,
) -> Result<(Variant, P::Channel, P::Channel)> {
    peripheral
        .discover_attributes()
        .await
        .map_err(Error::AttributeDiscoveryFailed)?;
    debug!("Attributes discovered");

    let Binding {
        variant,
        read,
        write,
    } = probe_variant(peripheral).ok_or(Error::UnknownVariant)?;
    debug!("{} scale detected", variant);

    if !read.can_subscribe() {
        return Err(Error::SubscribeUnsupported(variant));
    }
    read.subscribe().await.map_err(Error::SubscribeFailed)?;
    debug!("Subscribed to {}", read.uuid());

    let write = write.ok_or_else(|| {
        Error::command_write_failed(
            CommandKind::Identify,
            TransportError::other(format!("{} write characteristic not found", variant)),
        )
    })?;

    for command in [CommandKind::Identify, CommandKind::NotificationRequest] {
        let frame = encode(command, variant);
        write
            .write(&frame.to_wire())
            .await
            .map_err(|e| Error::command_write_failed(command, e))?;
        debug!("Sent {}", command);
    }

    Ok((variant, read, write))
}
