use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::constants::{NAME_PREFIX_LEN, SCALE_NAME_PREFIXES};
use crate::error::{Error, Result};
use crate::transport::{ScalePeripheral, Transport};

/// Whether an advertised name belongs to a supported scale.
///
/// Compares the first five characters, case-sensitively, against the known
/// name prefixes.
pub fn is_scale_name(name: &str) -> bool {
    name.get(..NAME_PREFIX_LEN)
        .is_some_and(|prefix| SCALE_NAME_PREFIXES.contains(&prefix))
}

/// Scans until a supported scale advertises itself.
///
/// With a `target_address` only that peripheral is considered, and a scan
/// that cannot be started fails straight away instead of waiting out the
/// timeout. Scanning is stopped before returning, whether or not a scale was
/// found.
pub async fn locate<T: Transport>(
    transport: &T,
    target_address: Option<&str>,
    discovery_timeout: Duration,
    poll_interval: Duration,
) -> Result<T::Peripheral> {
    match target_address {
        Some(address) => {
            info!("Scanning for {}", address);
            transport
                .scan_for_address(address)
                .await
                .map_err(Error::ScanFailed)?;
        }
        None => {
            info!("Scanning for scales");
            transport.scan().await.map_err(Error::ScanFailed)?;
        }
    }

    let found = timeout(discovery_timeout, poll_for_scale(transport, poll_interval)).await;

    if let Err(e) = transport.stop_scan().await {
        warn!("Failed to stop scan: {}", e);
    }

    match found {
        Ok(peripheral) => Ok(peripheral),
        Err(_) => {
            warn!("Failed to find scale within {:?}", discovery_timeout);
            Err(Error::DiscoveryTimeout {
                duration: discovery_timeout,
            })
        }
    }
}

async fn poll_for_scale<T: Transport>(transport: &T, poll_interval: Duration) -> T::Peripheral {
    loop {
        let Some(peripheral) = transport.available().await else {
            sleep(poll_interval).await;
            continue;
        };

        match peripheral.local_name().await {
            Some(name) if is_scale_name(&name) => {
                info!("Found {} ({})", name, peripheral.address());
                return peripheral;
            }
            name => debug!("Skipping {} ({:?})", peripheral.address(), name),
        }
    }
}
