use std::error::Error;
use std::time::Duration;

use acaia_ble::logging::init_tracing;
use acaia_ble::{AcaiaScale, BtleTransport, ScaleConfig, Transport};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

const POLL_EVERY: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let transport = BtleTransport::new().await?;
    let mut scale = AcaiaScale::new(transport, ScaleConfig::from_env());
    scale.connect().await?;

    scale.tare().await?;
    scale.start_timer().await?;
    watch(&mut scale, Duration::from_secs(5)).await?;
    scale.stop_timer().await?;

    watch(&mut scale, Duration::from_secs(2)).await?;
    scale.reset_timer().await?;

    scale.disconnect().await;
    Ok(())
}

/// Prints weights and keeps the session alive for `duration`, reconnecting
/// if the scale drops off.
async fn watch<T: Transport>(
    scale: &mut AcaiaScale<T>,
    duration: Duration,
) -> Result<(), Box<dyn Error>> {
    let until = Instant::now() + duration;
    while Instant::now() < until {
        if !scale.is_connected() {
            warn!("Scale disconnected, reconnecting");
            scale.connect().await?;
        }
        if let Some(sample) = scale.poll_weight() {
            info!("Weight: {}", sample);
        }
        if let Err(e) = scale.keep_alive().await {
            warn!("Heartbeat failed: {}", e);
        }
        sleep(POLL_EVERY).await;
    }
    Ok(())
}
