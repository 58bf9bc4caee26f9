use tokio::time::Instant;
use tracing::{debug, warn};

use crate::decoding::{decode, WeightSample};
use crate::encoding::{encode, CommandKind};
use crate::error::{Error, Result};
use crate::heartbeat::HeartbeatScheduler;
use crate::transport::{Channel, ScalePeripheral};
use crate::variant::Variant;

/// An established connection to a scale.
///
/// Only [`crate::handshake::establish`] creates sessions, so a session
/// always has a resolved variant. It starts out connected and stays so until
/// the first failed write; after that every command fails with
/// [`Error::NotConnected`] and the caller has to discover and connect again.
pub struct Session<P: ScalePeripheral> {
    peripheral: P,
    variant: Variant,
    read: P::Channel,
    write: P::Channel,
    connected: bool,
    last_sample: Option<WeightSample>,
    last_heartbeat: Option<Instant>,
    heartbeat: HeartbeatScheduler,
}

impl<P: ScalePeripheral> std::fmt::Debug for Session<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.peripheral.address())
            .field("variant", &self.variant)
            .field("connected", &self.connected)
            .field("weight", &self.weight())
            .finish_non_exhaustive()
    }
}

impl<P: ScalePeripheral> Session<P> {
    pub(crate) fn new(
        peripheral: P,
        variant: Variant,
        read: P::Channel,
        write: P::Channel,
        heartbeat: HeartbeatScheduler,
    ) -> Self {
        Self {
            peripheral,
            variant,
            read,
            write,
            connected: true,
            last_sample: None,
            last_heartbeat: None,
            heartbeat,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Latest weight, or 0.0 before the first sample arrived.
    pub fn weight(&self) -> f32 {
        self.last_sample.map_or(0.0, |sample| sample.value())
    }

    pub fn last_sample(&self) -> Option<WeightSample> {
        self.last_sample
    }

    pub fn last_heartbeat(&self) -> Option<Instant> {
        self.last_heartbeat
    }

    /// Checks the read channel for a new weight.
    ///
    /// Returns the sample when a notification arrived since the last call
    /// and it carried a weight for this session's variant. Anything else
    /// leaves the current weight untouched.
    pub fn poll_weight(&mut self) -> Option<WeightSample> {
        let buffer = self.read.take_update()?;
        let sample = decode(&buffer, self.variant)?;
        sample.log(self.variant);
        self.last_sample = Some(sample);
        Some(sample)
    }

    pub async fn tare(&mut self) -> Result<()> {
        self.send(CommandKind::Tare).await
    }

    pub async fn start_timer(&mut self) -> Result<()> {
        self.send(CommandKind::StartTimer).await
    }

    pub async fn stop_timer(&mut self) -> Result<()> {
        self.send(CommandKind::StopTimer).await
    }

    pub async fn reset_timer(&mut self) -> Result<()> {
        self.send(CommandKind::ResetTimer).await
    }

    /// Sends a heartbeat regardless of whether one is due.
    ///
    /// Generic scales have no heartbeat, so for them this writes nothing.
    pub async fn heartbeat(&mut self) -> Result<()> {
        if !self.variant.needs_heartbeat() {
            return Ok(());
        }
        self.send(CommandKind::Heartbeat).await?;
        self.last_heartbeat = Some(Instant::now());
        Ok(())
    }

    pub fn heartbeat_due(&self, now: Instant) -> bool {
        self.heartbeat.is_due(self.variant, self.last_heartbeat, now)
    }

    pub fn heartbeat_required(&self) -> bool {
        self.heartbeat_due(Instant::now())
    }

    /// Sends a heartbeat if one is due. Returns whether one was sent.
    pub async fn keep_alive(&mut self) -> Result<bool> {
        if !self.heartbeat_required() {
            return Ok(false);
        }
        self.heartbeat().await?;
        Ok(true)
    }

    /// Ends the session and disconnects from the scale.
    pub async fn disconnect(self) {
        if let Err(e) = self.peripheral.disconnect().await {
            warn!("Failed to disconnect from {}: {}", self.peripheral.address(), e);
        }
    }

    async fn send(&mut self, command: CommandKind) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let frame = encode(command, self.variant);
        match self.write.write(&frame.to_wire()).await {
            Ok(()) => {
                debug!("Sent {}", command);
                Ok(())
            }
            Err(e) => {
                warn!("{} write failed: {}", command, e);
                self.connected = false;
                Err(Error::command_write_failed(command, e))
            }
        }
    }
}
