use tracing::info;

use crate::acaia_scanner::locate;
use crate::config::ScaleConfig;
use crate::decoding::WeightSample;
use crate::error::{Error, Result};
use crate::handshake::establish;
use crate::heartbeat::HeartbeatScheduler;
use crate::session::Session;
use crate::transport::Transport;
use crate::variant::Variant;

/// A scale reached through transport `T`.
///
/// Starts out without a session. [`AcaiaScale::connect`] finds a scale and
/// runs the handshake; the other operations act on the resulting session
/// and fail with [`Error::NotConnected`] until one exists. When
/// [`AcaiaScale::is_connected`] turns false the caller decides when to call
/// `connect` again.
pub struct AcaiaScale<T: Transport> {
    transport: T,
    config: ScaleConfig,
    session: Option<Session<T::Peripheral>>,
}

impl<T: Transport> AcaiaScale<T> {
    pub fn new(transport: T, config: ScaleConfig) -> Self {
        Self {
            transport,
            config,
            session: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session<T::Peripheral>> {
        self.session.as_ref()
    }

    /// Discovers a scale and establishes a new session with it.
    ///
    /// Any previous session is disconnected first. On failure the scale is
    /// left without a session.
    pub async fn connect(&mut self) -> Result<Variant> {
        if let Some(previous) = self.session.take() {
            previous.disconnect().await;
        }

        let peripheral = locate(
            &self.transport,
            self.config.target_address.as_deref(),
            self.config.discovery_timeout,
            self.config.poll_interval,
        )
        .await?;

        let session = establish(peripheral, HeartbeatScheduler::new(self.config.heartbeat_period))
            .await?;
        let variant = session.variant();
        info!("Connected to {} scale", variant);
        self.session = Some(session);
        Ok(variant)
    }

    /// Drops the current session, if any, and disconnects from the scale.
    pub async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.disconnect().await;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_connected)
    }

    pub fn variant(&self) -> Option<Variant> {
        self.session.as_ref().map(Session::variant)
    }

    /// Latest weight, or 0.0 when nothing was received yet.
    pub fn weight(&self) -> f32 {
        self.session.as_ref().map_or(0.0, Session::weight)
    }

    pub fn poll_weight(&mut self) -> Option<WeightSample> {
        self.session.as_mut()?.poll_weight()
    }

    pub async fn tare(&mut self) -> Result<()> {
        self.session_mut()?.tare().await
    }

    pub async fn start_timer(&mut self) -> Result<()> {
        self.session_mut()?.start_timer().await
    }

    pub async fn stop_timer(&mut self) -> Result<()> {
        self.session_mut()?.stop_timer().await
    }

    pub async fn reset_timer(&mut self) -> Result<()> {
        self.session_mut()?.reset_timer().await
    }

    pub async fn heartbeat(&mut self) -> Result<()> {
        self.session_mut()?.heartbeat().await
    }

    pub fn heartbeat_required(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(Session::heartbeat_required)
    }

    /// Sends a heartbeat if one is due. Returns whether one was sent.
    pub async fn keep_alive(&mut self) -> Result<bool> {
        self.session_mut()?.keep_alive().await
    }

    fn session_mut(&mut self) -> Result<&mut Session<T::Peripheral>> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }
}
