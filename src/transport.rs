//! Radio transport capability consumed by the protocol core.
//!
//! The core never talks to a Bluetooth stack directly. It drives these
//! traits, which are implemented for btleplug in [`crate::btle`] and by
//! in-memory doubles in [`crate::mock`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by the underlying transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    #[error("no Bluetooth adapter available")]
    NoAdapter,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

// Implementations keep plain data behind their mutexes, so a poisoned lock
// is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scanning side of the radio.
#[async_trait]
pub trait Transport: Send + Sync {
    type Peripheral: ScalePeripheral;

    /// Start an open scan for any advertising peripheral.
    async fn scan(&self) -> Result<(), TransportError>;

    /// Start a scan that only reports the peripheral with `address`.
    async fn scan_for_address(&self, address: &str) -> Result<(), TransportError>;

    async fn stop_scan(&self) -> Result<(), TransportError>;

    /// Next peripheral advertised since the previous call, if any.
    ///
    /// Must not wait for an advertisement to arrive.
    async fn available(&self) -> Option<Self::Peripheral>;
}

/// A discovered peripheral and its attribute table.
#[async_trait]
pub trait ScalePeripheral: Send + Sync {
    type Channel: Channel;

    async fn local_name(&self) -> Option<String>;

    fn address(&self) -> String;

    async fn connect(&self) -> Result<(), TransportError>;

    async fn discover_attributes(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Looks up a discovered characteristic by UUID.
    fn characteristic(&self, uuid: Uuid) -> Option<Self::Channel>;
}

/// A single characteristic used either for notifications or for commands.
#[async_trait]
pub trait Channel: Send + Sync {
    fn uuid(&self) -> Uuid;

    fn can_subscribe(&self) -> bool;

    async fn subscribe(&self) -> Result<(), TransportError>;

    async fn write(&self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Latest notified value, if one arrived since the previous call.
    ///
    /// Level-triggered: values that arrive between two calls overwrite each
    /// other and only the last one is returned.
    fn take_update(&self) -> Option<Vec<u8>>;
}
