//! Error types for acaia-ble.
//!
//! Discovery and handshake errors abort a connection attempt; nothing from
//! the failed attempt is kept. A [`Error::CommandWriteFailed`] during an
//! active session also marks the session as disconnected, and the only way
//! back is a fresh discovery and handshake. No operation retries on its own.
//!
//! A notification that carries no new weight is not an error and is reported
//! as `None` by the decoder instead.

use std::time::Duration;

use thiserror::Error;

use crate::encoding::CommandKind;
use crate::transport::TransportError;
use crate::variant::Variant;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No scale advertised a matching name before the timeout.
    #[error("no scale found within {duration:?}")]
    DiscoveryTimeout { duration: Duration },

    /// The transport refused to start scanning.
    #[error("scan failed: {0}")]
    ScanFailed(#[source] TransportError),

    #[error("connection failed: {0}")]
    ConnectFailed(#[source] TransportError),

    #[error("attribute discovery failed: {0}")]
    AttributeDiscoveryFailed(#[source] TransportError),

    /// None of the known read characteristics is present and subscribable.
    #[error("unable to determine scale type")]
    UnknownVariant,

    #[error("read characteristic of {0} scale does not support subscription")]
    SubscribeUnsupported(Variant),

    #[error("subscription failed: {0}")]
    SubscribeFailed(#[source] TransportError),

    #[error("{command} write failed: {source}")]
    CommandWriteFailed {
        command: CommandKind,
        #[source]
        source: TransportError,
    },

    /// The operation needs an established, still connected session.
    #[error("not connected to a scale")]
    NotConnected,
}

impl Error {
    pub fn command_write_failed(command: CommandKind, source: TransportError) -> Self {
        Self::CommandWriteFailed { command, source }
    }

    /// Command whose write failed, if this is a write failure.
    pub fn failed_command(&self) -> Option<CommandKind> {
        match self {
            Self::CommandWriteFailed { command, .. } => Some(*command),
            _ => None,
        }
    }
}

/// Result type alias using acaia-ble's Error type.
pub type Result<T> = std::result::Result<T, Error>;
