//! Wire protocol variants spoken by supported scales.

use std::fmt;

use uuid::Uuid;

use crate::constants::{
    READ_CHAR_GENERIC, READ_CHAR_NEW, READ_CHAR_OLD, WRITE_CHAR_GENERIC, WRITE_CHAR_NEW,
    WRITE_CHAR_OLD,
};

/// Which of the three wire protocols a connected scale speaks.
///
/// Resolved once during the handshake and never changed for the lifetime of
/// a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Older Acaia firmware (Lunar/Pearl pre-2021), 10-byte weight frames.
    Old,
    /// Newer Acaia firmware, 13-byte weight frames.
    New,
    /// Third-party scales speaking the ASCII protocol.
    Generic,
}

impl Variant {
    /// Probe order used during variant detection.
    ///
    /// A real scale exposes only one variant's characteristics, so the order
    /// only matters for devices that expose several. OLD wins over NEW, and
    /// both win over GENERIC.
    pub const PROBE_ORDER: [Variant; 3] = [Variant::Old, Variant::New, Variant::Generic];

    pub fn read_uuid(self) -> Uuid {
        match self {
            Variant::Old => READ_CHAR_OLD,
            Variant::New => READ_CHAR_NEW,
            Variant::Generic => READ_CHAR_GENERIC,
        }
    }

    pub fn write_uuid(self) -> Uuid {
        match self {
            Variant::Old => WRITE_CHAR_OLD,
            Variant::New => WRITE_CHAR_NEW,
            Variant::Generic => WRITE_CHAR_GENERIC,
        }
    }

    /// Whether the scale drops the session without periodic heartbeats.
    pub fn needs_heartbeat(self) -> bool {
        matches!(self, Variant::Old | Variant::New)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Old => write!(f, "old Acaia"),
            Variant::New => write!(f, "new Acaia"),
            Variant::Generic => write!(f, "generic"),
        }
    }
}
