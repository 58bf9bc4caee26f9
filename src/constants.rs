use std::time::Duration;

use btleplug::api::bleuuid::uuid_from_u16;
use uuid::Uuid;

pub(crate) const MAGIC1: u8 = 0xef;
pub(crate) const MAGIC2: u8 = 0xdd;

/// Advertised name prefixes of supported scales. Only the first five
/// characters of a name are compared.
pub const SCALE_NAME_PREFIXES: [&str; 6] = ["CINCO", "ACAIA", "PYXIS", "LUNAR", "PROCH", "FELIC"];

pub(crate) const NAME_PREFIX_LEN: usize = 5;

// Older Acaia firmware uses a single characteristic for both directions.
pub const READ_CHAR_OLD: Uuid = uuid_from_u16(0x2A80);
pub const WRITE_CHAR_OLD: Uuid = uuid_from_u16(0x2A80);

pub const READ_CHAR_NEW: Uuid = Uuid::from_u128(0x49535343_1e4d_4bd9_ba61_23c647249616);
pub const WRITE_CHAR_NEW: Uuid = Uuid::from_u128(0x49535343_8841_43f4_a8d4_ecbe34729bb3);

pub const READ_CHAR_GENERIC: Uuid = uuid_from_u16(0xFF11);
pub const WRITE_CHAR_GENERIC: Uuid = uuid_from_u16(0xFF12);

pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
