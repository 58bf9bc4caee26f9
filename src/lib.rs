//! Protocol adapter for Acaia and compatible Bluetooth LE scales.
//!
//! Three incompatible wire protocols are supported and told apart during the
//! handshake by the characteristics a scale exposes:
//!
//! - [`Variant::Old`]: older Acaia firmware, one shared characteristic
//! - [`Variant::New`]: current Acaia firmware
//! - [`Variant::Generic`]: third-party scales speaking an ASCII protocol
//!
//! The radio itself sits behind the [`Transport`] traits. [`BtleTransport`]
//! drives a real adapter through btleplug; [`mock::FakeTransport`] replays
//! scripted peripherals for tests.
//!
//! ```no_run
//! use acaia_ble::{AcaiaScale, BtleTransport, ScaleConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = BtleTransport::new().await?;
//! let mut scale = AcaiaScale::new(transport, ScaleConfig::default());
//! scale.connect().await?;
//! scale.tare().await?;
//!
//! while scale.is_connected() {
//!     if let Some(sample) = scale.poll_weight() {
//!         println!("{sample} g");
//!     }
//!     scale.keep_alive().await?;
//!     tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod acaia_scale;
pub mod acaia_scanner;
pub mod btle;
pub mod config;
pub mod constants;
pub mod decoding;
pub mod encoding;
pub mod error;
pub mod handshake;
pub mod heartbeat;
pub mod logging;
pub mod mock;
pub mod session;
pub mod transport;
pub mod variant;

pub use acaia_scale::AcaiaScale;
pub use acaia_scanner::{is_scale_name, locate};
pub use btle::{BtleChannel, BtlePeripheral, BtleTransport};
pub use config::ScaleConfig;
pub use decoding::{decode, WeightSample};
pub use encoding::{encode, CommandKind, Frame};
pub use error::{Error, Result};
pub use handshake::{establish, probe_variant};
pub use heartbeat::HeartbeatScheduler;
pub use session::Session;
pub use transport::{Channel, ScalePeripheral, Transport, TransportError};
pub use variant::Variant;
