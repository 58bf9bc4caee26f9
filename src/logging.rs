use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::decoding::WeightSample;
use crate::variant::Variant;

/// Installs a `tracing` subscriber for binaries. Honors `RUST_LOG`, with
/// `info` as the default level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

impl WeightSample {
    pub(crate) fn log(&self, variant: Variant) {
        debug!(variant = %variant, weight = %self, "Weight");
    }
}
