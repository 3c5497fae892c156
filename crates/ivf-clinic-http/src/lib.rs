//! HTTP wiring for the IVF clinic client.
//!
//! - [`config`]: environment-driven [`ClientConfig`]
//! - [`transport`]: reqwest implementation of the core `Transport` seam

pub mod config;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use transport::{HttpTransport, TransportError};

use ivf_clinic_core::Clinic;

/// Build a [`Clinic`] talking to the configured backend.
pub fn connect(config: &ClientConfig) -> Result<Clinic<HttpTransport>, TransportError> {
    let transport = HttpTransport::new(config)?;
    Ok(Clinic::new(transport, config.cache_stale_after))
}
