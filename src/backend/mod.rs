//! Backend module
//!
//! Sources of modulated waveforms. The engine only talks to the
//! [`ModulationBackend`] trait; [`LocalBackend`] computes in-process and
//! [`HttpBackend`] asks the remote modulation service.

pub mod http;
pub mod local;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{BackendConfig, BackendMode};
use crate::error::ScopeResult;

pub use http::HttpBackend;
pub use local::LocalBackend;
pub use types::{
    filter_bits, AnalogKind, AnalogRequest, AnalogResponse, DigitalKind, DigitalRequest,
    DigitalResponse, DigitalSignals, ErrorBody,
};

/// A producer of analog and digital modulated waveforms.
#[async_trait]
pub trait ModulationBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Compute an AM/FM/PM waveform.
    async fn analog(&self, request: &AnalogRequest) -> ScopeResult<AnalogResponse>;

    /// Compute an ASK/FSK/PSK waveform with its carrier and bit signal.
    async fn digital(&self, request: &DigitalRequest) -> ScopeResult<DigitalResponse>;
}

/// Build the backend selected by `config.mode`.
pub fn from_config(config: &BackendConfig) -> ScopeResult<Arc<dyn ModulationBackend>> {
    match config.mode {
        BackendMode::Local => Ok(Arc::new(LocalBackend::new())),
        BackendMode::Http => Ok(Arc::new(HttpBackend::from_config(config)?)),
    }
}
