pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod reconcile;
pub mod registry;
pub mod source;
pub mod telemetry;

pub use error::FleetError;

use telemetry::Telemetry;

/// State shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppState<D, H, U> {
    pub telemetry: Telemetry<D, H, U>,
    /// Storage backend name reported by the root endpoint.
    pub backend: &'static str,
}
