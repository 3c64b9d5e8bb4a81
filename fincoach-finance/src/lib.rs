//! fincoach-finance: dashboard API client, cache-first orchestrator and nearby-place search

pub mod api;
pub mod geo;
pub mod orchestrator;
pub mod schema;

pub use api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, HttpApi, RemoteApi};
pub use geo::{DEFAULT_OVERPASS_URL, Explorer, FixedLocation, GeoSearch, LocationProvider, OverpassClient};
pub use orchestrator::{FetchOutcome, Orchestrator, Source};
