//! Nearby-place search: location source, Overpass client, explore service.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use fincoach_core::{
    CategorySelection, CoachError, CoachResult, GeoPoint, NearbyPlaces, PlaceQuery, RawPlace,
    SEARCH_RADIUS_M, Store, build_query, normalize_place,
};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

const LOCATION_UNAVAILABLE: &str = "Unable to get your location. Please enable location services.";
const SEARCH_FAILED: &str = "Failed to fetch nearby places";

/// Where the user is.
pub trait LocationProvider: Send + Sync {
    fn locate(&self) -> impl Future<Output = CoachResult<GeoPoint>> + Send;
}

/// Runs a place query against some map backend.
pub trait GeoSearch: Send + Sync {
    fn search(&self, query: &PlaceQuery) -> impl Future<Output = CoachResult<Vec<RawPlace>>> + Send;
}

/// A location taken from configuration or the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<GeoPoint>);

impl LocationProvider for FixedLocation {
    async fn locate(&self) -> CoachResult<GeoPoint> {
        self.0
            .ok_or_else(|| CoachError::GeoUnavailable(LOCATION_UNAVAILABLE.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawPlace>,
}

/// Overpass API client.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
}

impl OverpassClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> CoachResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::GeoUnavailable(format!("{SEARCH_FAILED}: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl GeoSearch for OverpassClient {
    async fn search(&self, query: &PlaceQuery) -> CoachResult<Vec<RawPlace>> {
        let ql = query.to_overpass_ql();
        debug!(predicates = query.predicates.len(), "overpass query");
        let unavailable = |e: reqwest::Error| CoachError::GeoUnavailable(format!("{SEARCH_FAILED}: {e}"));
        let resp = self
            .client
            .get(&self.url)
            .query(&[("data", ql)])
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let body: OverpassResponse = resp.json().await.map_err(unavailable)?;
        Ok(body.elements)
    }
}

/// Finds places near the user and records the result in the explore slice.
#[derive(Debug, Clone)]
pub struct Explorer<L: LocationProvider, G: GeoSearch> {
    location: L,
    search: G,
    radius_m: u32,
}

impl<L: LocationProvider, G: GeoSearch> Explorer<L, G> {
    pub fn new(location: L, search: G) -> Self {
        Self {
            location,
            search,
            radius_m: SEARCH_RADIUS_M,
        }
    }

    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn backend(&self) -> &G {
        &self.search
    }

    async fn find(&self, selection: CategorySelection) -> CoachResult<NearbyPlaces> {
        let center = self.location.locate().await?;
        let query = build_query(selection, center, self.radius_m);
        let raw = self.search.search(&query).await?;
        Ok(NearbyPlaces {
            selection,
            center,
            places: raw.iter().map(normalize_place).collect(),
        })
    }

    /// Search around the user's location. Only the explore slice is touched.
    pub async fn nearby(&self, store: &Store, selection: CategorySelection) -> CoachResult<NearbyPlaces> {
        let cell = &store.explore.state;
        cell.begin();
        let result = self.find(selection).await.map_err(|e| match e {
            CoachError::GeoUnavailable(_) => e,
            other => CoachError::GeoUnavailable(other.to_string()),
        });
        match result {
            Ok(found) => {
                info!(category = %selection, places = found.places.len(), "nearby places loaded");
                cell.succeed(Some(found.clone()));
                Ok(found)
            }
            Err(e) => {
                warn!(category = %selection, error = %e, "nearby search failed");
                cell.fail(e.to_string());
                Err(e)
            }
        }
    }
}
