//! Driving-distance queries against an OSRM routing service.
//!
//! One GET per record pair, no path geometry, no retry. Any failure
//! aborts the whole computation and propagates to the caller — there is
//! no partial-result recovery here. Requests against the shared public
//! server are throttled: batches larger than ten get a one-second pause
//! before every tenth request.

use crate::geocode::Coordinate;
use crate::postcode::PostcodeRecord;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Routing failures, classified but unrecovered.
#[derive(Debug)]
pub enum RoutingError {
    Network(String),
    Http(u16),
    InvalidResponse(String),
    NoRoute(Coordinate, Coordinate),
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Routing network error: {}", msg),
            Self::Http(status) => write!(f, "Routing service returned HTTP {}", status),
            Self::InvalidResponse(msg) => write!(f, "Invalid routing response: {}", msg),
            Self::NoRoute(from, to) => {
                write!(f, "No driving route found from ({}) to ({})", from, to)
            }
        }
    }
}

impl std::error::Error for RoutingError {}

/// Seam for the pipeline: the real router talks to OSRM, tests
/// substitute a fixed distance function.
pub trait DrivingRouter {
    /// Driving-route distance in meters between two coordinates.
    fn driving_distance_m(&self, from: Coordinate, to: Coordinate) -> Result<f64, RoutingError>;
}

/// Meters to kilometers, exactly.
pub fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

// ─── Throttling ─────────────────────────────────────────────────

const THROTTLE_EVERY: usize = 10;
const THROTTLE_PAUSE: Duration = Duration::from_secs(1);

/// Fixed sleep-based throttle for the routing loop: pause before every
/// tenth request (zero-based index `i` with `i % 10 == 0 && i > 0`).
pub struct Throttle {
    pauses_taken: usize,
}

impl Throttle {
    pub fn new() -> Self {
        Self { pauses_taken: 0 }
    }

    /// Whether a pause is due before the request at zero-based index `i`.
    pub fn pause_due(i: usize) -> bool {
        i > 0 && i % THROTTLE_EVERY == 0
    }

    /// Call before issuing the request at index `i`; sleeps when a pause
    /// is due and counts it.
    pub fn before_request(&mut self, i: usize) {
        if Self::pause_due(i) {
            self.pauses_taken += 1;
            std::thread::sleep(THROTTLE_PAUSE);
        }
    }

    pub fn pauses_taken(&self) -> usize {
        self.pauses_taken
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new()
    }
}

// ─── OSRM provider ──────────────────────────────────────────────

pub const DEFAULT_OSRM_URL: &str = "http://router.project-osrm.org";
const USER_AGENT: &str = "postroute/0.3 (postcode-distance-tallier)";

#[derive(Deserialize, Debug)]
struct OsrmRoute {
    distance: f64,
}

#[derive(Deserialize, Debug)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

/// Router backed by an OSRM HTTP instance.
pub struct OsrmRouter {
    base_url: String,
}

impl OsrmRouter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OSRM_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

impl Default for OsrmRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// OSRM route URL: coordinates as `lon,lat;lon,lat`, geometry omitted.
fn route_url(base_url: &str, from: Coordinate, to: Coordinate) -> String {
    format!(
        "{}/route/v1/driving/{},{};{},{}?overview=false",
        base_url, from.lon, from.lat, to.lon, to.lat,
    )
}

fn parse_response(
    body: OsrmResponse,
    from: Coordinate,
    to: Coordinate,
) -> Result<f64, RoutingError> {
    match body.routes.first() {
        Some(route) => Ok(route.distance),
        None => Err(RoutingError::NoRoute(from, to)),
    }
}

impl DrivingRouter for OsrmRouter {
    fn driving_distance_m(&self, from: Coordinate, to: Coordinate) -> Result<f64, RoutingError> {
        let url = route_url(&self.base_url, from, to);

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(30))
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => RoutingError::Http(status),
                other => RoutingError::Network(other.to_string()),
            })?;

        let body: OsrmResponse = response
            .into_json()
            .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

        parse_response(body, from, to)
    }
}

// ─── Batch computation ──────────────────────────────────────────

/// Fill `distance_km` on each record, in order, querying the router for
/// the destination→record driving distance. Fails fast on the first
/// routing error. Returns the number of throttle pauses taken.
pub fn compute_distances<R: DrivingRouter>(
    router: &R,
    destination: Coordinate,
    records: &mut [PostcodeRecord],
) -> Result<usize, RoutingError> {
    let mut throttle = Throttle::new();
    for (i, record) in records.iter_mut().enumerate() {
        throttle.before_request(i);
        let meters = router.driving_distance_m(destination, record.coordinate)?;
        record.distance_km = Some(meters_to_km(meters));
    }
    Ok(throttle.pauses_taken())
}
