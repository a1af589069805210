//! Address resolution via OpenStreetMap Nominatim.
//!
//! One request per destination, rate-limited to 1 req/s per the
//! Nominatim usage policy. No retry: an address that does not resolve
//! halts the pipeline before any routing work starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// A destination address with its resolved coordinate.
/// Immutable once built — resolution happens exactly once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub address: String,
    pub coordinate: Coordinate,
    /// Full display name from the provider, when available.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Address resolution errors.
#[derive(Debug)]
pub enum GeocodeError {
    EmptyAddress,
    Network(String),
    InvalidResponse(String),
    NotFound(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "No destination address given"),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid geocoder response: {}", msg),
            Self::NotFound(addr) => {
                write!(f, "Latitude and longitude could not be found for '{}'", addr)
            }
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Seam for the pipeline: the real resolver talks to Nominatim,
/// tests substitute a fixed table.
pub trait Geocoder {
    fn resolve(&mut self, address: &str) -> Result<Destination, GeocodeError>;
}

// ─── Rate limiting ──────────────────────────────────────────────

/// Enforces a minimum interval between requests to the same service.
pub struct RateLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: None }
    }

    /// Time left before the next request is allowed. Zero if none pending.
    pub fn ready_in(&self) -> Duration {
        match self.last {
            Some(t) => self.min_interval.saturating_sub(t.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Block until the interval has passed, then mark a request as issued.
    pub fn wait(&mut self) {
        let remaining = self.ready_in();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.last = Some(Instant::now());
    }
}

// ─── Nominatim provider ─────────────────────────────────────────

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "postroute/0.3 (postcode-distance-tallier)";

/// Geocoder backed by the public Nominatim instance.
pub struct NominatimGeocoder {
    base_url: String,
    limiter: RateLimiter,
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self::with_base_url(NOMINATIM_URL)
    }

    /// Point at a different Nominatim-compatible endpoint (for testing).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            limiter: RateLimiter::new(Duration::from_secs(1)),
        }
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve(&mut self, address: &str) -> Result<Destination, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        self.limiter.wait();

        let url = format!(
            "{}?q={}&format=json&limit=1",
            self.base_url,
            urlencode(address),
        );

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(10))
            .call()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        let results: Vec<NominatimResult> = response
            .into_json()
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let top = results
            .first()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

        parse_result(address, top)
    }
}

pub(crate) fn parse_result(
    address: &str,
    result: &NominatimResult,
) -> Result<Destination, GeocodeError> {
    let lat: f64 = result
        .lat
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude '{}'", result.lat)))?;
    let lon: f64 = result
        .lon
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude '{}'", result.lon)))?;

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(GeocodeError::InvalidResponse(format!(
            "coordinate out of range: {}",
            coordinate
        )));
    }

    Ok(Destination {
        address: address.to_string(),
        coordinate,
        display_name: Some(result.display_name.clone()),
    })
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

pub(crate) fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '~' {
            out.push(c);
        } else {
            // Percent-encode the UTF-8 bytes, not the code point:
            // 'ō' must become %C5%8D, never %14D.
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", b));
            }
        }
    }
    out
}
