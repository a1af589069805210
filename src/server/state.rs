use crate::geocode::NominatimGeocoder;
use std::sync::Mutex;

pub struct AppState {
    /// The geocoder carries the 1 req/s rate limiter, so it is shared
    /// behind a mutex rather than rebuilt per request.
    pub geocoder: Mutex<NominatimGeocoder>,
    pub osrm_url: String,
    pub default_country: String,
}
