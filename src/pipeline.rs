//! The distance pipeline: geocode → lookup → route → aggregate.
//!
//! A linear guarded sequence. Each step is a precondition gate on the
//! next; the first failing gate stops the run with no partial results.
//! All state flows through arguments and return values — there is no
//! session-global context.

use crate::geocode::{Destination, GeocodeError, Geocoder};
use crate::postcode::{PostcodeRecord, PostcodeTable};
use crate::routing::{compute_distances, DrivingRouter, RoutingError};
use serde::Serialize;
use std::fmt;

/// Pipeline failures, one per gate.
#[derive(Debug)]
pub enum PipelineError {
    EmptyAddress,
    AddressNotFound(String),
    NoPostcodes,
    Geocode(GeocodeError),
    Routing(RoutingError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "No destination address given"),
            Self::AddressNotFound(addr) => {
                write!(f, "Latitude and longitude could not be found for '{}'", addr)
            }
            Self::NoPostcodes => write!(f, "No postcodes to process"),
            Self::Geocode(e) => write!(f, "{}", e),
            Self::Routing(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<GeocodeError> for PipelineError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::EmptyAddress => Self::EmptyAddress,
            GeocodeError::NotFound(addr) => Self::AddressNotFound(addr),
            other => Self::Geocode(other),
        }
    }
}

impl From<RoutingError> for PipelineError {
    fn from(e: RoutingError) -> Self {
        Self::Routing(e)
    }
}

/// The finished session result: enriched rows, rejected codes, total.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceReport {
    pub destination: Destination,
    pub rows: Vec<PostcodeRecord>,
    /// Raw codes not found in the reference table — excluded from the
    /// total, but reported rather than silently dropped.
    pub rejected: Vec<String>,
    pub total_km: f64,
    pub throttle_pauses: usize,
}

impl DistanceReport {
    /// Total formatted to two decimal places, e.g. "643.27 km".
    pub fn total_line(&self) -> String {
        format!("{:.2} km", self.total_km)
    }
}

/// Sum of computed distances only; rows without one contribute nothing.
pub fn total_km(rows: &[PostcodeRecord]) -> f64 {
    rows.iter().filter_map(|r| r.distance_km).sum()
}

/// Run the full pipeline for one session.
///
/// Gates, in order: non-empty address, resolvable address, non-empty
/// code list. Only after all gates pass does any routing request go
/// out; a geocoding failure therefore never costs a routing call.
pub fn run<G: Geocoder, R: DrivingRouter>(
    geocoder: &mut G,
    table: &PostcodeTable,
    router: &R,
    address: &str,
    codes: &[String],
) -> Result<DistanceReport, PipelineError> {
    if address.trim().is_empty() {
        return Err(PipelineError::EmptyAddress);
    }

    let destination = geocoder.resolve(address)?;

    run_resolved(table, router, destination, codes)
}

/// The post-geocode half of the pipeline. Split out so callers sharing
/// a rate-limited geocoder can release it before the (slow, throttled)
/// routing loop starts.
pub fn run_resolved<R: DrivingRouter>(
    table: &PostcodeTable,
    router: &R,
    destination: Destination,
    codes: &[String],
) -> Result<DistanceReport, PipelineError> {
    if codes.is_empty() {
        return Err(PipelineError::NoPostcodes);
    }

    let outcome = table.lookup_all(codes);
    let mut rows = outcome.resolved;

    let throttle_pauses = compute_distances(router, destination.coordinate, &mut rows)?;

    let total = total_km(&rows);
    Ok(DistanceReport {
        destination,
        rows,
        rejected: outcome.rejected,
        total_km: total,
        throttle_pauses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::Coordinate;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    /// Geocoder that only knows one address.
    struct FixedGeocoder {
        known: &'static str,
        coordinate: Coordinate,
    }

    impl Geocoder for FixedGeocoder {
        fn resolve(&mut self, address: &str) -> Result<Destination, GeocodeError> {
            if address == self.known {
                Ok(Destination {
                    address: address.to_string(),
                    coordinate: self.coordinate,
                    display_name: None,
                })
            } else {
                Err(GeocodeError::NotFound(address.to_string()))
            }
        }
    }

    /// Router returning a distance derived from the target latitude, so
    /// different rows get different (deterministic) distances.
    struct LatRouter {
        calls: Cell<usize>,
    }

    impl LatRouter {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl DrivingRouter for LatRouter {
        fn driving_distance_m(&self, _: Coordinate, to: Coordinate) -> Result<f64, RoutingError> {
            self.calls.set(self.calls.get() + 1);
            Ok(to.lat.abs() * 1000.0)
        }
    }

    const AUCKLAND_ADDR: &str = "72 Victoria Street West, Auckland 1010";

    fn auckland_geocoder() -> FixedGeocoder {
        FixedGeocoder {
            known: AUCKLAND_ADDR,
            coordinate: Coordinate::new(-36.8485, 174.7633),
        }
    }

    fn codes(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_address_gate() {
        let mut geocoder = auckland_geocoder();
        let table = PostcodeTable::bundled("nz").unwrap();
        let router = LatRouter::new();
        let err = run(&mut geocoder, &table, &router, "  ", &codes(&["1010"])).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyAddress));
        assert_eq!(router.calls.get(), 0);
    }

    #[test]
    fn test_unresolvable_address_halts_before_routing() {
        let mut geocoder = auckland_geocoder();
        let table = PostcodeTable::bundled("nz").unwrap();
        let router = LatRouter::new();
        let err = run(
            &mut geocoder,
            &table,
            &router,
            "1 Nowhere Lane, Atlantis",
            &codes(&["1010", "6011"]),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::AddressNotFound(_)));
        assert_eq!(router.calls.get(), 0);
    }

    #[test]
    fn test_no_postcodes_gate() {
        let mut geocoder = auckland_geocoder();
        let table = PostcodeTable::bundled("nz").unwrap();
        let router = LatRouter::new();
        let err = run(&mut geocoder, &table, &router, AUCKLAND_ADDR, &[]).unwrap_err();
        assert!(matches!(err, PipelineError::NoPostcodes));
        assert_eq!(router.calls.get(), 0);
    }

    // One valid and one bogus code: exactly one enriched row, and the
    // total equals that row's distance.
    #[test]
    fn test_invalid_code_excluded_from_total() {
        let mut geocoder = auckland_geocoder();
        let table = PostcodeTable::bundled("nz").unwrap();
        let router = LatRouter::new();

        let report = run(
            &mut geocoder,
            &table,
            &router,
            AUCKLAND_ADDR,
            &codes(&["1010", "9999999"]),
        )
        .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rejected, vec!["9999999".to_string()]);
        assert_eq!(router.calls.get(), 1);
        assert_relative_eq!(
            report.total_km,
            report.rows[0].distance_km.unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_total_sums_only_computed_rows() {
        let rows = vec![
            PostcodeRecord {
                code: "1010".into(),
                city: "Auckland".into(),
                suburb: "Auckland Central".into(),
                coordinate: Coordinate::new(-36.8485, 174.7633),
                distance_km: Some(12.5),
            },
            PostcodeRecord {
                code: "6011".into(),
                city: "Wellington".into(),
                suburb: "Te Aro".into(),
                coordinate: Coordinate::new(-41.2924, 174.7787),
                distance_km: None,
            },
            PostcodeRecord {
                code: "8011".into(),
                city: "Canterbury".into(),
                suburb: "Christchurch Central".into(),
                coordinate: Coordinate::new(-43.5309, 172.6365),
                distance_km: Some(7.25),
            },
        ];
        assert_relative_eq!(total_km(&rows), 19.75, epsilon = 1e-12);
    }

    #[test]
    fn test_total_line_two_decimals() {
        let mut geocoder = auckland_geocoder();
        let table = PostcodeTable::bundled("nz").unwrap();
        let router = LatRouter::new();
        let report = run(&mut geocoder, &table, &router, AUCKLAND_ADDR, &codes(&["1010"])).unwrap();
        // LatRouter: |-36.8485| * 1000 m = 36.8485 km
        assert_eq!(report.total_line(), "36.85 km");
    }

    #[test]
    fn test_idempotent_for_identical_input() {
        let table = PostcodeTable::bundled("nz").unwrap();
        let input = codes(&["1010", "6011", "8011", "9016"]);

        let mut geocoder = auckland_geocoder();
        let first = run(&mut geocoder, &table, &LatRouter::new(), AUCKLAND_ADDR, &input).unwrap();
        let second = run(&mut geocoder, &table, &LatRouter::new(), AUCKLAND_ADDR, &input).unwrap();

        assert_relative_eq!(first.total_km, second.total_km, epsilon = 1e-9);
        assert_eq!(first.rows.len(), second.rows.len());
    }

    // The split entry point must behave exactly like the full run once
    // the destination is in hand, including the empty-codes gate.
    #[test]
    fn test_run_resolved_matches_run() {
        let table = PostcodeTable::bundled("nz").unwrap();
        let input = codes(&["1010", "9999999", "6011"]);
        let destination = Destination {
            address: AUCKLAND_ADDR.to_string(),
            coordinate: Coordinate::new(-36.8485, 174.7633),
            display_name: None,
        };

        let mut geocoder = auckland_geocoder();
        let full = run(&mut geocoder, &table, &LatRouter::new(), AUCKLAND_ADDR, &input).unwrap();
        let half = run_resolved(&table, &LatRouter::new(), destination, &input).unwrap();

        assert_relative_eq!(full.total_km, half.total_km, epsilon = 1e-12);
        assert_eq!(full.rows.len(), half.rows.len());
        assert_eq!(full.rejected, half.rejected);
    }

    #[test]
    fn test_run_resolved_no_postcodes_gate() {
        let table = PostcodeTable::bundled("nz").unwrap();
        let router = LatRouter::new();
        let destination = Destination {
            address: AUCKLAND_ADDR.to_string(),
            coordinate: Coordinate::new(-36.8485, 174.7633),
            display_name: None,
        };
        let err = run_resolved(&table, &router, destination, &[]).unwrap_err();
        assert!(matches!(err, PipelineError::NoPostcodes));
        assert_eq!(router.calls.get(), 0);
    }

    #[test]
    fn test_routing_failure_propagates() {
        struct BrokenRouter;
        impl DrivingRouter for BrokenRouter {
            fn driving_distance_m(
                &self,
                _: Coordinate,
                _: Coordinate,
            ) -> Result<f64, RoutingError> {
                Err(RoutingError::Http(429))
            }
        }

        let mut geocoder = auckland_geocoder();
        let table = PostcodeTable::bundled("nz").unwrap();
        let err = run(&mut geocoder, &table, &BrokenRouter, AUCKLAND_ADDR, &codes(&["1010"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Routing(RoutingError::Http(429))));
    }

    #[test]
    fn test_report_serializes() {
        let mut geocoder = auckland_geocoder();
        let table = PostcodeTable::bundled("nz").unwrap();
        let report =
            run(&mut geocoder, &table, &LatRouter::new(), AUCKLAND_ADDR, &codes(&["1010"]))
                .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"][0]["code"], "1010");
        assert!(json["total_km"].is_number());
    }
}
