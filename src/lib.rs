//! Postroute — driving-distance tallier.
//!
//! Computes the total road distance from a list of postal codes to one
//! destination address: the address is geocoded via Nominatim, each
//! postcode is resolved against a bundled offline reference table, and
//! OSRM supplies the pairwise driving distances. Results are exposed as
//! a CLI report and a browser UI with a map.

pub mod geocode;
pub mod map;
pub mod pipeline;
pub mod postcode;
pub mod routing;
pub mod server;

pub use geocode::{Coordinate, Destination, Geocoder, NominatimGeocoder};
pub use pipeline::{DistanceReport, PipelineError};
pub use postcode::{LookupOutcome, PostcodeRecord, PostcodeTable};
pub use routing::{DrivingRouter, OsrmRouter};
