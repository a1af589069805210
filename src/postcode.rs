//! Offline postal-code reference table.
//!
//! Postal codes are resolved locally against a bundled dataset — no
//! network call. The code space is country-specific and selected at
//! configuration time; New Zealand is the bundled country. Codes are
//! treated as opaque strings so leading zeros survive.
//!
//! Lookup returns both the resolved records and the raw codes that were
//! not found, so callers can report the rejects instead of losing them.

use crate::geocode::Coordinate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

// ─── Bundled dataset ────────────────────────────────────────────

struct BundledPostcode {
    code: &'static str,
    city: &'static str,
    suburb: &'static str,
    lat: f64,
    lon: f64,
}

/// New Zealand postcode centroids (approximate, settlement-level).
const NZ_POSTCODES: &[BundledPostcode] = &[
    BundledPostcode { code: "0110", city: "Northland", suburb: "Whangarei Central", lat: -35.7251, lon: 174.3237 },
    BundledPostcode { code: "0112", city: "Northland", suburb: "Tikipunga", lat: -35.6907, lon: 174.3199 },
    BundledPostcode { code: "0600", city: "Auckland", suburb: "Glenfield", lat: -36.7790, lon: 174.7210 },
    BundledPostcode { code: "0610", city: "Auckland", suburb: "Beach Haven", lat: -36.7920, lon: 174.6820 },
    BundledPostcode { code: "0620", city: "Auckland", suburb: "Birkenhead", lat: -36.8100, lon: 174.7330 },
    BundledPostcode { code: "0622", city: "Auckland", suburb: "Takapuna", lat: -36.7870, lon: 174.7700 },
    BundledPostcode { code: "0632", city: "Auckland", suburb: "Albany", lat: -36.7290, lon: 174.7000 },
    BundledPostcode { code: "1010", city: "Auckland", suburb: "Auckland Central", lat: -36.8485, lon: 174.7633 },
    BundledPostcode { code: "1011", city: "Auckland", suburb: "Wynyard Quarter", lat: -36.8430, lon: 174.7570 },
    BundledPostcode { code: "1021", city: "Auckland", suburb: "Ponsonby", lat: -36.8560, lon: 174.7460 },
    BundledPostcode { code: "1023", city: "Auckland", suburb: "Mount Eden", lat: -36.8770, lon: 174.7540 },
    BundledPostcode { code: "1024", city: "Auckland", suburb: "Sandringham", lat: -36.8890, lon: 174.7360 },
    BundledPostcode { code: "1041", city: "Auckland", suburb: "Mount Roskill", lat: -36.9120, lon: 174.7360 },
    BundledPostcode { code: "1050", city: "Auckland", suburb: "Remuera", lat: -36.8790, lon: 174.8000 },
    BundledPostcode { code: "1051", city: "Auckland", suburb: "Newmarket", lat: -36.8690, lon: 174.7770 },
    BundledPostcode { code: "1060", city: "Auckland", suburb: "Onehunga", lat: -36.9160, lon: 174.7840 },
    BundledPostcode { code: "1061", city: "Auckland", suburb: "Penrose", lat: -36.9100, lon: 174.8150 },
    BundledPostcode { code: "1071", city: "Auckland", suburb: "Kohimarama", lat: -36.8530, lon: 174.8420 },
    BundledPostcode { code: "1072", city: "Auckland", suburb: "Saint Heliers", lat: -36.8500, lon: 174.8600 },
    BundledPostcode { code: "2010", city: "Auckland", suburb: "Otahuhu", lat: -36.9460, lon: 174.8430 },
    BundledPostcode { code: "2013", city: "Auckland", suburb: "East Tamaki", lat: -36.9480, lon: 174.9050 },
    BundledPostcode { code: "2022", city: "Auckland", suburb: "Mangere", lat: -36.9680, lon: 174.7920 },
    BundledPostcode { code: "2102", city: "Auckland", suburb: "Manurewa", lat: -37.0240, lon: 174.9000 },
    BundledPostcode { code: "2110", city: "Auckland", suburb: "Papakura", lat: -37.0650, lon: 174.9440 },
    BundledPostcode { code: "3010", city: "Bay of Plenty", suburb: "Rotorua Central", lat: -38.1368, lon: 176.2497 },
    BundledPostcode { code: "3110", city: "Bay of Plenty", suburb: "Tauranga Central", lat: -37.6860, lon: 176.1670 },
    BundledPostcode { code: "3116", city: "Bay of Plenty", suburb: "Mount Maunganui", lat: -37.6390, lon: 176.1870 },
    BundledPostcode { code: "3204", city: "Waikato", suburb: "Hamilton Central", lat: -37.7870, lon: 175.2790 },
    BundledPostcode { code: "3216", city: "Waikato", suburb: "Hamilton East", lat: -37.7900, lon: 175.3030 },
    BundledPostcode { code: "4310", city: "Taranaki", suburb: "New Plymouth Central", lat: -39.0570, lon: 174.0750 },
    BundledPostcode { code: "4410", city: "Manawatu-Wanganui", suburb: "Palmerston North Central", lat: -40.3523, lon: 175.6082 },
    BundledPostcode { code: "4500", city: "Manawatu-Wanganui", suburb: "Whanganui Central", lat: -39.9300, lon: 175.0480 },
    BundledPostcode { code: "5010", city: "Wellington", suburb: "Lower Hutt Central", lat: -41.2090, lon: 174.9080 },
    BundledPostcode { code: "5018", city: "Wellington", suburb: "Upper Hutt Central", lat: -41.1240, lon: 175.0700 },
    BundledPostcode { code: "6011", city: "Wellington", suburb: "Te Aro", lat: -41.2924, lon: 174.7787 },
    BundledPostcode { code: "6012", city: "Wellington", suburb: "Kelburn", lat: -41.2850, lon: 174.7680 },
    BundledPostcode { code: "6021", city: "Wellington", suburb: "Brooklyn", lat: -41.3050, lon: 174.7630 },
    BundledPostcode { code: "6022", city: "Wellington", suburb: "Island Bay", lat: -41.3380, lon: 174.7740 },
    BundledPostcode { code: "7010", city: "Nelson", suburb: "Nelson Central", lat: -41.2706, lon: 173.2840 },
    BundledPostcode { code: "7201", city: "Marlborough", suburb: "Blenheim Central", lat: -41.5130, lon: 173.9610 },
    BundledPostcode { code: "8011", city: "Canterbury", suburb: "Christchurch Central", lat: -43.5309, lon: 172.6365 },
    BundledPostcode { code: "8013", city: "Canterbury", suburb: "Linwood", lat: -43.5360, lon: 172.6650 },
    BundledPostcode { code: "8041", city: "Canterbury", suburb: "Riccarton", lat: -43.5300, lon: 172.5990 },
    BundledPostcode { code: "8053", city: "Canterbury", suburb: "Bryndwr", lat: -43.5060, lon: 172.5970 },
    BundledPostcode { code: "9010", city: "Otago", suburb: "North Dunedin", lat: -45.8660, lon: 170.5140 },
    BundledPostcode { code: "9016", city: "Otago", suburb: "Dunedin Central", lat: -45.8788, lon: 170.5028 },
    BundledPostcode { code: "9300", city: "Otago", suburb: "Queenstown", lat: -45.0312, lon: 168.6626 },
    BundledPostcode { code: "9810", city: "Southland", suburb: "Invercargill Central", lat: -46.4132, lon: 168.3538 },
];

// ─── Records ────────────────────────────────────────────────────

/// One reference-table entry.
#[derive(Debug, Clone)]
pub struct PostcodeEntry {
    pub code: String,
    pub city: String,
    pub suburb: String,
    pub coordinate: Coordinate,
}

/// One enriched row of the working table. `distance_km` stays `None`
/// until the routing stage fills it in.
#[derive(Debug, Clone, Serialize)]
pub struct PostcodeRecord {
    pub code: String,
    pub city: String,
    pub suburb: String,
    pub coordinate: Coordinate,
    pub distance_km: Option<f64>,
}

/// Result of resolving a batch of raw codes: records that matched the
/// reference table, plus the codes that did not — in input order.
#[derive(Debug, Clone, Serialize)]
pub struct LookupOutcome {
    pub resolved: Vec<PostcodeRecord>,
    pub rejected: Vec<String>,
}

// ─── Table ──────────────────────────────────────────────────────

/// An in-memory postcode reference table for one country.
pub struct PostcodeTable {
    country: String,
    entries: HashMap<String, PostcodeEntry>,
}

impl PostcodeTable {
    /// Load the bundled table for an ISO country code.
    /// Returns `None` for countries with no bundled dataset.
    pub fn bundled(country: &str) -> Option<Self> {
        match country.to_lowercase().as_str() {
            "nz" => Some(Self::from_entries(
                "nz",
                NZ_POSTCODES.iter().map(|p| PostcodeEntry {
                    code: p.code.to_string(),
                    city: p.city.to_string(),
                    suburb: p.suburb.to_string(),
                    coordinate: Coordinate::new(p.lat, p.lon),
                }),
            )),
            _ => None,
        }
    }

    /// Countries with a bundled dataset.
    pub fn bundled_countries() -> &'static [&'static str] {
        &["nz"]
    }

    /// Build a table from arbitrary entries (custom datasets, tests).
    pub fn from_entries(country: &str, entries: impl IntoIterator<Item = PostcodeEntry>) -> Self {
        Self {
            country: country.to_lowercase(),
            entries: entries
                .into_iter()
                .map(|e| (e.code.clone(), e))
                .collect(),
        }
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve one raw code. Whitespace is trimmed; codes are otherwise
    /// matched verbatim (leading zeros significant).
    pub fn lookup(&self, code: &str) -> Option<PostcodeRecord> {
        let entry = self.entries.get(code.trim())?;
        Some(PostcodeRecord {
            code: entry.code.clone(),
            city: entry.city.clone(),
            suburb: entry.suburb.clone(),
            coordinate: entry.coordinate,
            distance_km: None,
        })
    }

    /// Resolve a batch of raw codes, preserving input order.
    pub fn lookup_all(&self, codes: &[String]) -> LookupOutcome {
        let mut resolved = Vec::new();
        let mut rejected = Vec::new();
        for code in codes {
            match self.lookup(code) {
                Some(record) => resolved.push(record),
                None => rejected.push(code.trim().to_string()),
            }
        }
        LookupOutcome { resolved, rejected }
    }
}

// ─── CSV input ──────────────────────────────────────────────────

/// Errors reading the uploaded postcode file.
#[derive(Debug)]
pub enum PostcodeFileError {
    Read(String),
    Parse(String),
}

impl fmt::Display for PostcodeFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "Cannot read postcode file: {}", msg),
            Self::Parse(msg) => write!(f, "Cannot parse postcode file: {}", msg),
        }
    }
}

impl std::error::Error for PostcodeFileError {}

/// Read a single-column CSV of postcodes, one per row, no header.
/// Blank rows are skipped; only the first column of each row is used.
pub fn read_postcode_file(path: &Path) -> Result<Vec<String>, PostcodeFileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PostcodeFileError::Read(e.to_string()))?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PostcodeFileError::Parse(e.to_string()))?;
        if let Some(field) = record.get(0) {
            let code = field.trim();
            if !code.is_empty() {
                codes.push(code.to_string());
            }
        }
    }
    Ok(codes)
}
