use clap::Parser;
use postroute::geocode::NominatimGeocoder;
use postroute::map::map_document;
use postroute::pipeline::{self, DistanceReport};
use postroute::postcode::{read_postcode_file, PostcodeTable};
use postroute::routing::{OsrmRouter, DEFAULT_OSRM_URL};
use postroute::server;
use std::path::PathBuf;

/// Postroute — total driving distance from a list of postcodes to one
/// destination address.
///
/// Geocodes the address via Nominatim, resolves postcodes against a
/// bundled offline table, and queries OSRM for each driving distance.
///
/// Examples:
///   postroute "72 Victoria Street West, Auckland 1010" --postcodes codes.csv
///   postroute "72 Victoria Street West, Auckland 1010" -p codes.csv --map-out map.html
///   postroute --serve --port 8080
#[derive(Parser)]
#[command(name = "postroute", version, about, long_about = None)]
struct Cli {
    /// Destination address. Include street number, street name,
    /// suburb, and city.
    #[arg(index = 1)]
    address: Option<String>,

    /// CSV file of postcodes: one column, one postcode per row, no header.
    #[arg(long, short = 'p')]
    postcodes: Option<PathBuf>,

    /// Country for the postcode reference table (ISO code).
    #[arg(long, default_value = "nz")]
    country: String,

    /// OSRM routing endpoint.
    #[arg(long, default_value = DEFAULT_OSRM_URL)]
    osrm_url: String,

    /// Write a standalone HTML map of all markers to this file.
    #[arg(long)]
    map_out: Option<PathBuf>,

    /// Run the web UI instead of a one-shot computation.
    #[arg(long)]
    serve: bool,

    /// Bind host for --serve.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port for --serve.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() {
    let cli = Cli::parse();

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start async runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(server::start(
            &cli.host,
            cli.port,
            cli.osrm_url,
            cli.country,
        ));
        return;
    }

    // ── One-shot pipeline run ───────────────────────────────────

    let address = cli.address.clone().unwrap_or_else(|| {
        eprintln!("Error: No destination address given.");
        eprintln!();
        eprintln!("Usage:");
        eprintln!("  postroute \"72 Victoria Street West, Auckland 1010\" --postcodes codes.csv");
        eprintln!("  postroute --serve");
        std::process::exit(1);
    });

    let postcodes_path = cli.postcodes.clone().unwrap_or_else(|| {
        eprintln!("Error: No postcode file given. Use --postcodes <file>.");
        std::process::exit(1);
    });

    let codes = read_postcode_file(&postcodes_path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let table = PostcodeTable::bundled(&cli.country).unwrap_or_else(|| {
        eprintln!(
            "Error: No bundled postcode table for country '{}'. Available: {}",
            cli.country,
            PostcodeTable::bundled_countries().join(", "),
        );
        std::process::exit(1);
    });

    let mut geocoder = NominatimGeocoder::new();
    let router = OsrmRouter::with_base_url(&cli.osrm_url);

    eprintln!("  Resolving '{}' ...", address);
    let report = pipeline::run(&mut geocoder, &table, &router, &address, &codes)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    print_report(&report);

    if let Some(path) = &cli.map_out {
        let html = map_document(&report.destination, &report.rows);
        std::fs::write(path, html).unwrap_or_else(|e| {
            eprintln!("Error: Cannot write map to {}: {}", path.display(), e);
            std::process::exit(1);
        });
        eprintln!("  Map written to {}", path.display());
    }

    // JSON to stdout, human output to stderr
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot serialize report: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_report(report: &DistanceReport) {
    eprintln!(
        "  Destination latitude and longitude: ({:.4}, {:.4})",
        report.destination.coordinate.lat, report.destination.coordinate.lon,
    );
    eprintln!();
    eprintln!(
        "  {:<20} {:<24} {:<9} {:>10} {:>11} {:>13}",
        "City", "Suburb", "Postcode", "Latitude", "Longitude", "Distance (km)",
    );
    for row in &report.rows {
        let distance = row
            .distance_km
            .map(|d| format!("{:.2}", d))
            .unwrap_or_default();
        eprintln!(
            "  {:<20} {:<24} {:<9} {:>10.4} {:>11.4} {:>13}",
            row.city, row.suburb, row.code, row.coordinate.lat, row.coordinate.lon, distance,
        );
    }
    if !report.rejected.is_empty() {
        eprintln!();
        eprintln!(
            "  Postcodes not found (excluded from total): {}",
            report.rejected.join(", "),
        );
    }
    eprintln!();
    eprintln!(
        "  Total distance from all postcodes to {} is {}",
        report.destination.address,
        report.total_line(),
    );
}
