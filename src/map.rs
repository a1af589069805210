//! Map rendering: one marker per resolved coordinate on a Leaflet map
//! with pan, zoom, and drag disabled. The destination marker is drawn
//! distinctly from the postcode markers, and it uses only the resolved
//! destination coordinate.

use crate::geocode::Destination;
use crate::postcode::PostcodeRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Destination,
    Postcode,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
    pub kind: MarkerKind,
}

/// Build the marker set: destination first, then one marker per row.
pub fn markers(destination: &Destination, rows: &[PostcodeRecord]) -> Vec<MapMarker> {
    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(MapMarker {
        lat: destination.coordinate.lat,
        lon: destination.coordinate.lon,
        label: destination.address.clone(),
        kind: MarkerKind::Destination,
    });
    for row in rows {
        out.push(MapMarker {
            lat: row.coordinate.lat,
            lon: row.coordinate.lon,
            label: format!("{} — {}, {}", row.code, row.suburb, row.city),
            kind: MarkerKind::Postcode,
        });
    }
    out
}

/// Render a standalone HTML page with all markers on a locked-down
/// Leaflet map (no pan, zoom, or drag). Used by the CLI `--map-out`
/// option; the web UI renders the same marker data client-side.
pub fn map_document(destination: &Destination, rows: &[PostcodeRecord]) -> String {
    let marker_json =
        serde_json::to_string(&markers(destination, rows)).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Postcode distances — {address}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const markers = {marker_json};
const map = L.map('map', {{
  dragging: false,
  zoomControl: false,
  scrollWheelZoom: false,
  doubleClickZoom: false,
  boxZoom: false,
  touchZoom: false,
  keyboard: false,
}});
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap contributors',
}}).addTo(map);
const points = [];
for (const m of markers) {{
  points.push([m.lat, m.lon]);
  if (m.kind === 'destination') {{
    L.circleMarker([m.lat, m.lon], {{ radius: 10, color: '#c0392b', fillOpacity: 0.9 }})
      .bindPopup(m.label).addTo(map);
  }} else {{
    L.circleMarker([m.lat, m.lon], {{ radius: 6, color: '#2980b9', fillOpacity: 0.8 }})
      .bindPopup(m.label).addTo(map);
  }}
}}
map.fitBounds(L.latLngBounds(points).pad(0.2));
</script>
</body>
</html>
"#,
        address = html_escape(&destination.address),
        marker_json = marker_json,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::Coordinate;

    fn destination() -> Destination {
        Destination {
            address: "72 Victoria Street West, Auckland 1010".into(),
            coordinate: Coordinate::new(-36.8485, 174.7633),
            display_name: None,
        }
    }

    fn rows() -> Vec<PostcodeRecord> {
        vec![
            PostcodeRecord {
                code: "6011".into(),
                city: "Wellington".into(),
                suburb: "Te Aro".into(),
                coordinate: Coordinate::new(-41.2924, 174.7787),
                distance_km: Some(643.2),
            },
            PostcodeRecord {
                code: "8011".into(),
                city: "Canterbury".into(),
                suburb: "Christchurch Central".into(),
                coordinate: Coordinate::new(-43.5309, 172.6365),
                distance_km: Some(1067.8),
            },
        ]
    }

    #[test]
    fn test_markers_destination_first_and_distinct() {
        let marks = markers(&destination(), &rows());
        assert_eq!(marks.len(), 3);
        assert_eq!(marks[0].kind, MarkerKind::Destination);
        assert_eq!(marks[0].lat, -36.8485);
        assert!(marks[1..].iter().all(|m| m.kind == MarkerKind::Postcode));
    }

    // Exactly one destination marker, at the resolved coordinate —
    // no extra hardcoded markers.
    #[test]
    fn test_markers_single_destination() {
        let marks = markers(&destination(), &rows());
        let dests: Vec<_> = marks.iter().filter(|m| m.kind == MarkerKind::Destination).collect();
        assert_eq!(dests.len(), 1);
        assert_eq!(dests[0].lon, 174.7633);
    }

    #[test]
    fn test_document_embeds_markers_and_locks_interaction() {
        let doc = map_document(&destination(), &rows());
        assert!(doc.contains("-36.8485"));
        assert!(doc.contains("-41.2924"));
        assert!(doc.contains("dragging: false"));
        assert!(doc.contains("scrollWheelZoom: false"));
        assert!(doc.contains("zoomControl: false"));
        assert!(doc.contains("leaflet"));
    }

    #[test]
    fn test_document_escapes_address() {
        let mut dest = destination();
        dest.address = "1 <script> Lane & Co".into();
        let doc = map_document(&dest, &[]);
        assert!(doc.contains("1 &lt;script&gt; Lane &amp; Co"));
    }
}
