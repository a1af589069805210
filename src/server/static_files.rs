//! Embedded web UI assets. Served straight from the binary — no asset
//! directory to deploy.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Postroute — postcode distance tallier</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<link rel="stylesheet" href="/style.css">
</head>
<body>
<main>
  <h1>Find total distance from list of postcodes to destination</h1>

  <section class="inputs">
    <label for="address">Destination address</label>
    <input id="address" type="text"
           placeholder="E.g.: 72 Victoria Street West, Auckland 1010"
           title="Please include street number, street name, suburb, and city">
    <label for="csv">Postcode CSV (one column, one postcode per row)</label>
    <input id="csv" type="file" accept=".csv,.txt">
    <button id="run">Calculate distances</button>
  </section>

  <p id="status" class="status"></p>
  <p id="resolved" class="resolved"></p>

  <section id="uploaded-section" hidden>
    <h2>Postcodes from file</h2>
    <table id="uploaded"></table>
  </section>

  <div id="map" hidden></div>

  <section id="results-section" hidden>
    <h2>Driving distances</h2>
    <table id="results"></table>
    <p id="rejected" class="rejected"></p>
    <p id="total" class="total"></p>
  </section>
</main>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="/app.js"></script>
</body>
</html>
"#;

pub const STYLE_CSS: &str = r#"
body {
  font-family: system-ui, sans-serif;
  margin: 0;
  background: #f5f6f8;
  color: #1f2430;
}
main { max-width: 860px; margin: 0 auto; padding: 1.5rem; }
h1 { font-size: 1.4rem; }
.inputs { display: flex; flex-direction: column; gap: 0.5rem; margin-bottom: 1rem; }
.inputs input[type="text"] { padding: 0.5rem; font-size: 1rem; }
.inputs button {
  align-self: flex-start;
  padding: 0.5rem 1.25rem;
  font-size: 1rem;
  background: #2980b9;
  color: white;
  border: none;
  border-radius: 4px;
  cursor: pointer;
}
.inputs button:disabled { background: #95a5a6; cursor: wait; }
.status { color: #c0392b; min-height: 1.2em; }
.resolved { color: #14643f; }
.rejected { color: #b9770e; }
.total { font-size: 1.2rem; font-weight: 600; }
#map { height: 380px; margin: 1rem 0; border: 1px solid #d5d9e0; }
table { border-collapse: collapse; width: 100%; background: white; }
th, td { border: 1px solid #d5d9e0; padding: 0.35rem 0.6rem; text-align: left; }
th { background: #eef1f5; }
"#;

pub const APP_JS: &str = r#"
const addressInput = document.getElementById('address');
const csvInput = document.getElementById('csv');
const runButton = document.getElementById('run');
const statusLine = document.getElementById('status');
const resolvedLine = document.getElementById('resolved');

let uploadedCodes = [];

function renderTable(el, header, rows) {
  el.innerHTML = '';
  const thead = document.createElement('tr');
  for (const h of header) {
    const th = document.createElement('th');
    th.textContent = h;
    thead.appendChild(th);
  }
  el.appendChild(thead);
  for (const row of rows) {
    const tr = document.createElement('tr');
    for (const cell of row) {
      const td = document.createElement('td');
      td.textContent = cell;
      tr.appendChild(td);
    }
    el.appendChild(tr);
  }
}

csvInput.addEventListener('change', () => {
  const file = csvInput.files[0];
  if (!file) { return; }
  const reader = new FileReader();
  reader.onload = () => {
    uploadedCodes = reader.result
      .split(/\r?\n/)
      .map((line) => line.split(',')[0].trim())
      .filter((code) => code.length > 0);
    document.getElementById('uploaded-section').hidden = false;
    renderTable(
      document.getElementById('uploaded'),
      ['Postcode'],
      uploadedCodes.map((c) => [c]),
    );
  };
  reader.readAsText(file);
});

function drawMap(markers) {
  const mapEl = document.getElementById('map');
  mapEl.hidden = false;
  if (window._map) { window._map.remove(); }
  // Pan, zoom, and drag are deliberately disabled.
  const map = L.map('map', {
    dragging: false,
    zoomControl: false,
    scrollWheelZoom: false,
    doubleClickZoom: false,
    boxZoom: false,
    touchZoom: false,
    keyboard: false,
  });
  window._map = map;
  L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
    attribution: '&copy; OpenStreetMap contributors',
  }).addTo(map);
  const points = [];
  for (const m of markers) {
    points.push([m.lat, m.lon]);
    const style = m.kind === 'destination'
      ? { radius: 10, color: '#c0392b', fillOpacity: 0.9 }
      : { radius: 6, color: '#2980b9', fillOpacity: 0.8 };
    L.circleMarker([m.lat, m.lon], style).bindPopup(m.label).addTo(map);
  }
  map.fitBounds(L.latLngBounds(points).pad(0.2));
}

runButton.addEventListener('click', async () => {
  const address = addressInput.value.trim();
  statusLine.textContent = '';
  resolvedLine.textContent = '';
  if (!address) { return; }
  if (uploadedCodes.length === 0) { return; }

  runButton.disabled = true;
  statusLine.textContent = 'Calculating distances...';
  try {
    const response = await fetch('/api/distances', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ address: address, postcodes: uploadedCodes }),
    });
    const body = await response.json();
    if (!response.ok) {
      statusLine.textContent = body.error || 'Request failed';
      return;
    }
    statusLine.textContent = '';
    resolvedLine.textContent =
      'Destination latitude and longitude: (' +
      body.destination.coordinate.lat + ', ' + body.destination.coordinate.lon + ')';

    drawMap(body.markers);

    document.getElementById('results-section').hidden = false;
    renderTable(
      document.getElementById('results'),
      ['City', 'Suburb', 'Postcode', 'Latitude', 'Longitude', 'Distance (km)'],
      body.rows.map((r) => [
        r.city, r.suburb, r.code,
        r.coordinate.lat, r.coordinate.lon,
        r.distance_km === null ? '' : r.distance_km.toFixed(2),
      ]),
    );

    const rejectedLine = document.getElementById('rejected');
    rejectedLine.textContent = body.rejected.length > 0
      ? 'Postcodes not found (excluded from total): ' + body.rejected.join(', ')
      : '';

    document.getElementById('total').textContent =
      'Total distance from all postcodes to ' + address + ' is ' + body.total_label;
  } catch (err) {
    statusLine.textContent = 'Request failed: ' + err;
  } finally {
    runButton.disabled = false;
  }
});
"#;
