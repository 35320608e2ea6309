//! Embedded HTML/JS frontend for the statdash web dashboard.
//!
//! The page is compiled into the binary. It shares its stylesheet and chart
//! mounting with the static report and loads Plotly from the CDN.

use crate::render::html::{MOUNT_SCRIPT, PLOTLY_CDN, STYLE};

/// The complete single-page dashboard HTML.
pub fn index_html() -> String {
    INDEX_TEMPLATE
        .replace("%STYLE%", STYLE)
        .replace("%PLOTLY%", PLOTLY_CDN)
        .replace("%MOUNT%", MOUNT_SCRIPT)
}

const INDEX_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>statdash</title>
<style>%STYLE%
.badge { display: inline-block; padding: 2px 10px; border-radius: 12px; font-size: 12px; border: 1px solid var(--border); }
.badge.ok { color: var(--green); border-color: var(--green); }
.badge.err { color: var(--red); border-color: var(--red); }
.loading { color: var(--muted); font-style: italic; }
</style>
<script src="%PLOTLY%"></script>
</head>
<body>
<div class="app">
<header>
  <h1>Residual diagnostics</h1>
  <div class="subtitle"><span id="api-badge" class="badge">checking API…</span> <span id="vars-source"></span></div>
</header>
<main id="sections"><p class="loading">Loading sections… the hosted API may take a minute to wake.</p></main>
<section class="card" id="section-raw">
  <h2>Raw data</h2>
  <button class="toggle" id="raw-toggle">Show raw data</button>
  <div id="raw-body"></div>
</section>
</div>
<script>
%MOUNT%

function esc(s) {
  return String(s)
    .replace(/&/g, '&amp;').replace(/</g, '&lt;').replace(/>/g, '&gt;')
    .replace(/"/g, '&quot;').replace(/'/g, '&#39;');
}

function tableHtml(t) {
  let html = '<table class="data">';
  if (t.headers.length) {
    html += '<thead><tr>' + t.headers.map(h => '<th>' + esc(h) + '</th>').join('') + '</tr></thead>';
  }
  html += '<tbody>';
  t.rows.forEach(r => {
    html += (r.emphasis ? '<tr class="sig">' : '<tr>') +
      r.cells.map(c => '<td>' + esc(c) + '</td>').join('') + '</tr>';
  });
  html += '</tbody></table>';
  if (!t.rows.length) html += '<p class="muted">No rows.</p>';
  return html;
}

function sectionHtml(s, charts) {
  let body;
  if (s.outcome.status === 'failed') {
    body = '<p class="error">' + esc(s.outcome.body) + '</p>';
  } else if (!s.outcome.body.length) {
    body = '<p class="muted">Nothing to display.</p>';
  } else {
    body = s.outcome.body.map(a => {
      if (a.kind === 'table') return tableHtml(a);
      charts.push(a);
      return '<div class="chart"><h3>' + esc(a.title) + '</h3><div class="plot" id="' + esc(a.id) + '"></div></div>';
    }).join('');
  }
  return '<section class="card" id="section-' + esc(s.id) + '"><h2>' + esc(s.title) + '</h2>' + body + '</section>';
}

async function loadSections() {
  const root = document.getElementById('sections');
  try {
    const res = await fetch('/api/sections');
    const data = await res.json();
    if (!res.ok) throw new Error(data.error || res.statusText);
    const charts = [];
    root.innerHTML = data.sections.map(s => sectionHtml(s, charts)).join('');
    mountCharts(charts);
    const src = document.getElementById('vars-source');
    src.textContent = data.variables_source === 'fallback'
      ? 'variables: configured (discovery failed: ' + data.discovery_error + ')'
      : 'variables: ' + data.variables_source;
  } catch (e) {
    root.innerHTML = '<p class="error">Unable to load dashboard: ' + esc(e.message) + '</p>';
  }
}

async function toggleRaw() {
  const btn = document.getElementById('raw-toggle');
  const body = document.getElementById('raw-body');
  btn.disabled = true;
  if (!body.innerHTML) body.innerHTML = '<p class="loading">Loading…</p>';
  try {
    const res = await fetch('/api/raw/toggle', { method: 'POST' });
    const data = await res.json();
    if (!res.ok) throw new Error(data.error || res.statusText);
    if (data.table) {
      body.innerHTML = tableHtml(data.table);
    } else if (data.error) {
      body.innerHTML = '<p class="error">' + esc(data.error) + '</p>';
    } else {
      body.innerHTML = '';
    }
    btn.textContent = data.state === 'visible' ? 'Hide raw data' : 'Show raw data';
  } catch (e) {
    body.innerHTML = '<p class="error">' + esc(e.message) + '</p>';
  } finally {
    btn.disabled = false;
  }
}

async function loadHealth() {
  const badge = document.getElementById('api-badge');
  try {
    const res = await fetch('/api/health');
    const h = await res.json();
    badge.textContent = (h.api_reachable ? 'API up' : 'API unreachable') + ' · ' + h.api_base;
    badge.className = 'badge ' + (h.api_reachable ? 'ok' : 'err');
  } catch (e) {
    badge.textContent = 'health check failed';
    badge.className = 'badge err';
  }
}

document.getElementById('raw-toggle').addEventListener('click', toggleRaw);
loadHealth();
loadSections();
</script>
</body>
</html>
"##;
