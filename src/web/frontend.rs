//! Embedded HTML/CSS/JS frontend for the agentmon web dashboard.
//!
//! The page is compiled into the binary as a string constant. It holds no
//! state of its own beyond the search box: every refresh asks the server for
//! the derived view.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Agent Monitor</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #6366f1;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; }
.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 24px; }
header h1 { font-size: 22px; font-weight: 600; }
header .refreshed { color: var(--text-muted); font-size: 12px; }

.stats-grid { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; margin-bottom: 16px; }
.card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 20px; margin-bottom: 16px; }
.card h2 { font-size: 14px; color: var(--text-muted); margin-bottom: 12px; font-weight: 500; }
.stat .value { font-size: 32px; font-weight: 700; }
.stat .label { color: var(--text-muted); font-size: 12px; }

svg { width: 100%; height: 200px; }
svg polyline { fill: none; stroke: var(--accent); stroke-width: 2; }
svg text { fill: var(--text-muted); font-size: 10px; }

input[type=search] { width: 100%; padding: 8px 12px; border-radius: 6px; border: 1px solid var(--border);
  background: var(--bg); color: var(--text); margin-bottom: 12px; }

table { width: 100%; border-collapse: collapse; }
th { text-align: left; color: var(--text-muted); font-weight: 500; padding: 8px; border-bottom: 1px solid var(--border); }
td { padding: 8px; border-bottom: 1px solid var(--border); vertical-align: top; }
td.time { color: var(--text-muted); white-space: nowrap; }
.q b { color: var(--text-muted); }
.a b { color: var(--accent); }
.badge { padding: 2px 6px; border-radius: 4px; font-size: 12px; }
.badge.fast { background: rgba(63,185,80,0.15); color: var(--green); }
.badge.slow { background: rgba(210,153,34,0.15); color: var(--yellow); }
button.fb { background: transparent; border: 1px solid var(--border); border-radius: 4px; color: var(--text-muted);
  cursor: pointer; padding: 2px 8px; }
button.fb.up.on { border-color: var(--green); color: var(--green); }
button.fb.down.on { border-color: var(--red); color: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>Agent Monitor</h1>
    <div class="refreshed" id="refreshed">waiting for first poll</div>
  </header>

  <div class="stats-grid">
    <div class="card stat"><div class="value" id="stat-total">0</div><div class="label">Total Interactions</div></div>
    <div class="card stat"><div class="value" id="stat-latency">0ms</div><div class="label">Average Latency</div></div>
    <div class="card stat"><div class="value" id="stat-positive">0%</div><div class="label">Positive Rate</div></div>
    <div class="card stat"><div class="value" id="stat-users">0</div><div class="label">Unique Users</div></div>
  </div>

  <div class="card">
    <h2>Response Latency (ms)</h2>
    <svg id="chart" viewBox="0 0 600 200" preserveAspectRatio="none"></svg>
  </div>

  <div class="card">
    <input type="search" id="search" placeholder="Search questions, answers, users">
    <table>
      <thead><tr><th>Time</th><th>Message</th><th>Latency</th><th>Feedback</th></tr></thead>
      <tbody id="rows"></tbody>
    </table>
  </div>
</div>

<script>
let timer = null;

function esc(s) {
  return String(s).replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
}

async function refresh() {
  const q = document.getElementById('search').value;
  try {
    const res = await fetch('/api/view?q=' + encodeURIComponent(q));
    render(await res.json());
  } catch (e) {
    console.error('view refresh failed', e);
  }
}

function render(v) {
  document.getElementById('stat-total').textContent = v.total_interactions;
  document.getElementById('stat-latency').textContent = v.average_latency_ms + 'ms';
  document.getElementById('stat-positive').textContent = v.positive_rate_pct + '%';
  document.getElementById('stat-users').textContent = v.unique_users;
  if (v.last_refresh) {
    document.getElementById('refreshed').textContent = 'refreshed ' + new Date(v.last_refresh).toLocaleTimeString();
  }
  drawChart(v.chart);
  document.getElementById('rows').innerHTML = v.rows.map(row).join('');
}

function drawChart(points) {
  const svg = document.getElementById('chart');
  if (!points.length) { svg.innerHTML = ''; return; }
  const max = Math.max(1, ...points.map(p => p.latency));
  const step = points.length > 1 ? 580 / (points.length - 1) : 0;
  const xy = points.map((p, i) => [10 + i * step, 185 - (p.latency / max) * 170]);
  svg.innerHTML = '<polyline points="' + xy.map(c => c.join(',')).join(' ') + '"/>' +
    points.map((p, i) => '<text x="' + xy[i][0] + '" y="198" text-anchor="middle">' + esc(p.time) + '</text>').join('');
}

function row(r) {
  const id = esc(r.id);
  return '<tr>' +
    '<td class="time">' + esc(r.timestamp) + '</td>' +
    '<td><div class="q"><b>Q:</b> ' + esc(r.question) + '</div><div class="a"><b>A:</b> ' + esc(r.answer) + '</div></td>' +
    '<td><span class="badge ' + r.band + '">' + r.duration + 'ms</span></td>' +
    '<td><button class="fb up' + (r.feedback === 'up' ? ' on' : '') + '" data-id="' + id + '" data-fb="up">&#128077;</button> ' +
    '<button class="fb down' + (r.feedback === 'down' ? ' on' : '') + '" data-id="' + id + '" data-fb="down">&#128078;</button></td>' +
    '</tr>';
}

document.getElementById('rows').addEventListener('click', async e => {
  const btn = e.target.closest('button.fb');
  if (!btn) return;
  try {
    await fetch('/api/logs/' + encodeURIComponent(btn.dataset.id) + '/feedback', {
      method: 'PUT',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ feedback: btn.dataset.fb }),
    });
  } catch (err) {
    console.error(err);
  }
  refresh();
});

document.getElementById('search').addEventListener('input', refresh);

refresh();
timer = setInterval(refresh, 2000);
window.addEventListener('beforeunload', () => clearInterval(timer));
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_polls_the_view_endpoint() {
        assert!(INDEX_HTML.contains("/api/view?q="));
        assert!(INDEX_HTML.contains("setInterval(refresh, 2000)"));
    }

    #[test]
    fn page_routes_feedback_through_local_server() {
        assert!(INDEX_HTML.contains("'/api/logs/' + encodeURIComponent"));
        assert!(INDEX_HTML.contains("method: 'PUT'"));
    }
}
