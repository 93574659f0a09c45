//! Embedded HTML/CSS/JS frontend for the ragboard web dashboard.
//!
//! The page holds no state of its own: it renders `GET /api/state` and
//! posts user actions back. Everything is compiled into the binary.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ragboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1280px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: baseline;
  gap: 12px;
  margin-bottom: 20px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; font-family: var(--mono); color: var(--accent); }
header .subtitle { color: var(--text-muted); font-size: 13px; }

nav {
  display: flex;
  flex-wrap: wrap;
  gap: 4px;
  margin-bottom: 20px;
  background: var(--surface);
  border-radius: var(--radius);
  padding: 4px;
  border: 1px solid var(--border);
}
nav button {
  flex: 1;
  padding: 8px 12px;
  border: none;
  border-radius: 6px;
  background: transparent;
  color: var(--text-muted);
  font-size: 13px;
  font-weight: 500;
  cursor: pointer;
}
nav button:hover { color: var(--text); background: rgba(255,255,255,0.04); }
nav button.active { background: var(--accent); color: #fff; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 12px; }
.card h3 { font-size: 13px; font-weight: 600; margin: 12px 0 6px; color: var(--text-muted); text-transform: uppercase; }

.split { display: grid; grid-template-columns: 2fr 3fr; gap: 16px; }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid var(--border); vertical-align: top; }
th { color: var(--text-muted); font-weight: 500; font-size: 12px; text-transform: uppercase; }
td.num, th.num { text-align: right; font-family: var(--mono); }
td.mono { font-family: var(--mono); font-size: 12px; }
tr.clickable { cursor: pointer; }
tr.clickable:hover { background: rgba(255,255,255,0.03); }
tr.selected { background: rgba(88,166,255,0.12); }

button.primary {
  padding: 8px 16px;
  border: none;
  border-radius: 6px;
  background: var(--accent);
  color: #fff;
  font-weight: 600;
  cursor: pointer;
}
button.primary:disabled { opacity: 0.4; cursor: not-allowed; }

input[type=text], input[type=number], textarea, select {
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 6px 10px;
  font-family: var(--font);
}
textarea { width: 100%; min-height: 70px; }

.row { display: flex; gap: 8px; align-items: center; margin-bottom: 12px; }
.muted { color: var(--text-muted); }
.error { color: var(--red); margin: 8px 0; }
.notice { color: var(--green); margin: 8px 0; }
.status { color: var(--yellow); margin: 8px 0; }
.placeholder { color: var(--text-muted); font-style: italic; }
.answer { white-space: pre-wrap; margin: 8px 0; }
ul.items { margin-left: 18px; }

.panel { display: none; }
.panel.active { display: block; }

#global-error {
  display: none;
  position: sticky;
  bottom: 0;
  margin-top: 24px;
  padding: 12px 16px;
  border: 1px solid var(--red);
  border-radius: var(--radius);
  background: var(--surface);
  color: var(--red);
}
#global-error.show { display: flex; justify-content: space-between; }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>ragboard</h1>
    <span class="subtitle">RAG evaluation and auto-tune dashboard</span>
  </header>

  <nav id="nav"></nav>

  <section class="panel" id="panel-system-overview">
    <div class="card">
      <h2>System Overview</h2>
      <p class="muted">Questions are answered by the retrieval pipeline, scored by an LLM judge on
      relevance, faithfulness and completeness, and compared across pipeline configs. The agent can
      analyze a run and the auto-tune loop proposes and evaluates new configs, keeping improvements.</p>
    </div>
  </section>

  <section class="panel" id="panel-live-query">
    <div class="card">
      <h2>Live Query</h2>
      <textarea id="question" placeholder="Ask a question about the workspace documents"></textarea>
      <div class="row">
        <label class="muted">top_k <input type="number" id="top-k" min="1" value="5" style="width:70px"></label>
        <button class="primary" id="ask">Ask</button>
      </div>
      <div id="query-out"></div>
    </div>
  </section>

  <section class="panel" id="panel-eval-viewer">
    <div class="split">
      <div class="card">
        <h2>Eval Runs</h2>
        <div class="row">
          <input type="text" id="submit-config" placeholder="pipeline_config_id">
          <button class="primary" id="submit-run">Run eval</button>
        </div>
        <div id="runs-out"></div>
      </div>
      <div class="card">
        <h2>Run Detail</h2>
        <div id="detail-out"></div>
      </div>
    </div>
  </section>

  <section class="panel" id="panel-config-leaderboard">
    <div class="card">
      <h2>Config Leaderboard</h2>
      <div id="leaderboard-out"></div>
    </div>
  </section>

  <section class="panel" id="panel-agent-analysis">
    <div class="card">
      <h2>Agent Analysis</h2>
      <div class="row">
        <select id="analysis-target"></select>
        <button class="primary" id="analyze">Run Analysis</button>
      </div>
      <div id="analysis-out"></div>
    </div>
  </section>

  <section class="panel" id="panel-auto-tune-explorer">
    <div class="card">
      <h2>Auto-Tune</h2>
      <div class="row">
        <label class="muted">max iterations <input type="number" id="max-iterations" min="1" value="3" style="width:70px"></label>
        <button class="primary" id="start-tune">Start Auto Tune</button>
      </div>
      <div id="tune-out"></div>
    </div>
    <div class="card">
      <h2>History</h2>
      <div id="history-out"></div>
    </div>
  </section>

  <section class="panel" id="panel-insights">
    <div class="card">
      <h2>Insights</h2>
      <div id="insights-out"></div>
    </div>
  </section>

  <div id="global-error"><span id="global-error-text"></span><button class="primary" id="clear-errors">Dismiss</button></div>
</div>

<script>
// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
let state = null;

async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

async function post(path, body) {
  const next = await api('POST', path, body || {});
  if (next && next.tabs) { state = next; render(); }
}

async function refresh() {
  try {
    state = await api('GET', '/api/state');
    render();
  } catch (e) {
    document.getElementById('global-error-text').textContent = 'Dashboard server unreachable: ' + e.message;
    document.getElementById('global-error').className = 'show';
  }
}

function esc(s) {
  if (s === undefined || s === null) return '';
  return String(s).replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

function msg(cls, text) {
  return text ? `<div class="${cls}">${esc(text)}</div>` : '';
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------
function render() {
  const s = state;
  document.getElementById('nav').innerHTML = s.tabs.map(t =>
    `<button data-tab="${t.slug}" class="${t.active ? 'active' : ''}">${esc(t.title)}</button>`).join('');
  document.querySelectorAll('.panel').forEach(p =>
    p.classList.toggle('active', p.id === 'panel-' + s.active_tab));

  renderQuery(s.live_query);
  renderRuns(s.eval_viewer);
  renderLeaderboard(s.leaderboard);
  renderAnalysis(s.analysis, s.leaderboard);
  renderTune(s.auto_tune);
  renderInsights(s);

  const ge = document.getElementById('global-error');
  document.getElementById('global-error-text').textContent = s.global_error || '';
  ge.className = s.global_error ? 'show' : '';
}

function runTable(rows, withSerial) {
  return `<table><tr>${withSerial ? '<th>#</th>' : ''}<th>Config</th><th>Origin</th><th>Status</th>
    <th class="num">Overall</th><th class="num">Relevance</th><th class="num">Faithful</th><th class="num">Complete</th></tr>` +
    rows.map(r => `<tr class="clickable ${r.selected ? 'selected' : ''}" data-run="${esc(r.eval_run_id)}">
      ${withSerial ? `<td class="mono">${esc(r.serial)}</td>` : ''}
      <td>${esc(r.config_name)}</td><td class="muted">${esc(r.origin)}</td>
      <td class="muted">${esc(r.status)} ${esc(r.progress)}</td>
      <td class="num">${esc(r.overall)}</td><td class="num">${esc(r.relevance)}</td>
      <td class="num">${esc(r.faithfulness)}</td><td class="num">${esc(r.completeness)}</td></tr>`).join('') +
    '</table>';
}

function renderQuery(q) {
  document.getElementById('ask').disabled = q.loading;
  let html = msg('error', q.error);
  if (q.loading) html += '<div class="status">Thinking...</div>';
  if (q.answer !== null) {
    html += `<h3>Answer</h3><div class="answer">${esc(q.answer)}</div>`;
    if (q.latency_ms) html += `<div class="muted">${esc(q.latency_ms)} ms</div>`;
    html += `<h3>Contexts (${q.contexts.length})</h3>` +
      q.contexts.map(c => `<div class="answer muted">${esc(typeof c === 'string' ? c : (c.text || JSON.stringify(c)))}</div>`).join('');
  }
  document.getElementById('query-out').innerHTML = html;
}

function renderRuns(v) {
  let html = msg('error', v.error) + msg('notice', v.notice);
  if (v.loading) html += '<div class="status">Loading runs...</div>';
  html += v.empty_message ? `<div class="placeholder">${esc(v.empty_message)}</div>` : runTable(v.runs, true);
  document.getElementById('runs-out').innerHTML = html;

  const d = v.detail;
  let detail = d.message ? `<div class="placeholder">${esc(d.message)}</div>` : '';
  if (d.state === 'loaded') {
    detail += `<div><b>${esc(d.config_name)}</b> <span class="muted">on ${esc(d.eval_set_name)} (${esc(d.status)})</span></div>`;
    detail += '<h3>Summary</h3><table>' + d.summary_metrics.map(m =>
      `<tr><td>${esc(m.name)}</td><td class="num">${esc(m.value)}</td></tr>`).join('') + '</table>';
    detail += '<h3>Questions</h3><table><tr><th>Question</th><th>Answer</th><th class="num">Overall</th><th class="num">Rel</th><th class="num">Faith</th><th class="num">Comp</th></tr>' +
      d.results.map(r => `<tr><td>${esc(r.question)}<div class="muted">${esc(r.judge_explanation)}</div></td>
        <td>${esc(r.answer)}</td><td class="num">${esc(r.overall)}</td><td class="num">${esc(r.relevance)}</td>
        <td class="num">${esc(r.faithfulness)}</td><td class="num">${esc(r.completeness)}</td></tr>`).join('') + '</table>';
  }
  document.getElementById('detail-out').innerHTML = detail;
}

function renderLeaderboard(v) {
  let html = msg('error', v.error);
  if (v.loading) html += '<div class="status">Loading configs...</div>';
  html += v.empty_message ? `<div class="placeholder">${esc(v.empty_message)}</div>` : runTable(v.rows, true);
  document.getElementById('leaderboard-out').innerHTML = html;
}

function renderAnalysis(a, board) {
  const sel = document.getElementById('analysis-target');
  const options = board.rows.map(r =>
    `<option value="${esc(r.eval_run_id)}" ${r.eval_run_id === a.target ? 'selected' : ''}>${esc(r.serial)} ${esc(r.config_name)} (${esc(r.overall)})</option>`).join('');
  if (sel.innerHTML !== options) sel.innerHTML = options;
  const btn = document.getElementById('analyze');
  btn.disabled = !a.enabled;
  btn.textContent = a.state === 'analyzing' ? 'Analyzing...' : 'Run Analysis';

  let html = msg('error', a.error);
  if (a.result) {
    html += `<div>Best config: <b>${esc(a.result.best_config_name)}</b></div>`;
    html += a.result.sections.map(sec => `<h3>${esc(sec.title)}</h3>` + (sec.empty_message
      ? `<div class="placeholder">${esc(sec.empty_message)}</div>`
      : '<ul class="items">' + sec.items.map(i => `<li>${esc(i)}</li>`).join('') + '</ul>')).join('');
    if (a.result.reasoning) html += `<h3>Reasoning</h3><div class="answer">${esc(a.result.reasoning)}</div>`;
  }
  document.getElementById('analysis-out').innerHTML = html;
}

function tuneRun(r) {
  return `<div>Start <b>${esc(r.starting_score)}</b> &rarr; final <b>${esc(r.final_score)}</b>, ${esc(r.iterations)}` +
    (r.reason_stopped ? ` <span class="muted">(${esc(r.reason_stopped)})</span>` : '') + '</div>' +
    '<table><tr><th>#</th><th>Config</th><th class="num">Overall</th><th class="num">Delta</th></tr>' +
    r.history.map(it => `<tr><td class="mono">${it.iteration}</td><td>${esc(it.pipeline_config_name)}</td>
      <td class="num">${esc(it.avg_overall)}</td><td class="num">${esc(it.improvement)}</td></tr>`).join('') + '</table>';
}

function renderTune(t) {
  document.getElementById('start-tune').disabled = t.busy;
  let html = msg('status', t.status) + msg('error', t.error);
  if (t.result) html += tuneRun(t.result);
  document.getElementById('tune-out').innerHTML = html;

  let hist = msg('error', t.history_error);
  if (t.history_loading) hist += '<div class="status">Loading history...</div>';
  if (t.history_empty_message) hist += `<div class="placeholder">${esc(t.history_empty_message)}</div>`;
  hist += '<table>' + t.history.map((r, i) =>
    `<tr class="clickable ${i === t.selected_index ? 'selected' : ''}" data-history="${i}">
      <td class="mono">${esc(r.created_at)}</td><td class="num">${esc(r.starting_score)} &rarr; ${esc(r.final_score)}</td>
      <td>${esc(r.iterations)}</td></tr>`).join('') + '</table>';
  const picked = t.selected_index === null ? null : t.history[t.selected_index];
  if (picked) hist += '<h3>Selected run</h3>' + tuneRun(picked);
  document.getElementById('history-out').innerHTML = hist;
}

function renderInsights(s) {
  const rows = s.leaderboard.rows;
  if (!rows.length) {
    document.getElementById('insights-out').innerHTML = '<div class="placeholder">Open the leaderboard to load configs.</div>';
    return;
  }
  const best = rows[0];
  document.getElementById('insights-out').innerHTML =
    `<div>Best config so far: <b>${esc(best.config_name)}</b> with overall ${esc(best.overall)}.</div>
     <div class="muted">${rows.length} eval runs compared.</div>`;
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------
document.addEventListener('click', e => {
  const tab = e.target.closest('[data-tab]');
  if (tab) return post('/api/tab', { tab: tab.dataset.tab });
  const run = e.target.closest('[data-run]');
  if (run) return post('/api/eval/select', { eval_run_id: run.dataset.run });
  const hist = e.target.closest('[data-history]');
  if (hist) return post('/api/autotune/select', { index: Number(hist.dataset.history) });
});

document.getElementById('ask').addEventListener('click', () => post('/api/query', {
  question: document.getElementById('question').value,
  top_k: Number(document.getElementById('top-k').value) || null,
}));
document.getElementById('submit-run').addEventListener('click', () => post('/api/eval/submit', {
  pipeline_config_id: document.getElementById('submit-config').value,
}));
document.getElementById('analysis-target').addEventListener('change', e =>
  post('/api/analysis/target', { eval_run_id: e.target.value }));
document.getElementById('analyze').addEventListener('click', () => post('/api/analysis/run'));
document.getElementById('start-tune').addEventListener('click', () => post('/api/autotune/start', {
  max_iterations: Number(document.getElementById('max-iterations').value) || null,
}));
document.getElementById('clear-errors').addEventListener('click', () => post('/api/errors/clear'));

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
refresh();
setInterval(refresh, 1500);
</script>
</body>
</html>"##;
