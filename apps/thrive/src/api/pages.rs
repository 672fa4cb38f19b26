//! # HTML Pages
//!
//! The local dashboard, the truth engine form and its result section.
//! Pages are static strings; the dashboard drives the JSON API with `fetch`.

use serde_json::Value;
use thrive_core::{TruthResult, format_currency};

const STYLE: &str = r#"<style>
    :root {
      color-scheme: light dark;
      --bg: #f7f8fb; --text: #0b0d12; --panel: #ffffff; --border: #d3d8e0;
      --blue: #1f5fbf; --gold: #c28a10; --muted: #596273;
    }
    [data-theme="night"] {
      --bg: #0b1118; --text: #f1f4f8; --panel: #121a24; --border: #2a3340;
      --blue: #5aa2ff; --gold: #f3b43f; --muted: #a5b0c2;
    }
    * { box-sizing: border-box; }
    body { font-family: "Segoe UI", "Helvetica Neue", Arial, sans-serif; margin: 0;
           background: var(--bg); color: var(--text); line-height: 1.5; }
    header { padding: 1.5rem 2rem 0.5rem; display: flex; justify-content: space-between; align-items: center; }
    main { padding: 0 2rem 2rem; max-width: 960px; margin: 0 auto; }
    section { background: var(--panel); border: 1px solid var(--border); border-radius: 12px;
              padding: 1.5rem; margin-bottom: 1.5rem; }
    h1 { margin: 0; font-size: 1.8rem; }
    h2 { margin-top: 0; }
    label { display: block; margin: 0.6rem 0 0.25rem; font-weight: 600; }
    input, select, textarea { width: 100%; padding: 0.55rem 0.7rem; border-radius: 8px;
                              border: 1px solid var(--border); background: var(--panel); color: var(--text); }
    input[type="checkbox"] { width: auto; }
    button { border: none; border-radius: 8px; padding: 0.55rem 1.2rem; font-weight: 600; cursor: pointer;
             background: var(--blue); color: white; margin-top: 0.75rem; }
    .warn { color: var(--gold); font-weight: 600; }
    .muted { color: var(--muted); }
    pre { background: rgba(0, 0, 0, 0.04); padding: 1rem; border-radius: 8px; overflow-x: auto; }
  </style>"#;

const THEME_SCRIPT: &str = r#"<script>
    (function() {
      var key = 'thrive-theme';
      var root = document.documentElement;
      var toggle = document.getElementById('themeToggle');
      function apply(theme) {
        root.setAttribute('data-theme', theme);
        if (toggle) toggle.checked = theme === 'night';
      }
      var theme = 'day';
      try { theme = localStorage.getItem(key) || 'day'; } catch (err) {}
      apply(theme);
      if (toggle) {
        toggle.onchange = function() {
          var next = toggle.checked ? 'night' : 'day';
          apply(next);
          try { localStorage.setItem(key, next); } catch (err) {}
        };
      }
    })();
  </script>"#;

const THEME_TOGGLE: &str = r#"<label class="muted">Night mode <input id="themeToggle" type="checkbox" aria-label="Toggle night mode" /></label>"#;

const DASHBOARD_BODY: &str = r#"<main>
    <noscript><p class="warn">JavaScript is off. Live actions are unavailable.</p></noscript>

    <section>
      <h2>Context</h2>
      <label>Keystore Path <input id="keystorePath" placeholder="/path/to/keystore.json" /></label>
      <label>Wallet ID <input id="walletId" /></label>
      <button onclick="call('/api/context', {keystore_path: val('keystorePath'), wallet_id: val('walletId')}, 'contextOutput')">Set Context</button>
      <pre id="contextOutput"></pre>
      <label>Passphrase <input id="unlockPassphrase" type="password" /></label>
      <button onclick="call('/api/wallet/unlock', {passphrase: val('unlockPassphrase')}, 'contextOutput')">Unlock</button>
      <button onclick="call('/api/wallet/lock', {}, 'contextOutput')">Lock</button>
    </section>

    <section>
      <h2>Status</h2>
      <button onclick="get('/api/status', 'statusOutput')">Refresh</button>
      <pre id="statusOutput">{}</pre>
    </section>

    <section>
      <h2>Accounts</h2>
      <button onclick="get('/api/accounts', 'accountsOutput')">Load Accounts</button>
      <label>Account ID <input id="accountId" /></label>
      <button onclick="call('/api/accounts/select', {account_id: val('accountId')}, 'accountsOutput')">Set Active Account</button>
      <pre id="accountsOutput"></pre>
    </section>

    <section>
      <h2>Recovery Phrase</h2>
      <label>Passphrase <input id="seedPassphrase" type="password" /></label>
      <label><input id="seedAck" type="checkbox" /> I understand this exposes my funds.</label>
      <button onclick="call('/api/wallet/seed', {passphrase: val('seedPassphrase'), acknowledge_warning: checked('seedAck')}, 'seedOutput')">Export Seed</button>
      <div class="warn">Anyone with this phrase controls your funds.</div>
      <pre id="seedOutput"></pre>
    </section>

    <section>
      <h2>Plan</h2>
      <label>Action <select id="actionType"><option>HOLD</option><option>SWAP</option><option>TRANSFER</option></select></label>
      <label>From Asset <input id="fromAsset" value="USD" /></label>
      <label>To Asset <input id="toAsset" value="USD" /></label>
      <label>Amount <input id="intentAmount" type="number" step="any" value="100" /></label>
      <label>Snapshot ID <input id="snapshotId" value="snapshot-1" /></label>
      <label>Exposures (one per line: ASSET:quantity) <textarea id="exposures" rows="3">USD:1000</textarea></label>
      <button onclick="createPlan()">Create Plan</button>
      <button onclick="simulatePlan()">Simulate Last Plan</button>
      <pre id="planOutput"></pre>
      <pre id="simulateOutput"></pre>
    </section>

    <section>
      <h2>Execution</h2>
      <div class="muted">Execution stays gated until mode, arming and confirmation are all set.</div>
      <label>Mode <select id="execMode"><option>SAFE</option><option>MANUAL</option><option>GUARDED</option></select></label>
      <label>Allowed Actions (guarded, comma separated) <input id="allowedActions" placeholder="SWAP,TRANSFER" /></label>
      <label>Allowed Assets (guarded, comma separated) <input id="allowedAssets" placeholder="USD,EUR" /></label>
      <button onclick="setMode()">Set Mode</button>
      <label><input id="armed" type="checkbox" /> Armed</label>
      <button onclick="call('/api/execution/arm', {armed: checked('armed')}, 'executeOutput')">Update Arm</button>
      <label><input id="confirmAll" type="checkbox" /> I confirm execution</label>
      <button onclick="executePlan()">Execute Last Plan</button>
      <pre id="executeOutput"></pre>
    </section>

    <section>
      <h2>Advisor</h2>
      <div class="muted">Read-only notes on the last plan and simulation. Secrets are never sent.</div>
      <label><input id="advisorEnabled" type="checkbox" /> Enable advisory</label>
      <label>Provider API Key <input id="advisorKey" type="password" /></label>
      <button onclick="advise()">Ask</button>
      <pre id="advisorOutput"></pre>
    </section>

    <section>
      <h2>Truth Engine</h2>
      <p><a href="/truth-engine">Open the Thrive Truth Engine form</a></p>
    </section>
  </main>
  <script>
    var lastPlan = null;
    var lastSimulation = null;
    function val(id) { return document.getElementById(id).value.trim(); }
    function checked(id) { return document.getElementById(id).checked; }
    function list(id) { return val(id).split(',').map(function(s) { return s.trim(); }).filter(Boolean); }
    function show(target, data) { document.getElementById(target).textContent = JSON.stringify(data, null, 2); }
    async function call(path, body, target) {
      var response = await fetch(path, {method: 'POST', headers: {'Content-Type': 'application/json'}, body: JSON.stringify(body)});
      var data = await response.json();
      show(target, data);
      return response.ok ? data : null;
    }
    async function get(path, target) {
      var response = await fetch(path);
      show(target, await response.json());
    }
    async function createPlan() {
      var exposures = val('exposures').split('\n').filter(Boolean).map(function(line) {
        var parts = line.split(':');
        return {asset_code: parts[0].trim(), quantity: parseFloat(parts[1])};
      });
      lastPlan = await call('/api/plans', {
        snapshot_id: val('snapshotId'),
        exposures: exposures,
        intent: {action_type: val('actionType'), from_asset: val('fromAsset'), to_asset: val('toAsset'), amount: parseFloat(val('intentAmount'))}
      }, 'planOutput');
    }
    async function simulatePlan() {
      if (!lastPlan) { show('simulateOutput', {error: 'Create a plan first.'}); return; }
      lastSimulation = await call('/api/simulate', {plan: lastPlan}, 'simulateOutput');
    }
    async function setMode() {
      await call('/api/execution/mode', {mode: val('execMode'), allowed_action_types: list('allowedActions'), allowed_assets: list('allowedAssets')}, 'executeOutput');
    }
    async function executePlan() {
      if (!lastPlan) { show('executeOutput', {error: 'Create a plan first.'}); return; }
      await call('/api/execute', {plan: lastPlan, confirm_all: checked('confirmAll')}, 'executeOutput');
    }
    async function advise() {
      await call('/api/advisor', {enabled: checked('advisorEnabled'), api_key: val('advisorKey'), plan: lastPlan, simulation: lastSimulation, snapshot: null}, 'advisorOutput');
    }
  </script>"#;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn page(title: &str, subtitle: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html data-theme=\"day\">\n<head>\n  <meta charset=\"UTF-8\" />\n  <title>{title}</title>\n  {STYLE}\n</head>\n<body>\n  <header>\n    <div>\n      <h1>{title}</h1>\n      <div class=\"muted\">{subtitle}</div>\n    </div>\n    {THEME_TOGGLE}\n  </header>\n  {body}\n  {THEME_SCRIPT}\n</body>\n</html>",
        title = title,
        subtitle = subtitle,
        body = body,
    )
}

/// Operator dashboard at `/`.
pub fn render_dashboard() -> String {
    page("Thrive Capital OS", "Local, single-operator console.", DASHBOARD_BODY)
}

/// Truth engine form, optionally followed by a result section.
pub fn render_truth_form(result_section: &str) -> String {
    let body = format!(
        r#"<main>
    <section>
      <p>Thrive reveals after-tax, real-world net wealth using the Truth Engine. Submit a position to see the liquidation reality.</p>
      <form action="/calculate" method="post">
        <label>Asset type <input name="asset_type" value="stock" required /></label>
        <label>Quantity <input type="number" step="any" name="quantity" required /></label>
        <label>Cost basis per unit <input type="number" step="any" name="cost_basis_per_unit" required /></label>
        <label>Current price <input type="number" step="any" name="current_price" required /></label>
        <label>Days held <input type="number" name="days_held" required /></label>
        <label>State tax rate (optional) <input type="number" step="any" name="state_tax_rate" /></label>
        <button type="submit">Calculate</button>
      </form>
    </section>
    {result_section}
    <p><a href="/">Back to Capital OS</a></p>
  </main>"#
    );
    page("Thrive Truth Engine", "After-tax reality for a single position.", &body)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let rendered: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", escape_html(&plain(item))))
                .collect();
            format!("<ul>{}</ul>", rendered)
        }
        other => escape_html(&plain(other)),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result section for a calculated position.
pub fn render_result_section(result: &TruthResult) -> String {
    let data = serde_json::to_value(result).unwrap_or(Value::Null);
    let items: String = data
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| {
                    format!(
                        "<li><strong>{}</strong>: {}</li>",
                        escape_html(key),
                        format_value(value)
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    let raw_json = serde_json::to_string_pretty(&data).unwrap_or_default();

    format!(
        r#"<section>
      <h2>After-Tax Liquid Wealth</h2>
      <p>Net liquid wealth: {}</p>
      <h3>Details</h3>
      <ul>{}</ul>
      <h3>Raw JSON</h3>
      <pre>{}</pre>
    </section>
    <p><a href="/truth-engine">Back to form</a></p>"#,
        format_currency(result.net_liquid_wealth),
        items,
        escape_html(&raw_json)
    )
}

/// Error section shown when the form input is rejected.
pub fn render_error_section(message: &str) -> String {
    format!(
        "<section>\n      <h2>Invalid position</h2>\n      <p class=\"warn\">{}</p>\n    </section>",
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use thrive_core::{PositionInput, calculate_truth};

    #[test]
    fn escape_html_covers_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn result_section_lists_fields() {
        let result = calculate_truth(&PositionInput::demo()).expect("demo");
        let html = render_result_section(&result);
        assert!(html.contains("Net liquid wealth: $"));
        assert!(html.contains("<strong>confidence_level</strong>"));
        assert!(html.contains("<ul><li>"));
    }

    #[test]
    fn form_embeds_result() {
        let html = render_truth_form("<p>RESULT</p>");
        assert!(html.contains("action=\"/calculate\""));
        assert!(html.contains("<p>RESULT</p>"));
    }
}
