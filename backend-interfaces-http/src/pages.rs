//! Minimal HTML for the browser-facing anomaly check.

use backend_domain::ScoredTransaction;

const STYLE: &str = "body { font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; }
.form-group { margin-bottom: 15px; }
label { display: block; margin-bottom: 5px; font-weight: bold; }
input { width: 100%; padding: 8px; box-sizing: border-box; }
button, .back-button { background-color: #4CAF50; color: white; padding: 10px 15px; border: none; text-decoration: none; display: inline-block; cursor: pointer; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { padding: 8px; text-align: left; border-bottom: 1px solid #ddd; }
th { background-color: #f2f2f2; }";

pub fn check_form() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Land Transaction Anomaly Check</title>
<style>{STYLE}</style>
</head>
<body>
<h1>Land Transaction Anomaly Detection</h1>
<p>Enter transaction details to check for potential anomalies:</p>
<form method="post" action="/">
<div class="form-group"><label for="parcel_id">Parcel ID:</label>
<input type="text" id="parcel_id" name="parcel_id" placeholder="e.g., P123456"></div>
<div class="form-group"><label for="transaction_date">Transaction Date:</label>
<input type="date" id="transaction_date" name="transaction_date" required></div>
<div class="form-group"><label for="sale_price">Sale Price (&#8377;):</label>
<input type="number" id="sale_price" name="sale_price" placeholder="e.g., 350000" step="0.01" required></div>
<div class="form-group"><label for="market_value">Market Value (&#8377;):</label>
<input type="number" id="market_value" name="market_value" placeholder="e.g., 320000" step="0.01" required></div>
<div class="form-group"><label for="land_area">Land Area (sq.m):</label>
<input type="number" id="land_area" name="land_area" placeholder="e.g., 100" step="0.01" required></div>
<div class="form-group"><label for="days_since_prev">Days Since Previous Transaction:</label>
<input type="number" id="days_since_prev" name="days_since_prev" placeholder="e.g., 180" value="0"></div>
<button type="submit">Check Transaction</button>
</form>
</body>
</html>
"#
    )
}

pub fn check_result(scored: &ScoredTransaction) -> String {
    let is_anomaly = scored.verdict.is_anomaly();
    let record = &scored.record;
    let features = &scored.features;
    let (color, verdict) = if is_anomaly {
        ("#ffdddd", "suspicious")
    } else {
        ("#ddffdd", "normal")
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Anomaly Detection Result</title>
<style>{STYLE}
.result {{ background-color: {color}; padding: 20px; border-radius: 5px; margin-bottom: 20px; }}</style>
</head>
<body>
<h1>Transaction Analysis Result</h1>
<div class="result">
<h2>Risk Assessment: {risk}</h2>
<p>This transaction has been flagged as {verdict}.</p>
</div>
<h3>Transaction Details:</h3>
<table>
<tr><th>Parcel ID</th><td>{parcel}</td></tr>
<tr><th>Transaction Date</th><td>{date}</td></tr>
<tr><th>Sale Price</th><td>&#8377;{price}</td></tr>
<tr><th>Market Value</th><td>&#8377;{value}</td></tr>
<tr><th>Land Area</th><td>{area} sq.m</td></tr>
<tr><th>Price per sq.m</th><td>&#8377;{per_sqm}</td></tr>
<tr><th>Price to Market Ratio</th><td>{ratio:.2}</td></tr>
<tr><th>Days Since Previous</th><td>{days}</td></tr>
<tr><th>Anomaly Score</th><td>{score:.4}</td></tr>
</table>
<p><a href="/" class="back-button">Check Another Transaction</a></p>
</body>
</html>
"#,
        risk = scored.verdict.risk_level().as_str(),
        parcel = escape_html(record.parcel_id.as_str()),
        date = record.transaction_date.format("%Y-%m-%d"),
        price = grouped(record.sale_price),
        value = grouped(record.market_value),
        area = grouped(record.land_area),
        per_sqm = grouped(features.price_per_sqm),
        ratio = features.price_ratio,
        days = features.days_since_prev,
        score = scored.verdict.score,
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Two decimals with comma thousands separators.
fn grouped(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut digits = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            digits.push(',');
        }
        digits.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{digits}.{frac_part}")
}
