//! Server-side HTML for the browser UI.
//!
//! Plain `format!` templates; every model-supplied or user-supplied string
//! goes through [`escape`] before it reaches the page.

use crate::analyze::AnalysisOutcome;
use crate::config::AnalysisConfig;
use crate::error::StageFailure;
use crate::output::{AnalysisReport, ExtractedShipmentRecord, TransportOption, REPORT_FILE_NAME, REPORT_MEDIA_TYPE};
use crate::pipeline::encode::data_uri;
use crate::pipeline::input::UploadedDocument;
use std::fmt::Write as _;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1f2a1f; }
h1 { margin-bottom: 0; }
.subtitle { margin-top: .25rem; color: #4b5e4b; }
.card { border: 1px solid #d5e2d5; border-radius: 8px; padding: 1rem 1.25rem; margin: 1rem 0; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
.metric { font-size: 1.4rem; font-weight: 600; }
.ok { background: #e8f5e9; border-color: #a5d6a7; }
.info { background: #e3f2fd; border-color: #90caf9; }
.error { background: #fdecea; border-color: #f5c2c0; }
pre { white-space: pre-wrap; word-break: break-word; background: #f6f8f6; padding: .75rem; border-radius: 6px; }
table { border-collapse: collapse; }
td, th { text-align: left; padding: .25rem .75rem .25rem 0; vertical-align: top; }
button, .button { background: #2e7d32; color: white; border: 0; border-radius: 6px; padding: .6rem 1.2rem; font-size: 1rem; text-decoration: none; cursor: pointer; }
footer { margin-top: 2rem; color: #6b7d6b; font-style: italic; }
"#;

/// Escape text for an HTML body or a double-quoted attribute.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>GreenLogisticsAI</title>
<style>{STYLE}</style>
</head>
<body>
<h1>🚚 GreenLogisticsAI</h1>
<p class="subtitle">AI-driven route optimisation for sustainable freight</p>
{body}
<footer>🌱 GreenLogisticsAI: smart, sustainable logistics</footer>
</body>
</html>
"#
    )
}

/// Upload form plus the "How it works" section.
pub fn index_page(config: &AnalysisConfig) -> String {
    let credential_field = if config.requires_credential() {
        r#"<p><label>Gemini API key<br><input type="password" name="api_key" autocomplete="off" size="48"></label></p>"#
            .to_string()
    } else {
        format!(
            r#"<p class="subtitle">Model: {}</p>"#,
            escape(config.effective_model())
        )
    };

    let body = format!(
        r#"<section class="card">
<h2>📤 Upload your shipping document</h2>
<form method="post" action="/analyze" enctype="multipart/form-data">
{credential_field}
<p><label>Choose an image or PDF<br><input type="file" name="document" accept=".png,.jpg,.jpeg,.pdf" required></label></p>
<button type="submit">🔍 Analyze with AI</button>
</form>
</section>
<section class="card">
<h2>ℹ️ How it works</h2>
<ol>
<li><strong>Upload a shipping document</strong> (invoice, packing list, CMR note…).</li>
<li><strong>The AI reads it</strong> and extracts origin and destination, weight and goods, and the shipping terms.</li>
<li><strong>Two options are compared</strong>: road transport (faster) and rail-intermodal (more sustainable).</li>
<li><strong>You get a recommendation</strong> weighing estimated cost, transit time and carbon footprint.</li>
</ol>
<h3>🔑 Requirements</h3>
<ul>
<li>A free API key from <a href="https://aistudio.google.com/apikey">Google AI Studio</a>.</li>
<li>Images (PNG, JPG) and PDFs are supported; only the first page of a PDF is read.</li>
<li>Estimates are approximate and assume routes within Europe.</li>
</ul>
</section>"#
    );
    layout(&body)
}

/// A problem detected before any model call (missing key, missing file…).
pub fn error_page(message: &str) -> String {
    layout(&format!(
        r#"<div class="card error">{}</div>
<p><a href="/">← Back</a></p>"#,
        escape(message)
    ))
}

/// Results for one finished request, whatever its outcome.
pub fn result_page(doc: &UploadedDocument, outcome: &AnalysisOutcome) -> String {
    let mut body = String::new();
    body.push_str(&preview(doc));

    match outcome {
        AnalysisOutcome::ExtractionFailed(failure) => {
            body.push_str(&failure_block(failure));
        }
        AnalysisOutcome::RecommendationFailed { extracted, failure } => {
            body.push_str(&extracted_block(extracted));
            body.push_str(&failure_block(failure));
        }
        AnalysisOutcome::Done(report) => {
            body.push_str(&extracted_block(&report.extracted));
            body.push_str(&comparison_block(report));
        }
    }

    body.push_str(r#"<p><a href="/">← Analyze another document</a></p>"#);
    layout(&body)
}

fn preview(doc: &UploadedDocument) -> String {
    if doc.is_image() {
        match doc.preview_media_type() {
            Some(media_type) => format!(
                r#"<section class="card"><img src="{}" alt="Document preview" width="300"></section>"#,
                data_uri(media_type, &doc.bytes)
            ),
            None => format!(
                r#"<section class="card info">🖼️ Image uploaded: {}</section>"#,
                escape(&doc.name)
            ),
        }
    } else {
        format!(
            r#"<section class="card info">📄 PDF uploaded: {}</section>"#,
            escape(&doc.name)
        )
    }
}

fn extracted_block(record: &ExtractedShipmentRecord) -> String {
    let mut rows = String::new();
    for f in &record.fields {
        let _ = write!(
            rows,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape(&f.label),
            escape(&f.value)
        );
    }
    format!(
        r#"<section class="card ok">✅ Data extracted successfully</section>
<details class="card" open><summary>📋 Data extracted by the AI</summary>
<table>{rows}</table>
</details>"#
    )
}

fn failure_block(failure: &StageFailure) -> String {
    format!(
        r#"<section class="card error">{}</section>
<pre>{}</pre>"#,
        escape(&failure.to_string()),
        escape(&failure.raw)
    )
}

fn option_panel(title: &str, option: &TransportOption) -> String {
    let list = |items: &[String]| {
        items
            .iter()
            .map(|i| format!("<li>{}</li>", escape(i)))
            .collect::<String>()
    };
    format!(
        r#"<div class="card">
<h3>{title}</h3>
<p>Cost<br><span class="metric">€{}</span></p>
<p>Time<br><span class="metric">{} h</span></p>
<p>CO₂<br><span class="metric">{} kg</span></p>
<p><strong>Advantages:</strong></p><ul>{}</ul>
<p><strong>Disadvantages:</strong></p><ul>{}</ul>
</div>"#,
        escape(&option.cost_eur),
        escape(&option.transit_hours),
        escape(&option.co2_kg),
        list(&option.advantages),
        list(&option.disadvantages),
    )
}

fn comparison_block(report: &AnalysisReport) -> String {
    let cmp = &report.comparison;
    let download = match report.report.to_pretty_json() {
        Ok(json) => format!(
            r#"<p><a class="button" href="{}" download="{REPORT_FILE_NAME}">📥 Download full report (JSON)</a></p>"#,
            data_uri(REPORT_MEDIA_TYPE, json.as_bytes())
        ),
        Err(e) => format!(r#"<section class="card error">{}</section>"#, escape(&e.to_string())),
    };

    format!(
        r#"<h2>📊 Route comparison</h2>
<div class="columns">
{}
{}
</div>
<section class="card info"><strong>💡 AI recommendation:</strong> {}</section>
{download}"#,
        option_panel("🚛 Road", &cmp.ground),
        option_panel("🚂 Intermodal", &cmp.intermodal),
        escape(&cmp.recommendation),
    )
}
