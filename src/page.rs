//! Server-side rendering of the upload form.

use std::fmt::Write;

use crate::controller::ViewState;
use crate::model::PredictionResult;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f3f7f2; margin: 0; }
.container { max-width: 520px; margin: 3rem auto; padding: 2rem; background: #fff; border-radius: 16px; box-shadow: 0 8px 24px rgba(0,0,0,.08); }
h1 { margin: 0; color: #2f6b2f; }
.subtitle { color: #667; margin-top: .25rem; }
.upload-area { border: 2px dashed #9cbf9c; border-radius: 12px; min-height: 220px; display: flex; align-items: center; justify-content: center; cursor: pointer; overflow: hidden; }
.upload-area.dragging { background: #eef6ee; }
.image-container { position: relative; width: 100%; }
.image-container img { display: block; width: 100%; }
.scanner-line { position: absolute; left: 0; right: 0; height: 3px; background: #4caf50; animation: scan 1.5s linear infinite; }
@keyframes scan { from { top: 0; } to { top: 100%; } }
.upload-placeholder { display: flex; flex-direction: column; align-items: center; gap: .5rem; color: #6a8f6a; }
.button-group { display: flex; gap: .75rem; margin: 1rem 0; }
.button-group form { flex: 1; }
button { width: 100%; padding: .75rem; border: 0; border-radius: 8px; font-size: 1rem; cursor: pointer; }
button:disabled { opacity: .5; cursor: not-allowed; }
.btn-upload { background: #e3ece3; }
.btn-predict { background: #2f6b2f; color: #fff; }
.btn-clear { background: none; color: #667; text-decoration: underline; }
.error { background: #fdecea; color: #8a1f11; padding: .75rem 1rem; border-radius: 8px; display: flex; justify-content: space-between; align-items: center; }
.error button { width: auto; background: none; }
.result-card { border: 1px solid #e3ece3; border-radius: 12px; padding: 1rem; }
.label { color: #667; font-size: .85rem; text-transform: uppercase; }
.disease-name { font-size: 1.4rem; font-weight: 600; margin: .5rem 0; }
.confidence-bar { height: 10px; background: #e3ece3; border-radius: 5px; overflow: hidden; }
.confidence-fill { height: 100%; background: #4caf50; }
.confidence-text { text-align: right; color: #667; margin-top: .25rem; }
.skeleton { background: #e3ece3; border-radius: 6px; margin: .5rem 0; }
.skeleton-title { height: 1.4rem; width: 60%; }
.skeleton-bar { height: 10px; }
.skeleton-text { height: .9rem; width: 40%; margin-left: auto; }
"#;

// Clicking the area opens the file picker; dropping an image submits it.
const SCRIPT: &str = r#"
const area = document.getElementById('upload-area');
const form = document.getElementById('select-form');
const input = document.getElementById('file-input');
document.querySelectorAll('[data-browse]').forEach(el => el.addEventListener('click', e => { e.preventDefault(); input.click(); }));
input.addEventListener('change', () => { if (input.files.length) form.submit(); });
area.addEventListener('dragover', e => { e.preventDefault(); area.classList.add('dragging'); });
area.addEventListener('dragleave', () => area.classList.remove('dragging'));
area.addEventListener('drop', e => {
  e.preventDefault();
  area.classList.remove('dragging');
  const file = e.dataTransfer.files[0];
  if (file && file.type.startsWith('image/')) {
    const dt = new DataTransfer();
    dt.items.add(file);
    input.files = dt.files;
    form.submit();
  }
});
"#;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(view: &ViewState) -> String {
    let mut html = String::new();
    let refresh = if view.loading {
        r#"<meta http-equiv="refresh" content="1">"#
    } else {
        ""
    };

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}
<title>PlantCare AI</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<h1>PlantCare AI</h1>
<p class="subtitle">Upload a photo to identify plant diseases</p>
"#
    );

    if let Some(error) = &view.error {
        let _ = write!(
            html,
            r#"<div class="error" role="alert"><span>{}</span><form method="post" action="/dismiss"><button type="submit">Dismiss</button></form></div>
"#,
            escape_html(error)
        );
    }

    html.push_str(r#"<div class="upload-area" id="upload-area" data-browse>"#);
    match &view.selection {
        Some(selection) => {
            let _ = write!(
                html,
                r#"<div class="image-container"><img src="{}" id="preview" alt="Preview of {}">{}</div>"#,
                selection.preview_url,
                escape_html(&selection.file_name),
                if view.loading {
                    r#"<div class="scanner-line"></div>"#
                } else {
                    ""
                }
            );
        }
        None => html.push_str(
            r#"<div class="upload-placeholder"><span style="font-size: 2.5rem">&#127807;</span><span>Upload target image</span></div>"#,
        ),
    }
    html.push_str("</div>\n");

    let predict_disabled = if view.selection.is_none() || view.loading {
        " disabled"
    } else {
        ""
    };
    let _ = write!(
        html,
        r#"<div class="button-group">
<form id="select-form" method="post" action="/select" enctype="multipart/form-data">
<input type="file" id="file-input" name="file" accept="image/*" style="display: none">
<button type="button" class="btn-upload" data-browse>Select Image</button>
</form>
<form method="post" action="/analyze">
<button type="submit" class="btn-predict"{predict_disabled}>{}</button>
</form>
</div>
"#,
        if view.loading { "Analyzing..." } else { "Predict" }
    );

    if view.selection.is_some() {
        html.push_str(
            r#"<form method="post" action="/clear"><button type="submit" class="btn-clear">Clear</button></form>
"#,
        );
    }

    if view.loading {
        html.push_str(
            r#"<div class="results"><div class="result-card">
<div class="label">Analyzing image...</div>
<div class="skeleton skeleton-title"></div>
<div class="skeleton skeleton-bar"></div>
<div class="skeleton skeleton-text"></div>
</div></div>
"#,
        );
    } else if let Some(result) = &view.result {
        html.push_str(&render_result(result));
    }

    let _ = write!(html, "</div>\n<script>{SCRIPT}</script>\n</body>\n</html>\n");
    html
}

fn render_result(result: &PredictionResult) -> String {
    format!(
        r#"<div class="results"><div class="result-card">
<div class="label">Identification Result</div>
<div class="disease-name">{}</div>
<div class="confidence-bar"><div class="confidence-fill" style="width: {}%"></div></div>
<div class="confidence-text">{}</div>
</div></div>
"#,
        escape_html(&result.display_label()),
        result.bar_width(),
        escape_html(&result.confidence_text())
    )
}
