use crate::diagnosis::{DiagnosisReport, RenderedResult};
use axum::response::{Html, IntoResponse};

const PAGE_STYLE: &str = r#"
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #1f2a44 0%, #0b1020 100%);
            min-height: 100vh;
            margin: 0;
            color: white;
        }
        .content {
            max-width: 720px;
            margin: 0 auto;
            padding: 40px 20px;
        }
        h1, h2, h3 {
            text-shadow: 2px 2px 5px rgba(0, 0, 0, 0.7);
        }
        .label {
            font-weight: 600;
            font-size: 16px;
        }
        .bar-container {
            background-color: rgba(255, 255, 255, 0.2);
            border-radius: 5px;
            height: 20px;
            margin-top: 5px;
            margin-bottom: 15px;
        }
        .bar {
            height: 100%;
            border-radius: 5px;
        }
        .meta {
            color: #cbd5e0;
            font-size: 0.9em;
            margin-bottom: 25px;
        }
        .preview {
            text-align: center;
            margin-bottom: 25px;
        }
        .preview img {
            max-width: 100%;
            border-radius: 8px;
        }
        .preview figcaption {
            color: #cbd5e0;
            font-size: 0.9em;
            margin-top: 5px;
        }
        .error {
            background: rgba(217, 83, 79, 0.2);
            border: 1px solid #d9534f;
            border-radius: 8px;
            padding: 15px;
        }
        a {
            color: #5bc0de;
        }
    </style>
"#;

/// 首页处理器
pub async fn index_handler() -> impl IntoResponse {
    Html(include_str!("../../templates/index.html"))
}

/// 单个标签的进度条
pub fn render_result(result: &RenderedResult) -> String {
    format!(
        r#"<div class="label">{label}: <span style="color:{color}">{display}%</span></div>
<div class="bar-container">
    <div class="bar" style="width:{width:.2}%; background-color:{color}"></div>
</div>
"#,
        label = html_escape::encode_text(result.label),
        color = result.color,
        display = result.display,
        width = result.percentage,
    )
}

/// 上传图像预览
pub fn render_preview(data_url: &str) -> String {
    format!(
        r#"<figure class="preview">
    <img src="{src}" alt="Uploaded image">
    <figcaption>Uploaded image</figcaption>
</figure>
"#,
        src = html_escape::encode_double_quoted_attribute(data_url),
    )
}

/// 诊断结果页，`preview` 为上传图像的数据URL
pub fn render_report_page(report: &DiagnosisReport, preview: Option<&str>) -> String {
    let bars: String = report.findings.iter().map(render_result).collect();
    let preview = preview.map(render_preview).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Classification results</title>
    {style}
</head>
<body>
<div class="content">
    {preview}
    <h2>Classification results</h2>
    <div class="meta">
        Image {width}x{height} &middot; top finding: {top} ({top_pct:.2}%) &middot;
        high-risk findings: {high} &middot; {time:.3}s
    </div>
    {bars}
    <p><a href="/">Analyze another image</a></p>
</div>
</body>
</html>"#,
        style = PAGE_STYLE,
        width = report.image.width,
        height = report.image.height,
        top = html_escape::encode_text(report.summary.top_label),
        top_pct = report.summary.top_percentage,
        high = report.summary.high_count,
        time = report.processing_time,
        preview = preview,
        bars = bars,
    )
}

/// 错误页
pub fn render_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Classification failed</title>
    {style}
</head>
<body>
<div class="content">
    <h2>Classification failed</h2>
    <div class="error">{message}</div>
    <p><a href="/">Try another image</a></p>
</div>
</body>
</html>"#,
        style = PAGE_STYLE,
        message = html_escape::encode_text(message),
    )
}
