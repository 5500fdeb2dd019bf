/*!
 * HTML report rendering.
 *
 * Produces a single self-contained HTML page for a `VideoSummary`. Every
 * piece of model output is escaped before it is placed in the page.
 */

use chrono::NaiveDateTime;
use html_escape::{encode_double_quoted_attribute, encode_text};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::RenderError;
use crate::summarizer::VideoSummary;
use crate::video::VideoReference;

const STYLE: &str = r#"
        :root {
            --primary-color: #FB7299;
            --secondary-color: #23ADE5;
            --background-color: #f6f7f8;
            --card-background: #ffffff;
            --text-color: #18191c;
            --text-secondary: #61666d;
            --border-radius: 12px;
            --shadow: 0 5px 20px rgba(0, 0, 0, 0.05);
        }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: "PingFang SC", "Microsoft YaHei", sans-serif;
            background-color: var(--background-color);
            color: var(--text-color);
            line-height: 1.6;
            padding: 20px;
        }
        .container { max-width: 800px; margin: 0 auto; }
        header { text-align: center; margin-bottom: 30px; padding-top: 20px; }
        .logo { font-size: 24px; font-weight: bold; color: var(--primary-color); margin-bottom: 10px; }
        h1 { font-size: 28px; margin-bottom: 10px; line-height: 1.4; }
        .video-info { color: var(--text-secondary); font-size: 14px; margin-bottom: 10px; }
        .video-info a { color: var(--secondary-color); text-decoration: none; margin-left: 5px; }
        .card {
            background-color: var(--card-background);
            border-radius: var(--border-radius);
            box-shadow: var(--shadow);
            padding: 24px;
            margin-bottom: 24px;
        }
        .card-title { font-size: 18px; margin-bottom: 16px; border-left: 4px solid var(--primary-color); padding-left: 10px; }
        .core-content { font-size: 16px; line-height: 1.8; }
        .key-points-list { list-style: none; margin-top: 12px; }
        .key-points-list li { margin-bottom: 12px; display: flex; align-items: flex-start; }
        .point-number {
            display: inline-flex;
            align-items: center;
            justify-content: center;
            width: 24px;
            height: 24px;
            background-color: var(--primary-color);
            color: white;
            border-radius: 50%;
            font-size: 14px;
            margin-right: 10px;
            flex-shrink: 0;
        }
        .point-content { flex: 1; }
        .summary-text p { line-height: 1.8; text-align: justify; margin-bottom: 12px; }
        .conclusion {
            font-size: 16px;
            line-height: 1.8;
            padding: 16px;
            background-color: rgba(251, 114, 153, 0.05);
            border-left: 4px solid var(--primary-color);
        }
        footer { text-align: center; margin-top: 50px; color: var(--text-secondary); font-size: 14px; }
        @media (max-width: 768px) {
            body { padding: 16px; }
            h1 { font-size: 22px; }
            .card { padding: 16px; }
        }
"#;

// @struct: HTML report writer
pub struct HtmlReport;

impl HtmlReport {
    /// Render the report page
    pub fn render(summary: &VideoSummary, video: &VideoReference, generated_at: NaiveDateTime) -> String {
        let title = if summary.title.trim().is_empty() { "Video summary" } else { summary.title.as_str() };

        let key_points: String = summary
            .key_points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                format!(
                    "                    <li><span class=\"point-number\">{}</span><span class=\"point-content\">{}</span></li>\n",
                    i + 1,
                    encode_text(point)
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Bilibili Video Summary</title>
    <style>{style}    </style>
</head>
<body>
    <div class="container">
        <header>
            <div class="logo">Bilibili Video Summary</div>
            <h1>{title}</h1>
            <div class="video-info">
                Video:<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>
            </div>
        </header>

        <main>
            <section class="card">
                <h2 class="card-title">Core point</h2>
                <div class="core-content">{core_point}</div>
            </section>

            <section class="card">
                <h2 class="card-title">Key points</h2>
                <ul class="key-points-list">
{key_points}                </ul>
            </section>

            <section class="card">
                <h2 class="card-title">Detailed summary</h2>
                <div class="summary-text">
{paragraphs}                </div>
            </section>

            <section class="card">
                <h2 class="card-title">Conclusion</h2>
                <div class="conclusion">{conclusion}</div>
            </section>
        </main>

        <footer>
            Generated by subdigest - {generated_at}
        </footer>
    </div>
</body>
</html>
"#,
            title = encode_text(title),
            style = STYLE,
            href = encode_double_quoted_attribute(&Self::safe_href(&video.url)),
            label = encode_text(&video.display_label()),
            core_point = encode_text(&summary.core_point),
            key_points = key_points,
            paragraphs = Self::paragraphs(&summary.detailed_summary),
            conclusion = encode_text(&summary.conclusion),
            generated_at = generated_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }

    /// Report file name for a video
    pub fn file_name(video: &VideoReference, generated_at: NaiveDateTime) -> String {
        match &video.id {
            Some(id) => {
                let safe: String = id
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                    .collect();
                format!("summary_{}.html", safe)
            }
            None => format!("summary_{}.html", generated_at.format("%Y%m%d%H%M%S")),
        }
    }

    /// Render the report and write it into `output_dir`, returning the file path
    pub fn write<P: AsRef<Path>>(
        output_dir: P,
        summary: &VideoSummary,
        video: &VideoReference,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf, RenderError> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).map_err(|source| RenderError::Write {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let path = output_dir.join(Self::file_name(video, generated_at));
        let html = Self::render(summary, video, generated_at);
        fs::write(&path, html).map_err(|source| RenderError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Report written to {}", path.display());
        Ok(path)
    }

    fn paragraphs(text: &str) -> String {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| format!("                    <p>{}</p>\n", encode_text(line)))
            .collect()
    }

    // Only web links become clickable
    fn safe_href(url: &str) -> String {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            url.to_string()
        } else {
            "#".to_string()
        }
    }
}
