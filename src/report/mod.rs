//! HTML tuning report: configuration, metrics, layout charts and overlays.

mod charts;
mod overlay;

pub use charts::{heading_counts, line_height_histogram};
pub use overlay::draw_overlay;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PipelineConfig;
use crate::pipeline::{RunOutput, RunSummary};
use crate::utils::escape_xml;

/// Files written for one report.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub html: PathBuf,
    pub metrics: PathBuf,
    pub overlays: Vec<PathBuf>,
}

pub fn write_report(output: &RunOutput, config: &PipelineConfig, report_dir: &Path) -> Result<ReportFiles> {
    fs::create_dir_all(report_dir)
        .with_context(|| format!("Failed to create report directory: {:?}", report_dir))?;

    let mut overlays = Vec::new();
    if config.debug_overlay {
        for page in &output.pages {
            let target = report_dir.join(format!("overlay_page_{}.png", page.image.number));
            draw_overlay(&page.image.path, &page.classified, &target)?;
            overlays.push(target);
        }
    }

    let metrics = report_dir.join("metrics.json");
    let metrics_json = serde_json::to_string_pretty(&output.summary)
        .context("Failed to serialize run metrics")?;
    fs::write(&metrics, metrics_json)
        .with_context(|| format!("Failed to write metrics: {:?}", metrics))?;

    let html = report_dir.join("report.html");
    fs::write(&html, render_html(&output.summary, config, &overlays)?)
        .with_context(|| format!("Failed to write report: {:?}", html))?;
    info!("Report saved to: {:?}", html);

    Ok(ReportFiles { html, metrics, overlays })
}

fn render_html(summary: &RunSummary, config: &PipelineConfig, overlays: &[PathBuf]) -> Result<String> {
    let config_value = serde_json::to_value(config).context("Failed to serialize config")?;
    let rows: String = config_value
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| {
                    format!(
                        "<tr><th>{}</th><td>{}</td></tr>",
                        escape_xml(key),
                        escape_xml(&value.to_string())
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let document = summary
        .document
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut charts = String::new();
    if let Some(svg) = summary
        .page_stats
        .first()
        .and_then(|s| line_height_histogram(s, config.heading_threshold_h2, config.heading_threshold_h1))
    {
        charts.push_str("<h3>Line heights</h3>");
        charts.push_str(&svg);
    }
    if let Some(svg) = heading_counts(&summary.page_stats) {
        charts.push_str("<h3>Heading counts</h3>");
        charts.push_str(&svg);
    }

    let overlay_html: String = overlays
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| {
            let name = escape_xml(&name.to_string_lossy());
            format!(r#"<h3>{0}</h3><img src="{0}" alt="{0}" style="max-width:100%">"#, name)
        })
        .collect();

    Ok(format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Tuning Report</title>
<style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse}}th,td{{border:1px solid #ccc;padding:4px 8px;text-align:left}}</style>
</head><body>
<h1>Tuning Report</h1>
<p>Generated {generated} for <code>{input}</code></p>
<h2>Results</h2>
<table>
<tr><th>Pages</th><td>{pages}</td></tr>
<tr><th>Lines</th><td>{lines}</td></tr>
<tr><th>Average confidence</th><td>{conf:.2}</td></tr>
<tr><th>Runtime</th><td>{runtime:.2}s</td></tr>
<tr><th>Document</th><td>{document}</td></tr>
</table>
<h2>Configuration</h2>
<table>{rows}</table>
{charts}
{overlays}
</body></html>
"#,
        generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        input = escape_xml(&summary.input.display().to_string()),
        pages = summary.pages,
        lines = summary.lines,
        conf = summary.avg_confidence,
        runtime = summary.runtime_secs,
        document = escape_xml(&document),
        rows = rows,
        charts = charts,
        overlays = overlay_html,
    ))
}
