//! Inline SVG charts for the tuning report.

use std::fmt::Write;

use crate::pipeline::PageStats;

const WIDTH: f32 = 480.0;
const HEIGHT: f32 = 240.0;
const PAD: f32 = 32.0;
const BINS: usize = 20;

const MEDIAN_COLOR: &str = "#1f77b4";
const H2_COLOR: &str = "#ff7f0e";
const H1_COLOR: &str = "#d62728";

fn open_svg(out: &mut String, title: &str) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img"><title>{t}</title><rect width="{w}" height="{h}" fill="white"/>"#,
        w = WIDTH,
        h = HEIGHT,
        t = title
    );
    // Axes
    let _ = write!(
        out,
        r#"<line x1="{p}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/><line x1="{p}" y1="{p}" x2="{p}" y2="{b}" stroke="black"/>"#,
        p = PAD,
        b = HEIGHT - PAD,
        r = WIDTH - PAD
    );
}

fn legend(out: &mut String, entries: &[(&str, &str)]) {
    for (i, (label, color)) in entries.iter().enumerate() {
        let y = PAD + 14.0 * i as f32;
        let _ = write!(
            out,
            r#"<rect x="{x}" y="{y}" width="10" height="10" fill="{c}"/><text x="{tx}" y="{ty}" font-size="11" font-family="sans-serif">{l}</text>"#,
            x = WIDTH - PAD - 70.0,
            y = y,
            c = color,
            tx = WIDTH - PAD - 55.0,
            ty = y + 9.0,
            l = label
        );
    }
}

/// Line-height histogram with median and heading threshold markers.
pub fn line_height_histogram(stats: &PageStats, h2_factor: f32, h1_factor: f32) -> Option<String> {
    if stats.line_heights.is_empty() {
        return None;
    }

    let median = stats.median_height;
    let markers = [
        ("median", median, MEDIAN_COLOR),
        ("H2", median * h2_factor, H2_COLOR),
        ("H1", median * h1_factor, H1_COLOR),
    ];

    let min = stats.line_heights.iter().copied().fold(f32::INFINITY, f32::min).min(median);
    let max = markers
        .iter()
        .map(|(_, v, _)| *v)
        .chain(stats.line_heights.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    let span = (max - min).max(1.0);
    let bin_width = span / BINS as f32;

    let mut counts = [0usize; BINS];
    for &h in &stats.line_heights {
        let bin = (((h - min) / bin_width) as usize).min(BINS - 1);
        counts[bin] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(1).max(1);

    let plot_w = WIDTH - 2.0 * PAD;
    let plot_h = HEIGHT - 2.0 * PAD;
    let x_of = |v: f32| PAD + (v - min) / span * plot_w;

    let mut svg = String::new();
    open_svg(&mut svg, &format!("Line heights, page {}", stats.page));

    let bar_w = plot_w / BINS as f32;
    for (i, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let h = count as f32 / peak as f32 * plot_h;
        let _ = write!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="gray"/>"#,
            PAD + i as f32 * bar_w,
            HEIGHT - PAD - h,
            (bar_w - 1.0).max(1.0),
            h
        );
    }

    for (_, value, color) in markers {
        let x = x_of(value);
        let _ = write!(
            svg,
            r#"<line x1="{x:.1}" y1="{top}" x2="{x:.1}" y2="{bottom}" stroke="{color}" stroke-width="2"/>"#,
            x = x,
            top = PAD,
            bottom = HEIGHT - PAD,
            color = color
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="11" font-family="sans-serif">{:.0}px</text><text x="{}" y="{}" font-size="11" font-family="sans-serif" text-anchor="end">{:.0}px</text>"#,
        PAD,
        HEIGHT - PAD + 14.0,
        min,
        WIDTH - PAD,
        HEIGHT - PAD + 14.0,
        max
    );
    legend(&mut svg, &[("median", MEDIAN_COLOR), ("H2", H2_COLOR), ("H1", H1_COLOR)]);
    svg.push_str("</svg>");
    Some(svg)
}

/// Grouped bars of H1/H2 counts per page.
pub fn heading_counts(stats: &[PageStats]) -> Option<String> {
    if stats.is_empty() {
        return None;
    }

    let peak = stats.iter().map(|s| s.h1.max(s.h2)).max().unwrap_or(0).max(1);
    let plot_w = WIDTH - 2.0 * PAD;
    let plot_h = HEIGHT - 2.0 * PAD;
    let group_w = plot_w / stats.len() as f32;
    let bar_w = (group_w * 0.4).max(1.0);

    let mut svg = String::new();
    open_svg(&mut svg, "Headings per page");

    for (i, s) in stats.iter().enumerate() {
        let group_x = PAD + i as f32 * group_w + group_w * 0.1;
        for (j, (count, color)) in [(s.h1, H1_COLOR), (s.h2, H2_COLOR)].into_iter().enumerate() {
            let h = count as f32 / peak as f32 * plot_h;
            let _ = write!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                group_x + j as f32 * bar_w,
                HEIGHT - PAD - h,
                bar_w,
                h,
                color
            );
        }
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{}" font-size="11" font-family="sans-serif" text-anchor="middle">{}</text>"#,
            group_x + bar_w,
            HEIGHT - PAD + 14.0,
            s.page
        );
    }

    legend(&mut svg, &[("H1", H1_COLOR), ("H2", H2_COLOR)]);
    svg.push_str("</svg>");
    Some(svg)
}
