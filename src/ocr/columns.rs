//! Reading order for multi-column pages.
//!
//! Lines are clustered on their horizontal midpoint with a one-dimensional
//! k-means, then emitted column by column, left to right, each column top to
//! bottom.

use super::OcrLine;

const MAX_ITERATIONS: usize = 50;

/// Centroids closer than this fraction of the page width are one column.
const MIN_COLUMN_SEPARATION: f32 = 0.2;

pub fn sort_columns(lines: Vec<OcrLine>, page_width: f32, max_columns: usize) -> Vec<OcrLine> {
    if lines.len() < 2 {
        return lines;
    }

    let midpoints: Vec<f32> = lines.iter().map(|l| l.bbox.center_x()).collect();
    let k = max_columns.clamp(1, lines.len());
    let centroids = merge_close(kmeans_1d(&midpoints, k), page_width * MIN_COLUMN_SEPARATION);

    let mut labeled: Vec<(usize, OcrLine)> = lines
        .into_iter()
        .zip(&midpoints)
        .map(|(line, &x)| (nearest(&centroids, x), line))
        .collect();

    // Stable sort keeps the engine's order for lines on the same baseline.
    labeled.sort_by(|(ca, a), (cb, b)| {
        ca.cmp(cb)
            .then(a.bbox.top.partial_cmp(&b.bbox.top).unwrap_or(std::cmp::Ordering::Equal))
    });
    labeled.into_iter().map(|(_, line)| line).collect()
}

/// Lloyd's algorithm seeded at evenly spaced quantiles; returns sorted centroids.
fn kmeans_1d(values: &[f32], k: usize) -> Vec<f32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mut centroids: Vec<f32> = (0..k)
        .map(|i| sorted[((2 * i + 1) * n / (2 * k)).min(n - 1)])
        .collect();

    for _ in 0..MAX_ITERATIONS {
        let mut sums = vec![0.0f32; k];
        let mut counts = vec![0usize; k];
        for &v in values {
            let c = nearest(&centroids, v);
            sums[c] += v;
            counts[c] += 1;
        }

        let updated: Vec<f32> = centroids
            .iter()
            .enumerate()
            .map(|(i, &old)| if counts[i] == 0 { old } else { sums[i] / counts[i] as f32 })
            .collect();

        let converged = updated
            .iter()
            .zip(&centroids)
            .all(|(a, b)| (a - b).abs() < 1e-3);
        centroids = updated;
        if converged {
            break;
        }
    }

    centroids.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    centroids.dedup_by(|a, b| (*a - *b).abs() < f32::EPSILON);
    centroids
}

fn merge_close(centroids: Vec<f32>, min_separation: f32) -> Vec<f32> {
    let mut merged: Vec<f32> = Vec::with_capacity(centroids.len());
    for c in centroids {
        let close = merged.last().is_some_and(|last| c - last < min_separation);
        if close {
            if let Some(last) = merged.last_mut() {
                *last = (*last + c) / 2.0;
            }
        } else {
            merged.push(c);
        }
    }
    merged
}

fn nearest(centroids: &[f32], value: f32) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (value - **a)
                .abs()
                .partial_cmp(&(value - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
