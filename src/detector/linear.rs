//! Start-guard scanning for linear symbols.
//!
//! A set of evenly spaced rows is split into runs. Wherever a family's
//! start guard follows a wide enough light run, the line is followed until
//! the next light run of six modules or more. Hits from neighbouring rows
//! that start at the same place are clustered into one candidate.

use crate::decoder::oned::{LinearReader, readers_for};
use crate::models::{BitMatrix, Candidate, CandidateGeometry, Point, Symbology, SymbologySet};

/// A light run this many modules wide ends the symbol.
const TRAILING_QUIET_MODULES: f32 = 6.0;
/// Rows further apart than this many scan steps do not cluster.
const CLUSTER_ROW_GAP: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    len: u32,
    dark: bool,
}

#[derive(Debug, Clone, Copy)]
struct GuardHit {
    symbology: Symbology,
    row_index: usize,
    y: usize,
    x_start: usize,
    x_end: usize,
    module: f32,
}

fn row_runs(matrix: &BitMatrix, y: usize) -> Vec<Run> {
    let width = matrix.width();
    let mut runs = Vec::new();
    if width == 0 {
        return runs;
    }
    let mut start = 0;
    let mut dark = matrix.get(0, y);
    for x in 1..=width {
        let color = if x < width { matrix.get(x, y) } else { !dark };
        if color != dark {
            runs.push(Run {
                start,
                len: (x - start) as u32,
                dark,
            });
            start = x;
            dark = color;
        }
    }
    runs
}

/// Rows sampled for a scan of `count` lines.
pub fn scan_row_positions(height: usize, count: usize) -> Vec<usize> {
    if height == 0 {
        return Vec::new();
    }
    let count = count.clamp(1, height);
    let mut rows: Vec<usize> = (0..count)
        .map(|i| (((i as f32 + 0.5) * height as f32 / count as f32) as usize).min(height - 1))
        .collect();
    rows.dedup();
    rows
}

fn scan_row(
    runs: &[Run],
    lens: &[u32],
    readers: &[(&'static dyn LinearReader, Symbology)],
    row_index: usize,
    y: usize,
    hits: &mut Vec<GuardHit>,
) {
    for i in 0..runs.len() {
        if !runs[i].dark {
            continue;
        }
        let preceding = if i == 0 { None } else { Some(lens[i - 1]) };
        for &(reader, symbology) in readers {
            let Some(module) = reader.match_start(&lens[i..]) else {
                continue;
            };
            let quiet_ok = match preceding {
                Some(light) => light as f32 >= reader.quiet_zone() * module,
                None => reader.allows_row_start(),
            };
            if !quiet_ok {
                continue;
            }

            let last = symbol_end(runs, i, module);
            hits.push(GuardHit {
                symbology,
                row_index,
                y,
                x_start: runs[i].start,
                x_end: runs[last].start + runs[last].len as usize,
                module,
            });
        }
    }
}

/// Index of the last dark run before the trailing quiet zone.
fn symbol_end(runs: &[Run], first: usize, module: f32) -> usize {
    let threshold = TRAILING_QUIET_MODULES * module;
    let mut last = first;
    for (j, run) in runs.iter().enumerate().skip(first + 1) {
        if run.dark {
            last = j;
        } else if run.len as f32 >= threshold {
            break;
        }
    }
    last
}

/// Scan `row_count` rows of `matrix` for start guards of the linear
/// symbologies in `formats`.
pub fn scan_linear(
    matrix: &BitMatrix,
    formats: SymbologySet,
    row_count: usize,
    try_harder: bool,
) -> Vec<Candidate> {
    let readers: Vec<(&'static dyn LinearReader, Symbology)> = readers_for(formats)
        .into_iter()
        .filter_map(|r| r.candidate_symbology(formats).map(|s| (r, s)))
        .collect();
    if readers.is_empty() || matrix.width() == 0 {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for (row_index, y) in scan_row_positions(matrix.height(), row_count)
        .into_iter()
        .enumerate()
    {
        let runs = row_runs(matrix, y);
        if runs.len() < 8 {
            continue;
        }
        let lens: Vec<u32> = runs.iter().map(|r| r.len).collect();
        scan_row(&runs, &lens, &readers, row_index, y, &mut hits);
    }

    cluster_hits(&hits)
        .into_iter()
        .flat_map(|cluster| representatives(&cluster, try_harder))
        .collect()
}

fn cluster_hits(hits: &[GuardHit]) -> Vec<Vec<GuardHit>> {
    let mut clusters: Vec<Vec<GuardHit>> = Vec::new();
    for hit in hits {
        let tolerance = (3.0 * hit.module).max(4.0);
        let found = clusters.iter_mut().find(|cluster| {
            let Some(last) = cluster.last() else {
                return false;
            };
            last.symbology == hit.symbology
                && hit.row_index - last.row_index <= CLUSTER_ROW_GAP
                && (last.x_start as f32 - hit.x_start as f32).abs() <= tolerance
        });
        match found {
            Some(cluster) => cluster.push(*hit),
            None => clusters.push(vec![*hit]),
        }
    }
    clusters
}

/// The median row of a cluster; quartile rows too when trying harder.
fn representatives(cluster: &[GuardHit], try_harder: bool) -> Vec<Candidate> {
    let n = cluster.len();
    let mut picks = vec![n / 2];
    if try_harder {
        for idx in [n / 4, (3 * n) / 4] {
            if idx < n && !picks.contains(&idx) {
                picks.push(idx);
            }
        }
    }

    picks
        .into_iter()
        .map(|idx| {
            let hit = cluster[idx];
            let y = hit.y as f32 + 0.5;
            Candidate {
                symbology: hit.symbology,
                geometry: CandidateGeometry::Line {
                    start: Point::new(hit.x_start as f32, y),
                    end: Point::new(hit.x_end as f32, y),
                },
                module_size: hit.module,
                scan_index: 0,
            }
        })
        .collect()
}
