//! Decode orchestration: passes, candidates, first success in scan order.
//!
//! A pass is one rotation of the luminance grid paired with one threshold
//! strategy. Passes run in sweep order (adaptive threshold first, then the
//! global Otsu threshold when trying harder); inside a pass candidates are
//! tried in the locator's scan order. Parallel decoding uses
//! `find_map_first`, so it returns exactly what the sequential loop would.

use std::borrow::Cow;

use rayon::prelude::*;
use tracing::debug;

use crate::config;
use crate::decoder::decode_sampled;
use crate::detector::{LocatorSettings, locate};
use crate::error::DecodeError;
use crate::models::{
    Barcode, BitMatrix, Candidate, CandidateGeometry, DecodeResult, LuminanceGrid, Symbology,
    SymbologySet,
};
use crate::sampler::{self, Sampled};
use crate::utils::binarization::{adaptive_binarize, otsu_binarize};

/// Rotation sweep used when none is configured.
pub const DEFAULT_ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// Linear scan rows are multiplied by this when trying harder.
const TRY_HARDER_ROW_FACTOR: usize = 4;

/// Per-call decode configuration.
///
/// `Default` is the performance mode: all linear symbologies, one upright
/// pass, no extra thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Allowed symbologies; empty means every linear symbology
    pub formats: SymbologySet,
    /// Extra threshold pass, rotation sweep, relaxed QR checks
    pub try_harder: bool,
    /// Rotation sweep without the other try-harder passes
    pub auto_rotate: bool,
    /// Sweep angles in degrees (clockwise), used when rotating
    pub rotations: Vec<u16>,
    /// Decode candidates on the rayon pool
    pub parallel: bool,
    /// Keep the input image on the reader result
    pub retain_image: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            formats: SymbologySet::empty(),
            try_harder: false,
            auto_rotate: false,
            rotations: DEFAULT_ROTATIONS.to_vec(),
            parallel: true,
            retain_image: false,
        }
    }
}

impl DecodeOptions {
    /// Every symbology, try-harder and rotation sweep on.
    pub fn thorough() -> Self {
        Self {
            formats: SymbologySet::all(),
            try_harder: true,
            auto_rotate: true,
            ..Self::default()
        }
    }

    /// Replace the allow-list.
    pub fn with_formats(mut self, formats: SymbologySet) -> Self {
        self.formats = formats;
        self
    }

    /// Add one symbology to the allow-list.
    pub fn with_format(mut self, symbology: Symbology) -> Self {
        self.formats.insert(symbology);
        self
    }

    /// Toggle try-harder.
    pub fn with_try_harder(mut self, try_harder: bool) -> Self {
        self.try_harder = try_harder;
        self
    }

    /// Toggle the rotation sweep.
    pub fn with_auto_rotate(mut self, auto_rotate: bool) -> Self {
        self.auto_rotate = auto_rotate;
        self
    }

    /// Replace the sweep angles.
    pub fn with_rotations(mut self, rotations: impl Into<Vec<u16>>) -> Self {
        self.rotations = rotations.into();
        self
    }

    /// Toggle parallel candidate decoding.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Toggle keeping the input image on results.
    pub fn with_retain_image(mut self, retain_image: bool) -> Self {
        self.retain_image = retain_image;
        self
    }

    /// The allow-list with the empty default applied.
    pub fn effective_formats(&self) -> SymbologySet {
        self.formats.or_default()
    }

    /// Angles swept, in order, without duplicates. Upright only unless
    /// try-harder or auto-rotate is on.
    pub fn sweep(&self) -> Vec<u16> {
        if !(self.try_harder || self.auto_rotate) {
            return vec![0];
        }
        let mut angles: Vec<u16> = Vec::with_capacity(self.rotations.len());
        for angle in self.rotations.iter().map(|a| a % 360) {
            if !angles.contains(&angle) {
                angles.push(angle);
            }
        }
        if angles.is_empty() {
            angles.push(0);
        }
        angles
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Threshold {
    Adaptive,
    Otsu,
}

/// Decode the first readable symbol in `grid`.
pub fn decode(grid: &LuminanceGrid, options: &DecodeOptions) -> DecodeResult {
    if grid.width() == 0 || grid.height() == 0 {
        return DecodeResult::Error(DecodeError::invalid_input(format!(
            "image has no pixels ({}x{})",
            grid.width(),
            grid.height()
        )));
    }

    let formats = options.effective_formats();
    let settings = LocatorSettings {
        formats,
        scan_rows: if options.try_harder {
            config::scan_rows() * TRY_HARDER_ROW_FACTOR
        } else {
            config::scan_rows()
        },
        max_candidates: config::max_candidates(),
        try_harder: options.try_harder,
    };
    let thresholds: &[Threshold] = if options.try_harder {
        &[Threshold::Adaptive, Threshold::Otsu]
    } else {
        &[Threshold::Adaptive]
    };

    for angle in options.sweep() {
        let rotated: Cow<'_, LuminanceGrid> = if angle == 0 {
            Cow::Borrowed(grid)
        } else {
            Cow::Owned(grid.rotated(angle))
        };

        for &threshold in thresholds {
            let binary = match threshold {
                Threshold::Adaptive => adaptive_binarize(&rotated, config::min_contrast()),
                Threshold::Otsu => otsu_binarize(&rotated),
            };
            let candidates = locate(&binary, &settings);
            debug!(
                angle,
                ?threshold,
                candidates = candidates.len(),
                "decode pass"
            );

            if let Some(barcode) = decode_candidates(&binary, &candidates, formats, options) {
                debug!(angle, ?threshold, symbology = %barcode.symbology, "symbol decoded");
                return DecodeResult::Found(barcode);
            }
        }
    }

    DecodeResult::NotFound
}

fn decode_candidates(
    binary: &BitMatrix,
    candidates: &[Candidate],
    formats: SymbologySet,
    options: &DecodeOptions,
) -> Option<Barcode> {
    let attempt = |candidate: &Candidate| decode_candidate(binary, candidate, formats, options.try_harder);
    if options.parallel && candidates.len() >= config::parallel_min_candidates() {
        candidates.par_iter().find_map_first(attempt)
    } else {
        candidates.iter().find_map(attempt)
    }
}

fn decode_candidate(
    binary: &BitMatrix,
    candidate: &Candidate,
    formats: SymbologySet,
    try_harder: bool,
) -> Option<Barcode> {
    variants(candidate, try_harder)
        .into_iter()
        .find_map(|variant| match sampler::sample(binary, &variant, try_harder) {
            Ok(sampled) => decode_sampled(&variant, &sampled, formats, try_harder),
            Err(err) => {
                debug!(index = variant.scan_index, symbology = %variant.symbology, error = %err, "candidate skipped");
                None
            }
        })
}

/// The candidate itself, and in try-harder the neighbouring QR sizes in
/// case the finder distance estimate was off by one version.
fn variants(candidate: &Candidate, try_harder: bool) -> Vec<Candidate> {
    let mut out = vec![*candidate];
    if let (true, CandidateGeometry::Matrix { dimension, .. }) = (try_harder, candidate.geometry) {
        for other in [dimension.checked_sub(4), Some(dimension + 4)]
            .into_iter()
            .flatten()
            .filter(|d| (21..=177).contains(d))
        {
            let mut variant = *candidate;
            if let CandidateGeometry::Matrix { dimension, .. } = &mut variant.geometry {
                *dimension = other;
            }
            out.push(variant);
        }
    }
    out
}

/// Sampled modules and decoded text of every candidate in one upright,
/// adaptive pass. Used by the CLI's diagnostics.
pub fn inspect(grid: &LuminanceGrid, options: &DecodeOptions) -> Vec<(Candidate, Option<Barcode>)> {
    let formats = options.effective_formats();
    let binary = adaptive_binarize(grid, config::min_contrast());
    let settings = LocatorSettings {
        formats,
        scan_rows: config::scan_rows(),
        max_candidates: config::max_candidates(),
        try_harder: options.try_harder,
    };
    locate(&binary, &settings)
        .into_iter()
        .map(|candidate| {
            let decoded = sampler::sample(&binary, &candidate, options.try_harder)
                .ok()
                .and_then(|sampled: Sampled| decode_sampled(&candidate, &sampled, formats, options.try_harder));
            (candidate, decoded)
        })
        .collect()
}
