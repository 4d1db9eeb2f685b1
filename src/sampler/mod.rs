//! Sampling grid extraction
//!
//! Turns a located [`Candidate`] into what its decoder consumes: a square
//! module grid for matrix symbols, run lengths for linear ones.

/// Perspective module sampling for matrix candidates
pub mod grid;
/// Run-length sampling along a scan line
pub mod line;

pub use grid::GridSampler;
pub use line::sample_line;

use crate::error::Result;
use crate::models::{BitMatrix, Candidate, CandidateGeometry};

/// Sampled modules of one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Sampled {
    /// Module grids to try in order (parallelogram fit, then alignment fit)
    Grids(Vec<BitMatrix>),
    /// Bar and space widths in pixels, starting with a bar
    Runs(Vec<u32>),
}

/// Sample `candidate` from `matrix`. With `refine` a matrix candidate also
/// gets a grid fitted to its alignment pattern.
pub fn sample(matrix: &BitMatrix, candidate: &Candidate, refine: bool) -> Result<Sampled> {
    match candidate.geometry {
        CandidateGeometry::Matrix {
            top_left,
            top_right,
            bottom_left,
            dimension,
        } => {
            let sampler = GridSampler::new(
                matrix,
                top_left,
                top_right,
                bottom_left,
                dimension,
                candidate.module_size,
            )?;
            let fitted = sampler.sample();
            let refined = if refine {
                sampler.refined().filter(|g| *g != fitted)
            } else {
                None
            };
            Ok(Sampled::Grids(std::iter::once(fitted).chain(refined).collect()))
        }
        CandidateGeometry::Line { start, end } => sample_line(matrix, start, end).map(Sampled::Runs),
    }
}
