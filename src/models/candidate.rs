use super::{Point, Symbology};

/// Where a candidate sits in the bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CandidateGeometry {
    /// A matrix symbol located by its three finder patterns.
    Matrix {
        /// Center of the top-left finder pattern
        top_left: Point,
        /// Center of the top-right finder pattern
        top_right: Point,
        /// Center of the bottom-left finder pattern
        bottom_left: Point,
        /// Estimated side length in modules
        dimension: usize,
    },
    /// A linear symbol crossed by one scan line, from its first bar to the
    /// start of the trailing quiet zone.
    Line {
        /// First dark pixel of the start guard
        start: Point,
        /// End of the symbol along the scan line
        end: Point,
    },
}

/// A region that may hold a symbol, proposed by the pattern locator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Symbology whose guard or finder pattern fired
    pub symbology: Symbology,
    /// Bounding geometry
    pub geometry: CandidateGeometry,
    /// Estimated module (narrow bar) size in pixels
    pub module_size: f32,
    /// Position in the locator's scan order, within one pass
    pub scan_index: usize,
}

impl Candidate {
    /// Point used to order candidates top-to-bottom, left-to-right.
    pub fn anchor(&self) -> Point {
        match self.geometry {
            CandidateGeometry::Matrix {
                top_left,
                top_right,
                bottom_left,
                ..
            } => Point::new(
                top_left.x.min(top_right.x).min(bottom_left.x),
                top_left.y.min(top_right.y).min(bottom_left.y),
            ),
            CandidateGeometry::Line { start, .. } => start,
        }
    }

    /// Approximate center of the symbol.
    pub fn center(&self) -> Point {
        match self.geometry {
            CandidateGeometry::Matrix {
                top_right,
                bottom_left,
                ..
            } => top_right.midpoint(&bottom_left),
            CandidateGeometry::Line { start, end } => start.midpoint(&end),
        }
    }
}
