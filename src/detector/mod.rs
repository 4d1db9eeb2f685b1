//! Pattern location
//!
//! This module finds where symbols may be in a binary bitmap:
//! - QR finder patterns (1:1:3:1:1 runs, cross-checked)
//! - Grouping of finders into ordered triples
//! - Start guards of the linear symbologies along scan rows

/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Finder triples: ordering, dimension estimate, scoring
pub mod grouping;
/// Linear start-guard scanning and row clustering
pub mod linear;
/// Candidate assembly, dedupe and scan ordering
pub mod locator;

pub use locator::{LocatorSettings, locate};
