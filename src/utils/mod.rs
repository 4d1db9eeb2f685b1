//! Utility functions for image processing
//!
//! This module provides helper functions shared by the locator and samplers:
//! - Binarization (adaptive block mean, Otsu and fixed threshold)
//! - Geometry (perspective transforms)

pub mod binarization;
pub mod geometry;
