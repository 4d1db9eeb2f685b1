//! Environment tunables, read once per process.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `BARCODE_MAX_CANDIDATES` | 48 | candidates kept per pass |
//! | `BARCODE_SCAN_ROWS` | 32 | rows scanned for linear guards (x4 when trying harder) |
//! | `BARCODE_MIN_CONTRAST` | 16 | local std-dev below which a window uses the global threshold |
//! | `BARCODE_PARALLEL_MIN_CANDIDATES` | 4 | candidate count at which decoding fans out to rayon |
use std::sync::OnceLock;

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

static MAX_CANDIDATES: OnceLock<usize> = OnceLock::new();

pub(crate) fn max_candidates() -> usize {
    *MAX_CANDIDATES.get_or_init(|| parse_env_usize("BARCODE_MAX_CANDIDATES", 48).clamp(1, 1024))
}

static SCAN_ROWS: OnceLock<usize> = OnceLock::new();

pub(crate) fn scan_rows() -> usize {
    *SCAN_ROWS.get_or_init(|| parse_env_usize("BARCODE_SCAN_ROWS", 32).clamp(1, 4096))
}

static MIN_CONTRAST: OnceLock<u8> = OnceLock::new();

pub(crate) fn min_contrast() -> u8 {
    *MIN_CONTRAST.get_or_init(|| parse_env_u8("BARCODE_MIN_CONTRAST", 16))
}

static PARALLEL_MIN_CANDIDATES: OnceLock<usize> = OnceLock::new();

pub(crate) fn parallel_min_candidates() -> usize {
    *PARALLEL_MIN_CANDIDATES
        .get_or_init(|| parse_env_usize("BARCODE_PARALLEL_MIN_CANDIDATES", 4).max(1))
}
