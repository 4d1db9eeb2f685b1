use rust_barcode::LuminanceGrid;

#[allow(dead_code)]
/// Deterministic mid-gray texture so thresholds have something to chew on.
pub fn noise_grid(width: usize, height: usize) -> LuminanceGrid {
    let mut state = 0x2545_f491_u32;
    let data = (0..width * height)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    LuminanceGrid::new(width, height, data).expect("non-empty grid")
}

#[allow(dead_code)]
/// Interleaved pixels of `bpp` bytes each, all at `value`.
pub fn flat_pixels(width: usize, height: usize, bpp: usize, value: u8) -> Vec<u8> {
    vec![value; width * height * bpp]
}
