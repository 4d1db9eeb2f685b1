use crate::error::{DecodeError, Result};

/// Single-channel 8-bit intensity grid, row-major.
///
/// This is the only image representation the engine works on; every pixel
/// layout is normalized into it by [`crate::source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminanceGrid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl LuminanceGrid {
    /// Wrap an existing intensity buffer.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DecodeError::invalid_input(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        if data.len() != width * height {
            return Err(DecodeError::invalid_input(format!(
                "luminance buffer holds {} bytes, expected {} for {width}x{height}",
                data.len(),
                width * height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A grid of one constant value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Grid width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw row-major intensities
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access for renderers.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Intensity at (x, y); out-of-range reads are white.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 255;
        }
        self.data[y * self.width + x]
    }

    /// One row of intensities.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Rotate clockwise by `degrees`.
    ///
    /// Quarter turns are exact. Other angles use nearest-neighbour sampling
    /// on a canvas large enough to hold the whole rotated image; uncovered
    /// pixels are white.
    pub fn rotated(&self, degrees: u16) -> Self {
        match degrees % 360 {
            0 => self.clone(),
            90 => self.rotate_quarter(1),
            180 => self.rotate_quarter(2),
            270 => self.rotate_quarter(3),
            other => self.rotate_free(other as f32),
        }
    }

    fn rotate_quarter(&self, turns: u8) -> Self {
        let (w, h) = (self.width, self.height);
        let (out_w, out_h) = if turns % 2 == 1 { (h, w) } else { (w, h) };
        let mut data = vec![0u8; w * h];
        for y in 0..out_h {
            for x in 0..out_w {
                let (sx, sy) = match turns {
                    1 => (y, h - 1 - x),
                    2 => (w - 1 - x, h - 1 - y),
                    _ => (w - 1 - y, x),
                };
                data[y * out_w + x] = self.data[sy * w + sx];
            }
        }
        Self {
            width: out_w,
            height: out_h,
            data,
        }
    }

    fn rotate_free(&self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        let out_w = (w * cos.abs() + h * sin.abs()).ceil().max(1.0) as usize;
        let out_h = (w * sin.abs() + h * cos.abs()).ceil().max(1.0) as usize;
        let (cx, cy) = (w / 2.0, h / 2.0);
        let (ocx, ocy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

        let mut data = vec![255u8; out_w * out_h];
        for y in 0..out_h {
            for x in 0..out_w {
                let dx = x as f32 + 0.5 - ocx;
                let dy = y as f32 + 0.5 - ocy;
                // inverse of a clockwise turn in y-down coordinates
                let sx = dx * cos + dy * sin + cx;
                let sy = -dx * sin + dy * cos + cy;
                if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
                    data[y * out_w + x] = self.data[sy as usize * self.width + sx as usize];
                }
            }
        }
        Self {
            width: out_w,
            height: out_h,
            data,
        }
    }
}
