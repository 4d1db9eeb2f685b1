//! Clean symbol synthesis for tests, benches and the `render` command.
//!
//! Linear encoders return element widths in modules (bar first, no quiet
//! zone); [`raster`] paints them. This is not a general purpose encoder:
//! every symbology gets one straightforward encoding of its text.

/// Code 128
pub mod code128;
/// Code 39
pub mod code39;
/// EAN-13, UPC-A, EAN-8
pub mod ean;
/// Interleaved 2 of 5
pub mod itf;
/// QR Code
pub mod qr;
/// Painting into grids, images and PNG bytes
pub mod raster;

use crate::models::{LuminanceGrid, Symbology};

/// Bar height of rendered linear symbols, in modules.
const BAR_HEIGHT_MODULES: usize = 30;

/// Module widths of `text` as a linear `symbology`. EAN/UPC text may
/// include or omit the check digit; a wrong one is rejected.
pub fn linear_runs(symbology: Symbology, text: &str) -> Option<Vec<u32>> {
    match symbology {
        Symbology::Code128 => code128::encode(text),
        Symbology::Code39 => code39::encode(text, 1, 3),
        Symbology::Itf => itf::encode(text, 1, 3),
        Symbology::Ean13 => with_check_digit(text, 12, ean::encode_ean13),
        Symbology::Ean8 => with_check_digit(text, 7, ean::encode_ean8),
        Symbology::UpcA => with_check_digit(text, 11, ean::encode_upca),
        Symbology::QrCode => None,
    }
}

fn with_check_digit(text: &str, body_len: usize, encode: fn(&str) -> Option<Vec<u32>>) -> Option<Vec<u32>> {
    if !text.is_ascii() {
        return None;
    }
    match text.len() {
        n if n == body_len => encode(text),
        n if n == body_len + 1 => {
            let runs = encode(&text[..body_len])?;
            let expected = linear_check_digit(&text[..body_len])?;
            (text.as_bytes()[body_len] == expected).then_some(runs)
        }
        _ => None,
    }
}

fn linear_check_digit(body: &str) -> Option<u8> {
    let digits: Vec<u8> = body
        .bytes()
        .map(|b| b.is_ascii_digit().then(|| b - b'0'))
        .collect::<Option<_>>()?;
    Some(b'0' + crate::decoder::oned::ean::check_digit(&digits))
}

/// Render `text` as `symbology` at `scale` pixels per module, quiet zone
/// included.
pub fn render(symbology: Symbology, text: &str, scale: usize) -> Option<LuminanceGrid> {
    match symbology {
        Symbology::QrCode => qr::QrBuilder::new(text).render(scale),
        linear => linear_runs(linear, text)
            .map(|runs| raster::render_runs(&runs, scale, BAR_HEIGHT_MODULES * scale.max(1))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_digit_is_optional_but_verified() {
        assert!(linear_runs(Symbology::Ean13, "400638133393").is_some());
        assert!(linear_runs(Symbology::Ean13, "4006381333931").is_some());
        assert!(linear_runs(Symbology::Ean13, "4006381333932").is_none());
        assert_eq!(
            linear_runs(Symbology::UpcA, "03600029145"),
            linear_runs(Symbology::Ean13, "003600029145")
        );
        assert!(linear_runs(Symbology::QrCode, "x").is_none());
    }

    #[test]
    fn test_render_every_symbology() {
        let cases = [
            (Symbology::QrCode, "hello"),
            (Symbology::Code128, "hello"),
            (Symbology::Code39, "HELLO"),
            (Symbology::Ean13, "400638133393"),
            (Symbology::Ean8, "9638507"),
            (Symbology::UpcA, "03600029145"),
            (Symbology::Itf, "123456"),
        ];
        for (symbology, text) in cases {
            let grid = render(symbology, text, 2).unwrap_or_else(|| panic!("{symbology}"));
            assert!(grid.width() > 40 && grid.height() > 40, "{symbology}");
        }
    }
}
