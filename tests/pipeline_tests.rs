//! Engine-level tests on luminance grids: option handling, rotation and
//! thresholds, scan order.

use rust_barcode::models::DecodeResult;
use rust_barcode::synth::{self, qr::QrBuilder, raster};
use rust_barcode::{DecodeOptions, LuminanceGrid, Symbology, SymbologySet, decode};

fn render(symbology: Symbology, text: &str) -> LuminanceGrid {
    synth::render(symbology, text, 3).expect("encodable")
}

/// Compress the grid's range into `[low, high]`.
fn low_contrast(grid: &LuminanceGrid, low: u8, high: u8) -> LuminanceGrid {
    let span = (high - low) as u32;
    let data = grid
        .data()
        .iter()
        .map(|&v| low + ((v as u32 * span) / 255) as u8)
        .collect();
    LuminanceGrid::new(grid.width(), grid.height(), data).unwrap()
}

#[test]
fn test_empty_format_set_means_all_linear() {
    let options = DecodeOptions::default();
    for (symbology, text) in [
        (Symbology::Code128, "any"),
        (Symbology::Code39, "ANY"),
        (Symbology::Ean8, "1234567"),
    ] {
        let result = decode(&render(symbology, text), &options);
        assert!(result.is_found(), "{symbology}");
    }
}

#[test]
fn test_allow_list_is_respected() {
    let grid = render(Symbology::Code39, "ONLY39");
    let code128 = DecodeOptions::default().with_formats(SymbologySet::only(Symbology::Code128));
    assert!(matches!(decode(&grid, &code128), DecodeResult::NotFound));

    let both = code128.with_format(Symbology::Code39);
    assert_eq!(decode(&grid, &both).text(), Some("ONLY39"));
}

#[test]
fn test_upside_down_needs_rotation() {
    let grid = render(Symbology::Code128, "flipped").rotated(180);
    let rotating = DecodeOptions::default().with_auto_rotate(true);
    assert_eq!(decode(&grid, &rotating).text(), Some("flipped"));

    let quarter = render(Symbology::Ean13, "400638133393").rotated(270);
    let thorough = DecodeOptions::thorough();
    assert_eq!(decode(&quarter, &thorough).text(), Some("4006381333931"));
}

#[test]
fn test_rotated_qr() {
    let grid = QrBuilder::new("turned around").render(4).unwrap().rotated(90);
    let options = DecodeOptions::default().with_formats(SymbologySet::only(Symbology::QrCode));
    assert_eq!(decode(&grid, &options).text(), Some("turned around"));
}

#[test]
fn test_low_contrast_is_still_read() {
    let grid = low_contrast(&render(Symbology::Code128, "faded"), 90, 170);
    assert_eq!(decode(&grid, &DecodeOptions::default()).text(), Some("faded"));
}

#[test]
fn test_first_symbol_in_scan_order_wins() {
    let upper = synth::linear_runs(Symbology::Code39, "UPPER").unwrap();
    let lower = synth::linear_runs(Symbology::Code39, "LOWER").unwrap();
    let a = raster::render_runs(&upper, 2, 50);
    let b = raster::render_runs(&lower, 2, 50);
    let width = a.width().max(b.width());
    let height = a.height() + b.height();
    let mut data = vec![255u8; width * height];
    for (y, row) in data.chunks_mut(width).enumerate() {
        let (src, sy) = if y < a.height() { (&a, y) } else { (&b, y - a.height()) };
        row[..src.width()].copy_from_slice(src.row(sy));
    }
    let grid = LuminanceGrid::new(width, height, data).unwrap();

    for _ in 0..3 {
        assert_eq!(decode(&grid, &DecodeOptions::default()).text(), Some("UPPER"));
    }
}

#[test]
fn test_qr_error_levels_and_masks() {
    use rust_barcode::models::{ECLevel, MaskPattern};
    let options = DecodeOptions::default().with_formats(SymbologySet::only(Symbology::QrCode));
    for (level, mask) in [
        (ECLevel::L, MaskPattern::Pattern0),
        (ECLevel::M, MaskPattern::Pattern2),
        (ECLevel::Q, MaskPattern::Pattern5),
        (ECLevel::H, MaskPattern::Pattern7),
    ] {
        let grid = QrBuilder::new("levels and masks")
            .ec_level(level)
            .mask(mask)
            .render(4)
            .unwrap();
        assert_eq!(
            decode(&grid, &options).text(),
            Some("levels and masks"),
            "{level:?} {mask:?}"
        );
    }
}

#[test]
fn test_larger_qr_versions() {
    let text = "a longer payload that pushes the symbol past version six ".repeat(3);
    let builder = QrBuilder::new(&text);
    assert!(builder.version().unwrap() >= 7);
    let grid = builder.render(3).unwrap();
    let options = DecodeOptions::default().with_formats(SymbologySet::only(Symbology::QrCode));
    assert_eq!(decode(&grid, &options).text(), Some(text.as_str()));
}
