//! End-to-end tests of the reader surface: every input form, result
//! statuses, observers and the non-blocking calls.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{SAMPLE_TEXT, base64_png, blank_image, data_uri, linear_image, png, qr_image};
use rust_barcode::{
    BarcodeReader, DecodeOptions, NOT_FOUND_MESSAGE, PixelLayout, Status, Symbology, SymbologySet,
};

#[test]
fn test_code128_with_default_options() {
    let reader = BarcodeReader::new();
    let result = reader.decode(linear_image(Symbology::Code128, SAMPLE_TEXT));
    assert_eq!(result.status(), Status::Found);
    assert_eq!(result.value(), Some(SAMPLE_TEXT));
    assert_eq!(result.message(), SAMPLE_TEXT);
}

#[test]
fn test_qr_with_formats_restricted_to_qr() {
    let options = DecodeOptions::default().with_formats(SymbologySet::only(Symbology::QrCode));
    let reader = BarcodeReader::with_options(options);
    let result = reader.decode(qr_image(SAMPLE_TEXT));
    assert_eq!(result.status(), Status::Found);
    assert_eq!(result.value(), Some(SAMPLE_TEXT));
    assert_eq!(result.symbology(), Some(Symbology::QrCode));
}

#[test]
fn test_qr_needs_opt_in() {
    let result = BarcodeReader::new().decode(qr_image(SAMPLE_TEXT));
    assert_eq!(result.status(), Status::NotFound);

    let result = BarcodeReader::thorough().decode(qr_image(SAMPLE_TEXT));
    assert_eq!(result.value(), Some(SAMPLE_TEXT));
}

#[test]
fn test_linear_symbologies_read_back() {
    let cases = [
        (Symbology::Code128, "Code-128 text", "Code-128 text"),
        (Symbology::Code128, "12345678", "12345678"),
        (Symbology::Code39, "CODE39 TEST", "CODE39 TEST"),
        (Symbology::Ean13, "400638133393", "4006381333931"),
        (Symbology::Ean8, "9638507", "96385074"),
        (Symbology::UpcA, "03600029145", "036000291452"),
        (Symbology::Itf, "12345670", "12345670"),
    ];
    let reader = BarcodeReader::new();
    for (symbology, text, expected) in cases {
        let result = reader.decode(linear_image(symbology, text));
        assert_eq!(result.value(), Some(expected), "{symbology}");
        assert_eq!(result.symbology(), Some(symbology), "{symbology}");
    }
}

#[test]
fn test_blank_image_is_not_found() {
    let result = BarcodeReader::thorough().decode(blank_image(320, 240));
    assert_eq!(result.status(), Status::NotFound);
    assert_eq!(result.value(), None);
    assert_eq!(result.message(), NOT_FOUND_MESSAGE);
}

#[test]
fn test_malformed_inputs_are_errors() {
    let reader = BarcodeReader::new();

    let result = reader.decode_bytes(b"definitely not an image");
    assert_eq!(result.status(), Status::Error);
    assert!(result.value().is_none());
    assert!(!result.message().is_empty());

    let result = reader.decode_bytes(&[]);
    assert_eq!(result.status(), Status::Error);

    let result = reader.decode_base64("@@@ not base64 @@@");
    assert_eq!(result.status(), Status::Error);

    let result = reader.decode_pixels(&[0; 11], 2, 2, PixelLayout::Rgb8);
    assert_eq!(result.status(), Status::Error);
}

#[test]
fn test_base64_with_and_without_prefix() {
    let image = linear_image(Symbology::Code39, "BASE64");
    let reader = BarcodeReader::new();
    let plain = reader.decode_base64(&base64_png(&image));
    let prefixed = reader.decode_base64(&data_uri(&image));
    assert_eq!(plain.status(), Status::Found);
    assert_eq!(plain.value(), prefixed.value());
    assert_eq!(plain.symbology(), prefixed.symbology());

    let wrapped: String = base64_png(&image)
        .as_bytes()
        .chunks(76)
        .map(|line| format!("{}\n", String::from_utf8_lossy(line)))
        .collect();
    assert_eq!(reader.decode_base64(&wrapped).value(), Some("BASE64"));
}

#[test]
fn test_bytes_and_pixels_agree_with_image() {
    let image = linear_image(Symbology::Ean13, "590123412345");
    let reader = BarcodeReader::new();
    let direct = reader.decode(image.clone());

    let from_png = reader.decode_bytes(&png(&image));
    assert_eq!(from_png.value(), direct.value());

    let rgba = image.to_rgba8();
    let (w, h) = (rgba.width() as usize, rgba.height() as usize);
    let from_pixels = reader.decode_pixels(rgba.as_raw(), w, h, PixelLayout::Rgba8);
    assert_eq!(from_pixels.value(), direct.value());
    assert_eq!(direct.value(), Some("5901234123457"));
}

#[test]
fn test_observer_fires_once_per_success() {
    let reader = BarcodeReader::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    reader.on_detected(move |result| {
        sink.lock().unwrap().push(result.value().map(str::to_string));
    });

    reader.decode(linear_image(Symbology::Code128, "first"));
    reader.decode(blank_image(100, 100));
    reader.decode_bytes(b"junk");
    reader.decode(linear_image(Symbology::Code128, "second"));

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![Some("first".to_string()), Some("second".to_string())]
    );
}

#[test]
fn test_removed_observer_stays_silent() {
    let reader = BarcodeReader::new();
    let kept = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(AtomicUsize::new(0));
    let (k, d) = (Arc::clone(&kept), Arc::clone(&dropped));
    reader.on_detected(move |_| {
        k.fetch_add(1, Ordering::SeqCst);
    });
    let id = reader.on_detected(move |_| {
        d.fetch_add(1, Ordering::SeqCst);
    });
    assert!(reader.remove_observer(id));

    // clones share the observer list
    let clone = reader.clone();
    clone.decode(linear_image(Symbology::Code39, "SHARED"));
    assert_eq!(kept.load(Ordering::SeqCst), 1);
    assert_eq!(dropped.load(Ordering::SeqCst), 0);
}

#[test]
fn test_async_variants_match_blocking() {
    let reader = BarcodeReader::new();
    let image = linear_image(Symbology::Itf, "00123456");
    let blocking = reader.decode(image.clone());

    let timeout = Duration::from_secs(30);
    let from_image = reader.decode_async(image.clone()).wait_timeout(timeout);
    let from_bytes = reader.decode_bytes_async(png(&image)).wait();
    let from_base64 = reader.decode_base64_async(data_uri(&image)).wait();
    let gray = image.to_luma8();
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let from_pixels = reader
        .decode_pixels_async(gray.into_raw(), w, h, PixelLayout::Luma8)
        .wait();

    assert_eq!(blocking.value(), Some("00123456"));
    for result in [from_image, from_bytes, from_base64, from_pixels] {
        assert_eq!(result.status(), blocking.status());
        assert_eq!(result.value(), blocking.value());
    }
}

#[test]
fn test_async_errors_and_observers() {
    let reader = BarcodeReader::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    reader.on_detected(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let failed = reader.decode_bytes_async(vec![1, 2, 3]).wait();
    assert_eq!(failed.status(), Status::Error);
    let found = reader
        .decode_async(linear_image(Symbology::Code128, "async"))
        .wait();
    assert!(found.is_found());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_retain_image_keeps_input() {
    let reader = BarcodeReader::with_options(DecodeOptions::default().with_retain_image(true));
    let image = linear_image(Symbology::Code128, "retain");
    let result = reader.decode_bytes(&png(&image));
    let kept = result.image().expect("retained");
    assert_eq!((kept.width(), kept.height()), (image.width(), image.height()));

    let plain = BarcodeReader::new().decode(image);
    assert!(plain.image().is_none());
}
