//! Fixtures shared by the integration tests: clean symbols drawn by
//! `synth`, shipped as images, PNG bytes or base64 text.
#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use rust_barcode::Symbology;
use rust_barcode::synth::{self, qr::QrBuilder, raster};

pub const SAMPLE_TEXT: &str = "ImageSharpBarcodeReader";

pub fn linear_image(symbology: Symbology, text: &str) -> DynamicImage {
    synth::render(symbology, text, 2)
        .unwrap_or_else(|| panic!("{symbology} cannot encode {text:?}"))
        .to_image()
}

pub fn qr_image(text: &str) -> DynamicImage {
    QrBuilder::new(text).render(4).expect("payload fits").to_image()
}

pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(image::GrayImage::from_pixel(width, height, image::Luma([255])))
}

pub fn png(image: &DynamicImage) -> Vec<u8> {
    raster::encode_png(image).expect("png encoding")
}

pub fn base64_png(image: &DynamicImage) -> String {
    STANDARD.encode(png(image))
}

pub fn data_uri(image: &DynamicImage) -> String {
    format!("data:image/png;base64,{}", base64_png(image))
}
