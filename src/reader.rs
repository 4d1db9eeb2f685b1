//! The reader surface: blocking and non-blocking decode calls over the
//! engine, a status-bearing result and success observers.
//!
//! Every call owns (or borrows only for its duration) the image it decodes,
//! so the pixel buffers are released on every exit path. Engine panics are
//! caught and reported as an `Error` result.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use image::DynamicImage;
use tracing::debug;

use crate::error::{DecodeError, Result};
use crate::models::{DecodeResult, LuminanceGrid, Symbology};
use crate::pipeline::{self, DecodeOptions};
use crate::source::{PixelLayout, load_base64_image, load_image};

/// Message carried by every `NotFound` result.
pub const NOT_FOUND_MESSAGE: &str = "The provided image did not contain a readable barcode";

/// Outcome class of a [`BarcodeResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// A symbol was decoded; the result carries its value.
    Found,
    /// The image was read but held no readable symbol.
    NotFound,
    /// The input was unusable or decoding failed.
    Error,
}

/// What a decode call reports. Immutable once built; only `Found`
/// carries a value.
#[derive(Debug, Clone)]
pub struct BarcodeResult {
    status: Status,
    value: Option<String>,
    message: String,
    symbology: Option<Symbology>,
    raw_bytes: Option<Vec<u8>>,
    confidence: Option<f32>,
    image: Option<DynamicImage>,
}

impl BarcodeResult {
    fn from_decode(result: DecodeResult, image: Option<DynamicImage>) -> Self {
        match result {
            DecodeResult::Found(barcode) => Self {
                status: Status::Found,
                message: barcode.text.clone(),
                value: Some(barcode.text),
                symbology: Some(barcode.symbology),
                raw_bytes: Some(barcode.raw_bytes),
                confidence: Some(barcode.confidence),
                image,
            },
            DecodeResult::NotFound => Self {
                status: Status::NotFound,
                value: None,
                message: NOT_FOUND_MESSAGE.to_string(),
                symbology: None,
                raw_bytes: None,
                confidence: None,
                image,
            },
            DecodeResult::Error(err) => Self::from_error(&err),
        }
    }

    fn from_error(err: &DecodeError) -> Self {
        Self {
            status: Status::Error,
            value: None,
            message: err.to_string(),
            symbology: None,
            raw_bytes: None,
            confidence: None,
            image: None,
        }
    }

    /// Outcome class
    pub fn status(&self) -> Status {
        self.status
    }

    /// True for [`Status::Found`].
    pub fn is_found(&self) -> bool {
        self.status == Status::Found
    }

    /// Decoded text, present only when found.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The decoded text, the not-found notice, or the error description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Symbology the value was read as.
    pub fn symbology(&self) -> Option<Symbology> {
        self.symbology
    }

    /// Payload bytes of the decoded symbol.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw_bytes.as_deref()
    }

    /// Decoder confidence in `0.0..=1.0`.
    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    /// The input image, when the reader retains images.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    /// Take the retained image.
    pub fn into_image(self) -> Option<DynamicImage> {
        self.image
    }
}

impl fmt::Display for BarcodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.symbology) {
            (Status::Found, Some(symbology)) => write!(f, "[{symbology}] {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Handle returned by [`BarcodeReader::on_detected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn(&BarcodeResult) + Send + Sync>;

/// Decodes barcodes from images and notifies observers of every success.
///
/// Clones share the observer list.
#[derive(Clone)]
pub struct BarcodeReader {
    options: DecodeOptions,
    observers: Arc<RwLock<Vec<(ObserverId, Observer)>>>,
    next_observer: Arc<AtomicU64>,
}

impl Default for BarcodeReader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BarcodeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("BarcodeReader")
            .field("options", &self.options)
            .field("observers", &observers)
            .finish()
    }
}

impl BarcodeReader {
    /// Performance mode: every linear symbology, upright only, one
    /// threshold pass.
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    /// Every symbology with try-harder and the rotation sweep.
    pub fn thorough() -> Self {
        Self::with_options(DecodeOptions::thorough())
    }

    /// A reader with explicit options.
    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            options,
            observers: Arc::new(RwLock::new(Vec::new())),
            next_observer: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Options used by every call
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Register `callback` to run once for every `Found` result, after the
    /// result is built and before the call returns it.
    pub fn on_detected<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&BarcodeResult) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Unregister an observer. Returns false if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(other, _)| *other != id);
        observers.len() != before
    }

    /// Decode a decoded image.
    pub fn decode(&self, image: DynamicImage) -> BarcodeResult {
        let result = self.guarded(|| {
            let grid = LuminanceGrid::from_image(&image)?;
            Ok(pipeline::decode(&grid, &self.options))
        });
        let retained = self.options.retain_image.then_some(image);
        self.finish(result, retained)
    }

    /// Decode an interleaved pixel buffer.
    ///
    /// The buffer is only borrowed; a retained image is the normalized gray
    /// version of it.
    pub fn decode_pixels(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> BarcodeResult {
        let mut grid = None;
        let result = self.guarded(|| {
            let luminance = LuminanceGrid::from_pixels(pixels, width, height, layout)?;
            let decoded = pipeline::decode(&luminance, &self.options);
            grid = Some(luminance);
            Ok(decoded)
        });
        let retained = grid
            .filter(|_| self.options.retain_image)
            .map(|g| g.to_image());
        self.finish(result, retained)
    }

    /// Decode encoded image bytes (PNG, JPEG, ...).
    pub fn decode_bytes(&self, bytes: &[u8]) -> BarcodeResult {
        match load_image(bytes) {
            Ok(image) => self.decode(image),
            Err(err) => self.finish(DecodeResult::Error(err), None),
        }
    }

    /// Decode base64 image text, with or without a data-URI prefix.
    pub fn decode_base64(&self, text: &str) -> BarcodeResult {
        match load_base64_image(text) {
            Ok(image) => self.decode(image),
            Err(err) => self.finish(DecodeResult::Error(err), None),
        }
    }

    /// [`BarcodeReader::decode`] on the rayon pool.
    pub fn decode_async(&self, image: DynamicImage) -> DecodeHandle {
        self.spawn(move |reader| reader.decode(image))
    }

    /// [`BarcodeReader::decode_pixels`] on the rayon pool; the buffer moves
    /// to the worker.
    pub fn decode_pixels_async(
        &self,
        pixels: Vec<u8>,
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> DecodeHandle {
        self.spawn(move |reader| reader.decode_pixels(&pixels, width, height, layout))
    }

    /// [`BarcodeReader::decode_bytes`] on the rayon pool.
    pub fn decode_bytes_async(&self, bytes: Vec<u8>) -> DecodeHandle {
        self.spawn(move |reader| reader.decode_bytes(&bytes))
    }

    /// [`BarcodeReader::decode_base64`] on the rayon pool.
    pub fn decode_base64_async(&self, text: String) -> DecodeHandle {
        self.spawn(move |reader| reader.decode_base64(&text))
    }

    fn spawn<F>(&self, job: F) -> DecodeHandle
    where
        F: FnOnce(&BarcodeReader) -> BarcodeResult + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let reader = self.clone();
        rayon::spawn(move || {
            // a panic must never unwind into the pool
            let result = catch_unwind(AssertUnwindSafe(|| job(&reader))).unwrap_or_else(|payload| {
                BarcodeResult::from_error(&DecodeError::Panic(panic_message(payload.as_ref())))
            });
            // the caller may have stopped waiting
            let _ = sender.send(result);
        });
        DecodeHandle { receiver }
    }

    /// Run the engine, turning panics into errors.
    fn guarded<F>(&self, run: F) -> DecodeResult
    where
        F: FnOnce() -> Result<DecodeResult>,
    {
        match catch_unwind(AssertUnwindSafe(run)) {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => DecodeResult::Error(err),
            Err(payload) => DecodeResult::Error(DecodeError::Panic(panic_message(payload.as_ref()))),
        }
    }

    fn finish(&self, result: DecodeResult, image: Option<DynamicImage>) -> BarcodeResult {
        let result = BarcodeResult::from_decode(result, image);
        debug!(status = ?result.status, message = %result.message, "decode finished");
        if !result.is_found() {
            return result;
        }
        match catch_unwind(AssertUnwindSafe(|| self.notify(&result))) {
            Ok(()) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                debug!(%message, "observer panicked");
                BarcodeResult::from_error(&DecodeError::Panic(format!("observer: {message}")))
            }
        }
    }

    /// Observers run in registration order; a panicking one stops the rest.
    fn notify(&self, result: &BarcodeResult) {
        // snapshot so callbacks may register or remove observers
        let observers: Vec<Observer> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(result);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Pending result of a non-blocking decode.
#[derive(Debug)]
pub struct DecodeHandle {
    receiver: mpsc::Receiver<BarcodeResult>,
}

impl DecodeHandle {
    /// Block until the worker finishes.
    pub fn wait(self) -> BarcodeResult {
        self.receiver
            .recv()
            .unwrap_or_else(|_| BarcodeResult::from_error(&worker_lost()))
    }

    /// Block for at most `timeout`. On expiry the worker is abandoned, not
    /// interrupted, and an `Error` result is returned.
    pub fn wait_timeout(self, timeout: Duration) -> BarcodeResult {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => BarcodeResult::from_error(&DecodeError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => BarcodeResult::from_error(&worker_lost()),
        }
    }
}

fn worker_lost() -> DecodeError {
    DecodeError::Panic("decode worker exited without a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use crate::synth::{self, raster};

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(image::GrayImage::from_pixel(width, height, image::Luma([255])))
    }

    fn code128_image(text: &str) -> DynamicImage {
        synth::render(Symbology::Code128, text, 2)
            .expect("encodable")
            .to_image()
    }

    #[test]
    fn test_found_result_fields() {
        let result = BarcodeReader::new().decode(code128_image("ImageSharpBarcodeReader"));
        assert_eq!(result.status(), Status::Found);
        assert_eq!(result.value(), Some("ImageSharpBarcodeReader"));
        assert_eq!(result.message(), "ImageSharpBarcodeReader");
        assert_eq!(result.symbology(), Some(Symbology::Code128));
        assert_eq!(result.raw_bytes(), Some(&b"ImageSharpBarcodeReader"[..]));
        assert!(result.image().is_none());
        assert_eq!(result.to_string(), "[Code 128] ImageSharpBarcodeReader");
    }

    #[test]
    fn test_not_found_message() {
        let result = BarcodeReader::new().decode(blank(120, 80));
        assert_eq!(result.status(), Status::NotFound);
        assert_eq!(result.value(), None);
        assert_eq!(result.message(), NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_input_errors() {
        let reader = BarcodeReader::new();
        let result = reader.decode_pixels(&[0; 10], 4, 4, PixelLayout::Rgb8);
        assert_eq!(result.status(), Status::Error);
        assert!(result.message().starts_with("invalid input"));

        let result = reader.decode(DynamicImage::new_luma8(0, 0));
        assert_eq!(result.status(), Status::Error);
    }

    #[test]
    fn test_retained_image() {
        let options = DecodeOptions::default().with_retain_image(true);
        let reader = BarcodeReader::with_options(options);
        let image = code128_image("KEEP");
        let (w, h) = (image.width(), image.height());
        let found = reader.decode(image);
        assert!(found.is_found());
        assert_eq!(found.image().map(|i| (i.width(), i.height())), Some((w, h)));

        let missing = reader.decode(blank(50, 50));
        assert_eq!(missing.status(), Status::NotFound);
        assert!(missing.into_image().is_some());

        let broken = reader.decode_bytes(b"garbage");
        assert!(broken.image().is_none());
    }

    #[test]
    fn test_observers_fire_only_on_success() {
        let reader = BarcodeReader::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = reader.on_detected(move |result| {
            assert!(result.is_found());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        reader.decode(code128_image("ONE"));
        reader.decode(blank(60, 60));
        reader.decode_bytes(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(reader.remove_observer(id));
        assert!(!reader.remove_observer(id));
        reader.decode(code128_image("TWO"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panics_become_errors() {
        let reader = BarcodeReader::new();
        let result = reader.guarded(|| panic!("boom"));
        match result {
            DecodeResult::Error(DecodeError::Panic(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_observer_panic_becomes_error() {
        let reader = BarcodeReader::new();
        let later = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&later);
        reader.on_detected(|_| panic!("observer boom"));
        reader.on_detected(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let result = reader.decode(code128_image("X1"));
        assert_eq!(result.status(), Status::Error);
        assert!(result.message().contains("observer boom"));
        assert!(result.value().is_none());
        assert_eq!(later.load(Ordering::SeqCst), 0);

        // not found never reaches observers
        let blank = reader.decode(blank(40, 40));
        assert_eq!(blank.status(), Status::NotFound);
    }

    #[test]
    fn test_observer_panic_on_worker() {
        let reader = BarcodeReader::new();
        reader.on_detected(|_| panic!("observer boom"));
        let result = reader
            .decode_async(code128_image("X1"))
            .wait_timeout(Duration::from_secs(30));
        assert_eq!(result.status(), Status::Error);
        assert!(result.message().contains("observer boom"));
    }

    #[test]
    fn test_panicking_job_reports_error() {
        let reader = BarcodeReader::new();
        let result = reader.spawn(|_| panic!("job boom")).wait();
        assert_eq!(result.status(), Status::Error);
        assert!(result.message().contains("job boom"));
    }

    #[test]
    fn test_async_matches_blocking() {
        let reader = BarcodeReader::new();
        let grid = synth::render(Symbology::Code128, "ASYNC", 2).expect("encodable");
        let png = raster::encode_png(&grid.to_image()).expect("png");

        let blocking = reader.decode_bytes(&png);
        let pending = reader.decode_bytes_async(png);
        let result = pending.wait_timeout(Duration::from_secs(30));
        assert_eq!(result.status(), blocking.status());
        assert_eq!(result.value(), Some("ASYNC"));
    }

    #[test]
    fn test_timeout_is_an_error() {
        let (_sender, receiver) = mpsc::sync_channel::<BarcodeResult>(1);
        let handle = DecodeHandle { receiver };
        let result = handle.wait_timeout(Duration::from_millis(10));
        assert_eq!(result.status(), Status::Error);
        assert!(result.message().contains("10ms"));
    }
}
