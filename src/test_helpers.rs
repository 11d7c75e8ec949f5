//! Shared test utilities for the ready-images test suite.
//!
//! Generates small synthetic images on disk so tests exercise the real
//! decoders without shipping binary fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("wide.jpg"), 800, 600);
//! create_jpeg_with_orientation(&tmp.path().join("turned.jpg"), 800, 600, 6);
//! write_corrupt(&tmp.path().join("broken.png"));
//! ```

use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use std::fs;
use std::path::Path;

// =========================================================================
// Image writers
// =========================================================================

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Write a valid baseline JPEG with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    fs::write(path, encode_jpeg(width, height)).unwrap();
}

/// Write a valid opaque RGB PNG with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    gradient(width, height).save(path).unwrap();
}

/// Write a fully transparent red RGBA PNG.
pub fn create_transparent_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 0]))
        .save(path)
        .unwrap();
}

/// Write a JPEG whose stored pixels are `width`×`height` and whose EXIF
/// orientation tag is `orientation` (1–8).
pub fn create_jpeg_with_orientation(path: &Path, width: u32, height: u32, orientation: u16) {
    ensure_parent(path);
    let jpeg = encode_jpeg(width, height);
    let mut bytes = Vec::with_capacity(jpeg.len() + 64);
    // SOI, then our APP1, then everything the encoder wrote after its SOI.
    bytes.extend_from_slice(&jpeg[..2]);
    bytes.extend_from_slice(&exif_orientation_segment(orientation));
    bytes.extend_from_slice(&jpeg[2..]);
    fs::write(path, bytes).unwrap();
}

/// Build a JPEG APP1 segment holding a one-entry little-endian TIFF IFD
/// with the Orientation tag (0x0112).
fn exif_orientation_segment(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II*\0");
    tiff.extend_from_slice(&8u32.to_le_bytes()); // offset of IFD0
    tiff.extend_from_slice(&1u16.to_le_bytes()); // entry count
    tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_le_bytes()); // count
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]); // value padding
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// Write bytes that no decoder accepts.
pub fn write_corrupt(path: &Path) {
    ensure_parent(path);
    fs::write(path, b"\x00\x01 truncated garbage, not an image").unwrap();
}

/// Write a minimal GIF header.
pub fn write_gif(path: &Path) {
    ensure_parent(path);
    fs::write(path, b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00;").unwrap();
}

// =========================================================================
// Assertions on written files
// =========================================================================

/// Whether a JPEG byte stream carries an EXIF APP1 payload.
pub fn contains_exif(bytes: &[u8]) -> bool {
    bytes.windows(6).any(|w| w == b"Exif\0\0")
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
