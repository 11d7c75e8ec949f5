//! End-to-end runs of the converter over real files on disk.
//!
//! Uses the production `RustBackend`, so every image here is actually
//! decoded and encoded.
//!
//! The fixture writers below repeat a few of the crate's own test helpers
//! (plain JPEG encoding and the EXIF orientation segment). Those live in a
//! `#[cfg(test)]` module, which integration tests cannot import.

use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use ready_images::config::ConverterConfig;
use ready_images::process::{FileFailure, FileOutcome, ProcessError, ProcessReport};
use ready_images::validate::Rule;
use ready_images::{output, process::Converter};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, encode_jpeg(width, height)).unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]))
        .save(path)
        .unwrap();
}

/// JPEG with an APP1 EXIF segment carrying only the orientation tag.
fn write_rotated_jpeg(path: &Path, width: u32, height: u32, orientation: u16) {
    let mut tiff = b"II*\0".to_vec();
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let jpeg = encode_jpeg(width, height);
    let mut bytes = jpeg[..2].to_vec();
    bytes.extend_from_slice(&[0xFF, 0xE1]);
    bytes.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(&jpeg[2..]);
    fs::write(path, bytes).unwrap();
}

fn outputs(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("ready-images"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn dimensions(path: &Path) -> (u32, u32) {
    let img = ImageReader::open(path).unwrap().decode().unwrap();
    (img.width(), img.height())
}

fn outcome<'a>(report: &'a ProcessReport, name: &str) -> &'a FileOutcome {
    &report
        .entries
        .iter()
        .find(|e| e.source.file_name().unwrap() == name)
        .unwrap()
        .outcome
}

fn converter() -> Converter {
    Converter::new(ConverterConfig::default())
}

#[test]
fn mixed_batch() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_jpeg(&root.join("one.jpg"), 800, 600);
    write_jpeg(&root.join("sub/two.jpeg"), 640, 480);
    write_jpeg(&root.join("sub/deeper/three.JPG"), 1024, 768);
    write_png(&root.join("small.png"), 500, 400);
    fs::write(root.join("anim.gif"), b"GIF89a\x01\x00\x01\x00\x80\x00\x00;").unwrap();
    fs::write(root.join("broken.png"), b"definitely not a png").unwrap();

    let report = converter().process_directory(root).unwrap();

    assert_eq!(report.total(), 6);
    assert_eq!(report.processed(), 3);
    assert_eq!(report.failed(), 3);
    assert_eq!(report.count_rule(Rule::BelowMinimumWidth), 1);
    assert_eq!(report.count_rule(Rule::UnsupportedFormat), 1);
    assert_eq!(report.count_rule(Rule::CorruptImage), 1);
    assert_eq!(
        outputs(root),
        vec!["one_processed.jpg", "three_processed.jpg", "two_processed.jpg"]
    );
    assert_eq!(
        dimensions(&root.join("ready-images/three_processed.jpg")),
        (1024, 768)
    );

    let lines = output::format_report(&report);
    assert_eq!(
        lines.last().unwrap(),
        &format!(
            "3 processed, 0 skipped, 3 failed (6 total) in {:.2}s",
            report.elapsed_secs
        )
    );
}

#[test]
fn rerun_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_jpeg(&root.join("a.jpg"), 800, 600);
    write_png(&root.join("b.png"), 700, 700);

    let conv = converter();
    conv.process_directory(root).unwrap();
    let output = root.join("ready-images/a_processed.jpg");
    let first_bytes = fs::read(&output).unwrap();
    let first_modified = fs::metadata(&output).unwrap().modified().unwrap();

    let second = conv.process_directory(root).unwrap();
    assert_eq!(second.processed(), 0);
    assert_eq!(second.skipped(), 2);
    assert_eq!(outputs(root), vec!["a_processed.jpg", "b_processed.jpg"]);
    assert_eq!(fs::read(&output).unwrap(), first_bytes);
    assert_eq!(fs::metadata(&output).unwrap().modified().unwrap(), first_modified);
}

#[test]
fn exif_rotation_is_baked_into_pixels() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_rotated_jpeg(&root.join("portrait.jpg"), 800, 600, 6);

    let report = converter().process_directory(root).unwrap();
    assert_eq!(
        outcome(&report, "portrait.jpg"),
        &FileOutcome::Processed {
            output: root.join("ready-images/portrait_processed.jpg"),
            width: 600,
            height: 800,
        }
    );

    let output = root.join("ready-images/portrait_processed.jpg");
    assert_eq!(dimensions(&output), (600, 800));
    let bytes = fs::read(&output).unwrap();
    assert!(!bytes.windows(6).any(|w| w == b"Exif\0\0"));
}

#[test]
fn corrupt_jpeg_is_reported_and_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    // Keeps the JPEG signature, loses the frame header and scan data.
    let mut truncated = encode_jpeg(800, 600);
    truncated.truncate(20);
    fs::write(root.join("cut.jpg"), truncated).unwrap();
    write_jpeg(&root.join("fine.jpg"), 800, 600);

    let report = converter().process_directory(root).unwrap();

    assert!(matches!(
        outcome(&report, "cut.jpg"),
        FileOutcome::Failed {
            failure: FileFailure::Invalid { violations }
        } if violations[0].rule() == Rule::CorruptImage
    ));
    assert_eq!(outputs(root), vec!["fine_processed.jpg"]);
}

#[test]
fn half_written_jpeg_is_not_converted() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    // Headers intact, scan data cut off mid-stream as by an interrupted copy.
    let whole = encode_jpeg(800, 600);
    fs::write(root.join("half.jpg"), &whole[..whole.len() / 2]).unwrap();

    let report = converter().process_directory(root).unwrap();

    assert!(matches!(
        outcome(&report, "half.jpg"),
        FileOutcome::Failed {
            failure: FileFailure::Invalid { violations }
        } if violations.len() == 1 && violations[0].rule() == Rule::CorruptImage
    ));
    assert!(outputs(root).is_empty());
}

#[test]
fn png_output_is_a_jpeg() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_png(&root.join("scan.png"), 900, 300);

    converter().process_directory(root).unwrap();

    let bytes = fs::read(root.join("ready-images/scan_processed.jpg")).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
}

#[test]
fn check_leaves_tree_untouched() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_jpeg(&root.join("a.jpg"), 800, 600);

    let report = converter().check_directory(root).unwrap();
    assert_eq!(report.would_process(), 1);
    assert!(!root.join("ready-images").exists());
}

#[test]
fn missing_root_aborts() {
    let tmp = TempDir::new().unwrap();
    let result = converter().process_directory(&tmp.path().join("absent"));
    assert!(matches!(result, Err(ProcessError::SourceNotFound(_))));
}
