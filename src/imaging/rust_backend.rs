//! Pure Rust image backend on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader` with content-guessed format |
//! | JPEG completeness | marker walk up to the end-of-image marker |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Downscale | `DynamicImage::resize` with `Lanczos3` |
//! | Alpha flattening | blend onto a white matte, then 8-bit RGB |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Write | `tempfile` staging + `persist_noclobber` |
//!
//! The encoder never sees EXIF data, so the written file carries no
//! orientation tag: the pixels are already upright.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ConvertParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageFormat, ImageReader, Rgb,
    RgbImage,
};
use std::fmt::Display;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

/// Background that transparent pixels are composited onto.
const MATTE: u8 = 255;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl Display) -> BackendError {
    BackendError::Decode(format!("{}: {}", path.display(), err))
}

/// Walk the JPEG marker structure and require an end-of-image marker.
///
/// The JPEG decoder pads a truncated scan with grey and reports success, so
/// completeness is checked on the byte stream first. Segment payloads
/// (including an embedded EXIF thumbnail and its own EOI) are skipped by
/// length. Bytes after the EOI are ignored.
fn check_jpeg_complete(data: &[u8]) -> Result<(), String> {
    const TRUNCATED: &str = "truncated before end-of-image marker";

    if !data.starts_with(&[0xFF, 0xD8]) {
        return Err("missing start-of-image marker".into());
    }
    let mut pos = 2;
    loop {
        if pos >= data.len() {
            return Err(TRUNCATED.into());
        }
        if data[pos] != 0xFF {
            return Err(format!("expected a marker at byte {pos}"));
        }
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        let Some(&marker) = data.get(pos) else {
            return Err(TRUNCATED.into());
        };
        pos += 1;

        match marker {
            0xD9 => return Ok(()),
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD7 => continue,
            _ => {}
        }

        let Some(len_bytes) = data.get(pos..pos + 2) else {
            return Err(TRUNCATED.into());
        };
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if len < 2 {
            return Err(format!("invalid segment length {len} at byte {pos}"));
        }
        pos += len;
        if pos > data.len() {
            return Err(TRUNCATED.into());
        }

        if marker == 0xDA {
            pos = skip_entropy_coded(data, pos).ok_or(TRUNCATED)?;
        }
    }
}

/// Position of the first real marker after scan data, or `None` if the
/// data runs out first. Stuffed `FF 00` and restart markers belong to the scan.
fn skip_entropy_coded(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let ff = pos + data.get(pos..)?.iter().position(|&b| b == 0xFF)?;
        match *data.get(ff + 1)? {
            0x00 | 0xD0..=0xD7 => pos = ff + 2,
            _ => return Some(ff),
        }
    }
}

/// Decode an image and rotate/flip its pixels into display orientation.
///
/// The file is read once into memory; no handle outlives this call.
fn load_oriented(path: &Path) -> Result<DynamicImage, BackendError> {
    let bytes = std::fs::read(path)?;
    let mut reader = ImageReader::new(Cursor::new(bytes.as_slice()));
    if let Ok(format) = ImageFormat::from_path(path) {
        reader.set_format(format);
    }
    let reader = reader.with_guessed_format()?;
    if reader.format() == Some(ImageFormat::Jpeg) {
        check_jpeg_complete(&bytes).map_err(|e| decode_error(path, e))?;
    }

    let mut decoder = reader.into_decoder().map_err(|e| decode_error(path, e))?;
    // A malformed EXIF block is not a corrupt image; it just has no usable tag.
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Downscale so the longer edge fits within `max_dimension`, keeping aspect.
fn fit_within(img: DynamicImage, max_dimension: Option<u32>) -> DynamicImage {
    match max_dimension {
        Some(max) if img.width().max(img.height()) > max => {
            img.resize(max, max, FilterType::Lanczos3)
        }
        _ => img,
    }
}

fn blend(channel: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((channel as u32 * a + MATTE as u32 * (255 - a) + 127) / 255) as u8
}

/// Convert any color mode to 8-bit RGB, compositing alpha onto the matte.
///
/// Palette and grayscale PNGs are already expanded by the decoder; 16-bit
/// channels are narrowed by `into_rgb8`/`into_rgba8`.
fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([blend(r, a), blend(g, a), blend(b, a)])
    })
}

/// Encode to a hidden temp file beside `output`, then move it into place.
///
/// `persist_noclobber` fails if `output` appeared in the meantime, so a
/// written output is never replaced, and an interrupted encode never leaves
/// a half-written file under the final name.
fn write_jpeg(img: &RgbImage, output: &Path, quality: u8) -> Result<(), BackendError> {
    let dir = output.parent().ok_or_else(|| {
        BackendError::Encode(format!("{} has no parent directory", output.display()))
    })?;
    let mut staged = tempfile::Builder::new()
        .prefix(".")
        .suffix(".partial")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        JpegEncoder::new_with_quality(&mut writer, quality)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
            .map_err(|e| BackendError::Encode(format!("{}: {}", output.display(), e)))?;
        writer.flush()?;
    }
    staged
        .persist_noclobber(output)
        .map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let img = load_oriented(path)?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }

    fn convert(&self, params: &ConvertParams) -> Result<Dimensions, BackendError> {
        let img = load_oriented(&params.source)?;
        let img = fit_within(img, params.max_dimension);
        let rgb = flatten_to_rgb(img);
        write_jpeg(&rgb, &params.output, params.quality.as_u8())?;
        Ok(Dimensions {
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}
