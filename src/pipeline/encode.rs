//! Image encoding: make the bytes on disk match the filename's extension.
//!
//! A browser session hands back PNG screenshots of the rendered image even
//! when the wiki served a JPEG or GIF. Bytes already in the right format are
//! written verbatim; anything else is decoded and re-encoded.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Target format implied by `filename`'s extension.
pub fn format_for_filename(filename: &str) -> Option<ImageFormat> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "gif" => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// Return `bytes` encoded in the format `filename` names.
///
/// Errors are plain strings; the caller wraps them in
/// [`ImageError::Transcode`](crate::error::ImageError::Transcode).
pub fn encode_for_filename(bytes: &[u8], filename: &str) -> Result<Vec<u8>, String> {
    let target = format_for_filename(filename)
        .ok_or_else(|| format!("unsupported image extension in '{filename}'"))?;

    if image::guess_format(bytes).ok() == Some(target) {
        return Ok(bytes.to_vec());
    }

    let img = image::load_from_memory(bytes).map_err(|e| format!("decode failed: {e}"))?;
    // JPEG has no alpha channel; the GIF encoder wants RGBA.
    let img = match target {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img,
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), target)
        .map_err(|e| format!("encode as {target:?} failed: {e}"))?;
    debug!("Re-encoded {} as {:?} ({} bytes)", filename, target, buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([200, 30, 30, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn matching_format_is_written_verbatim() {
        let png = png_bytes();
        assert_eq!(encode_for_filename(&png, "Diagram.PNG").unwrap(), png);
    }

    #[test]
    fn png_screenshot_becomes_jpeg() {
        let out = encode_for_filename(&png_bytes(), "photo.jpg").unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn png_screenshot_becomes_gif() {
        let out = encode_for_filename(&png_bytes(), "anim.gif").unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Gif);
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        assert!(encode_for_filename(b"<html>login</html>", "a.png").is_err());
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(format_for_filename("a.svg").is_none());
        assert!(encode_for_filename(&png_bytes(), "a.svg").is_err());
    }
}
