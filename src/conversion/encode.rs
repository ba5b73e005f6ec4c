use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, RgbaImage};

/// Map the user-facing 0-9 compression level onto the PNG encoder's deflate
/// effort. Every setting is lossless; only speed and file size change.
pub fn compression_type_for_level(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Composite an RGBA image onto an opaque white background.
///
/// Alpha is not preserved across the conversion: transparent regions become
/// white, matching the tool's fixed flattening policy.
pub fn flatten_onto_white(img: &RgbaImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut flattened = RgbImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let alpha = pixel[3] as u16;
        let blend = |c: u8| -> u8 { ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8 };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    flattened
}

/// Decode a WebP file and write it out as a PNG at the given compression level.
///
/// Images carrying an alpha channel are flattened onto white first; indexed
/// and other non-RGB pixel formats are converted to plain RGB. Returns the
/// image dimensions.
pub fn convert_webp_to_png(
    input_path: &Path,
    output_path: &Path,
    compression_level: u8,
) -> Result<(u32, u32)> {
    let img = image::open(input_path)
        .with_context(|| format!("failed to decode {}", input_path.display()))?;

    let (width, height) = (img.width(), img.height());

    let rgb_img = if img.color().has_alpha() {
        flatten_onto_white(&img.to_rgba8())
    } else {
        img.to_rgb8()
    };

    let file = File::create(output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    let encoder = PngEncoder::new_with_quality(
        BufWriter::new(file),
        compression_type_for_level(compression_level),
        FilterType::Adaptive,
    );
    encoder
        .write_image(rgb_img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .with_context(|| format!("failed to encode {}", output_path.display()))?;

    Ok((width, height))
}
