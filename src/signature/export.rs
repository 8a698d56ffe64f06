//! Rasterization of drawn signatures and verification of uploaded images.

use image::ImageFormat;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::{Color, Segment};
use crate::errors::{FormError, FormResult};
use crate::form::definition::SignatureOptions;

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Draws `segments` on a canvas of the configured size and encodes it as PNG.
pub fn rasterize_png(options: &SignatureOptions, segments: &[Segment]) -> FormResult<Vec<u8>> {
    let mut pixmap = Pixmap::new(options.canvas_width, options.canvas_height).ok_or_else(|| {
        FormError::Export(format!(
            "invalid canvas size {}x{}",
            options.canvas_width, options.canvas_height
        ))
    })?;
    pixmap.fill(skia_color(options.background_color));

    let mut paint = Paint::default();
    paint.set_color(skia_color(options.stroke_color));
    paint.anti_alias = true;

    let stroke = Stroke {
        width: options.stroke_width.max(0.5),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for segment in segments {
        let mut builder = PathBuilder::new();
        builder.move_to(segment.from.x, segment.from.y);
        builder.line_to(segment.to.x, segment.to.y);
        // A tap is a zero-length segment; the round cap inks it as a dot.
        if let Some(path) = builder.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    pixmap
        .encode_png()
        .map_err(|err| FormError::Export(err.to_string()))
}

/// Result of checking uploaded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCheck {
    Valid {
        format: &'static str,
        width: u32,
        height: u32,
    },
    Invalid(String),
}

/// Confirms that `bytes` decode as an image, regardless of the file name.
pub fn verify_image(bytes: &[u8]) -> ImageCheck {
    let format = match image::guess_format(bytes) {
        Ok(format) => format,
        Err(err) => return ImageCheck::Invalid(err.to_string()),
    };
    match image::load_from_memory_with_format(bytes, format) {
        Ok(decoded) => ImageCheck::Valid {
            format: format_label(format),
            width: decoded.width(),
            height: decoded.height(),
        },
        Err(err) => ImageCheck::Invalid(err.to_string()),
    }
}

fn format_label(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Bmp => "BMP",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Point;

    fn options(width: u32, height: u32) -> SignatureOptions {
        SignatureOptions {
            canvas_width: width,
            canvas_height: height,
            stroke_width: 4.0,
            ..SignatureOptions::default()
        }
    }

    #[test]
    fn rasterized_strokes_land_on_white_canvas() {
        let segments = [Segment {
            from: Point::new(10.0, 19.0),
            to: Point::new(90.0, 21.0),
        }];
        let png = rasterize_png(&options(100, 40), &segments).expect("png");
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (100, 40));
        assert_eq!(decoded.get_pixel(2, 2).0, [255, 255, 255, 255]);
        let ink = decoded.get_pixel(50, 20).0;
        assert!(ink[0] < 64 && ink[1] < 64 && ink[2] < 64, "expected ink, got {ink:?}");
    }

    #[test]
    fn single_tap_leaves_a_dot() {
        let tap = [Segment {
            from: Point::new(20.0, 20.0),
            to: Point::new(20.0, 20.0),
        }];
        let png = rasterize_png(
            &SignatureOptions {
                stroke_width: 6.0,
                ..options(40, 40)
            },
            &tap,
        )
        .unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        let inked = decoded
            .pixels()
            .filter(|pixel| pixel.0[0] < 200)
            .count();
        assert!(inked > 0, "tap left no ink");
        assert_eq!(decoded.get_pixel(2, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn zero_sized_canvas_is_an_export_error() {
        assert!(matches!(
            rasterize_png(&options(0, 10), &[]),
            Err(FormError::Export(_))
        ));
    }

    #[test]
    fn verify_accepts_png_and_rejects_garbage() {
        let png = rasterize_png(&options(8, 8), &[]).unwrap();
        assert_eq!(
            verify_image(&png),
            ImageCheck::Valid {
                format: "PNG",
                width: 8,
                height: 8
            }
        );
        assert!(matches!(verify_image(b"definitely not an image"), ImageCheck::Invalid(_)));

        let mut truncated = png.clone();
        truncated.truncate(png.len() / 2);
        assert!(matches!(verify_image(&truncated), ImageCheck::Invalid(_)));
    }
}
