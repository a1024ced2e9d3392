use super::composer::OverlayInstruction;
use crate::config::OverlayConfig;
use crate::error::{PosecoachError, Result};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{Font, Scale};
use std::fs;
use tracing::debug;

const BOX_X: u32 = 10;
const BOX_Y: u32 = 10;
const BOX_WIDTH: u32 = 300;
const TEXT_X: i32 = 20;
const TITLE_BASELINE: i32 = 35;
const FIRST_LINE_BASELINE: i32 = 60;
const LINE_SPACING: i32 = 25;

/// Height of the darkened feedback box for an overlay
pub fn box_height(overlay: &OverlayInstruction) -> u32 {
    if overlay.has_feedback() {
        overlay.lines.len() as u32 * 30 + 40
    } else {
        60
    }
}

/// Draws an [`OverlayInstruction`] onto a JPEG frame.
///
/// Decoding, drawing and encoding all happen synchronously on an owned
/// buffer, so a rendered frame always matches the overlay it was given.
pub struct OverlayRenderer {
    font: Font<'static>,
    title_scale: Scale,
    line_scale: Scale,
}

impl OverlayRenderer {
    pub fn new(config: &OverlayConfig) -> Result<Self> {
        let font_data = fs::read(&config.font_path).map_err(|e| {
            PosecoachError::component(
                "overlay_renderer",
                format!("Failed to read font file '{}': {}", config.font_path, e),
            )
        })?;

        Self::from_font_bytes(font_data, config.title_font_size, config.line_font_size)
    }

    pub fn from_font_bytes(font_data: Vec<u8>, title_size: f32, line_size: f32) -> Result<Self> {
        let font = Font::try_from_vec(font_data).ok_or_else(|| {
            PosecoachError::component("overlay_renderer", "Failed to parse font data")
        })?;

        Ok(Self {
            font,
            title_scale: Scale::uniform(title_size),
            line_scale: Scale::uniform(line_size),
        })
    }

    /// Render `overlay` over `base_image` and return JPEG bytes
    pub fn render(&self, overlay: &OverlayInstruction, base_image: &[u8]) -> Result<Vec<u8>> {
        let mut img = image::load_from_memory(base_image)
            .map_err(|e| {
                PosecoachError::component(
                    "overlay_renderer",
                    format!("Failed to decode frame for overlay: {}", e),
                )
            })?
            .to_rgba8();

        darken_box(&mut img, box_height(overlay));

        let white = Rgba([255, 255, 255, 255]);
        draw_text_mut(
            &mut img,
            white,
            TEXT_X,
            TITLE_BASELINE - self.title_scale.y as i32,
            self.title_scale,
            &self.font,
            &overlay.title,
        );

        for (index, line) in overlay.lines.iter().enumerate() {
            let baseline = FIRST_LINE_BASELINE + index as i32 * LINE_SPACING;
            draw_text_mut(
                &mut img,
                white,
                TEXT_X,
                baseline - self.line_scale.y as i32,
                self.line_scale,
                &self.font,
                line,
            );
        }

        let mut output = Vec::new();
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8())
            .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Jpeg)
            .map_err(|e| {
                PosecoachError::component(
                    "overlay_renderer",
                    format!("Failed to encode JPEG with overlay: {}", e),
                )
            })?;

        debug!(
            "Rendered overlay with {} lines ({} bytes)",
            overlay.lines.len(),
            output.len()
        );
        Ok(output)
    }
}

/// Halve the brightness of the box area, clipped to the image
fn darken_box(img: &mut RgbaImage, height: u32) {
    let x_end = (BOX_X + BOX_WIDTH).min(img.width());
    let y_end = (BOX_Y + height).min(img.height());

    for py in BOX_Y..y_end {
        for px in BOX_X..x_end {
            let pixel = img.get_pixel(px, py);
            img.put_pixel(
                px,
                py,
                Rgba([pixel[0] / 2, pixel[1] / 2, pixel[2] / 2, 255]),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::overlay::OverlayComposer;

    #[test]
    fn test_box_height_follows_line_count() {
        let composer = OverlayComposer::new();

        let adjust = composer.compose(&AnalysisResult::default());
        assert_eq!(box_height(&adjust), 60);

        let feedback = composer.compose(&AnalysisResult {
            feedback_items: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..AnalysisResult::default()
        });
        assert_eq!(box_height(&feedback), 130);
    }

    #[test]
    fn test_darken_box_clips_to_image() {
        let mut img = RgbaImage::from_pixel(100, 40, Rgba([200, 100, 50, 255]));
        darken_box(&mut img, 130);

        assert_eq!(img.get_pixel(50, 20), &Rgba([100, 50, 25, 255]));
        assert_eq!(img.get_pixel(5, 5), &Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_invalid_font_rejected() {
        let result = OverlayRenderer::from_font_bytes(vec![0, 1, 2, 3], 16.0, 14.0);
        assert!(result.is_err());
    }
}
