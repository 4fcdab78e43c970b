use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};

use super::target::{Color, FontWeight, ImageFit, Rect, RenderTarget, TextStyle};
use super::text::{font_text_width, px_scale, script_runs, FontSet, TextMetrics};
use super::{CARD_HEIGHT, CARD_WIDTH};

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 0xff])
}

/// Pixel-buffer target. Card units are multiplied by `scale`.
pub struct RasterTarget<'a> {
    canvas: RgbaImage,
    scale: f32,
    fonts: &'a FontSet,
    warned_missing_font: bool,
}

impl<'a> RasterTarget<'a> {
    pub fn new(scale: u32, fonts: &'a FontSet) -> Self {
        let scale = scale.max(1);
        Self {
            canvas: RgbaImage::from_pixel(
                CARD_WIDTH * scale,
                CARD_HEIGHT * scale,
                rgba(Color::WHITE),
            ),
            scale: scale as f32,
            fonts,
            warned_missing_font: false,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// The finished raster, flattened onto white.
    pub fn finish(self) -> RgbImage {
        DynamicImage::ImageRgba8(self.canvas).to_rgb8()
    }

    fn px(&self, value: f32) -> f32 {
        value * self.scale
    }
}

impl RenderTarget for RasterTarget<'_> {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let width = self.px(rect.width).round() as u32;
        let height = self.px(rect.height).round() as u32;
        if width == 0 || height == 0 {
            return;
        }
        let area = imageproc::rect::Rect::at(
            self.px(rect.x).round() as i32,
            self.px(rect.y).round() as i32,
        )
        .of_size(width, height);
        draw_filled_rect_mut(&mut self.canvas, area, rgba(color));
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle) {
        let mut cursor = x;
        let color = rgba(style.color);

        for (script, run) in script_runs(text) {
            let Some(font) = self.fonts.font_for(script) else {
                if !self.warned_missing_font && !run.trim().is_empty() {
                    tracing::warn!(?script, "No font configured for script, skipping text");
                    self.warned_missing_font = true;
                }
                cursor += self.fonts.text_width(run, style);
                continue;
            };

            let scale = px_scale(font, self.px(style.size));
            let px_x = self.px(cursor).round() as i32;
            let px_y = self.px(y).round() as i32;
            draw_text_mut(&mut self.canvas, color, px_x, px_y, scale, font, run);
            if style.weight == FontWeight::Bold {
                let offset = (self.px(style.size) / 30.0).round().max(1.0) as i32;
                draw_text_mut(&mut self.canvas, color, px_x + offset, px_y, scale, font, run);
            }

            cursor += font_text_width(font, run, style.size);
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: Rect, fit: ImageFit) {
        let (src_w, src_h) = image.dimensions();
        let box_w = self.px(rect.width);
        let box_h = self.px(rect.height);
        if src_w == 0 || src_h == 0 || box_w < 1.0 || box_h < 1.0 {
            return;
        }

        let ratio_w = box_w / src_w as f32;
        let ratio_h = box_h / src_h as f32;

        let (placed, left, top) = match fit {
            ImageFit::Contain => {
                let ratio = ratio_w.min(ratio_h);
                let w = ((src_w as f32 * ratio).round() as u32).max(1);
                let h = ((src_h as f32 * ratio).round() as u32).max(1);
                let resized = imageops::resize(image, w, h, FilterType::CatmullRom);
                let left = self.px(rect.x) + (box_w - w as f32) / 2.0;
                let top = self.px(rect.y) + (box_h - h as f32) / 2.0;
                (resized, left, top)
            }
            ImageFit::Cover => {
                let ratio = ratio_w.max(ratio_h);
                let w = ((src_w as f32 * ratio).round() as u32).max(1);
                let h = ((src_h as f32 * ratio).round() as u32).max(1);
                let resized = imageops::resize(image, w, h, FilterType::CatmullRom);
                let crop_w = (box_w.round() as u32).min(w);
                let crop_h = (box_h.round() as u32).min(h);
                let cropped = imageops::crop_imm(
                    &resized,
                    (w - crop_w) / 2,
                    (h - crop_h) / 2,
                    crop_w,
                    crop_h,
                )
                .to_image();
                (cropped, self.px(rect.x), self.px(rect.y))
            }
        };

        imageops::overlay(
            &mut self.canvas,
            &placed,
            left.round() as i64,
            top.round() as i64,
        );
    }
}
