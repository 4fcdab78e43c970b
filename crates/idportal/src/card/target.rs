//! Drawing surface abstraction for card layouts.
//!
//! Layout code positions everything in card units (the 1012x638 base
//! canvas) and issues draw calls against a [`RenderTarget`]. The raster
//! target turns them into pixels; the recording target keeps them for
//! inspection.

use image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A `width` x `height` rect centered inside `self`.
    pub fn centered(&self, width: f32, height: f32) -> Rect {
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Pixel size in card units.
    pub size: f32,
    pub weight: FontWeight,
    pub color: Color,
}

impl TextStyle {
    pub const fn regular(size: f32, color: Color) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
            color,
        }
    }

    pub const fn bold(size: f32, color: Color) -> Self {
        Self {
            size,
            weight: FontWeight::Bold,
            color,
        }
    }
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFit {
    /// Scale to cover the box, cropping the overflow around the center.
    Cover,
    /// Scale to fit inside the box, centered.
    Contain,
}

pub trait RenderTarget {
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws one line of text with its top-left corner at (`x`, `y`).
    fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle);

    fn draw_image(&mut self, image: &RgbaImage, rect: Rect, fit: ImageFit);
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect {
        rect: Rect,
        color: Color,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    Image {
        rect: Rect,
        fit: ImageFit,
        source_size: (u32, u32),
    },
}

/// Keeps every draw call in order.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub ops: Vec<DrawOp>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    pub fn images(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl RenderTarget for RecordingTarget {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::Rect { rect, color });
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            style: *style,
        });
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: Rect, fit: ImageFit) {
        self.ops.push(DrawOp::Image {
            rect,
            fit,
            source_size: image.dimensions(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let outer = Rect::new(25.0, 25.0, 100.0, 100.0);
        assert_eq!(outer.centered(90.0, 90.0), Rect::new(30.0, 30.0, 90.0, 90.0));
    }

    #[test]
    fn test_recording_target_keeps_order() {
        let mut target = RecordingTarget::new();
        target.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        target.draw_text(1.0, 2.0, "PHOTO", &TextStyle::regular(18.0, Color::BLACK));
        target.draw_image(&RgbaImage::new(4, 3), Rect::new(0.0, 0.0, 4.0, 3.0), ImageFit::Cover);

        assert_eq!(target.ops.len(), 3);
        assert_eq!(target.texts(), vec!["PHOTO"]);
        assert!(matches!(
            target.ops[2],
            DrawOp::Image {
                source_size: (4, 3),
                ..
            }
        ));
    }
}
