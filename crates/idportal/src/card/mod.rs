//! ID card rendering.
//!
//! Both sides are laid out once in card units (1012 x 638) against a
//! [`RenderTarget`]. The raster target scales that layout into pixels and
//! the exporter wraps the two rasters into a card-sized PDF.

pub mod assets;
pub mod export;
pub mod layout;
pub mod qr;
pub mod raster;
pub mod target;
pub mod text;

use std::fmt;
use std::str::FromStr;

pub use assets::resolve_assets;
pub use export::{card_file_name, export_card_pdf, preview_png, CardExport};
pub use layout::{render_side, CardAssets, CardData};
pub use qr::QrPayload;
pub use raster::RasterTarget;
pub use target::{RecordingTarget, RenderTarget};
pub use text::{ApproxMetrics, FontSet, TextMetrics};

/// Card width in layout units.
pub const CARD_WIDTH: u32 = 1012;
/// Card height in layout units.
pub const CARD_HEIGHT: u32 = 638;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardSide {
    Front,
    Back,
}

impl CardSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSide::Front => "front",
            CardSide::Back => "back",
        }
    }
}

impl fmt::Display for CardSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(CardSide::Front),
            "back" => Ok(CardSide::Back),
            other => Err(format!("Unknown card side: {}", other)),
        }
    }
}
