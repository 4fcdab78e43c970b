use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::layout::{render_side, CardAssets, CardData};
use super::raster::RasterTarget;
use super::text::FontSet;
use super::{CardSide, CARD_HEIGHT, CARD_WIDTH};
use crate::error::RenderError;

/// Card page size in points: 3.375in x 2.125in.
pub const PAGE_WIDTH_PT: f32 = 243.0;
pub const PAGE_HEIGHT_PT: f32 = 153.0;

/// A finished two-sided card.
#[derive(Debug, Clone)]
pub struct CardExport {
    pub file_name: String,
    pub pdf: Vec<u8>,
}

/// `{prefix}-{name with whitespace runs as '-'}.pdf`, `unknown` for an
/// empty name.
pub fn card_file_name(prefix: &str, employee_name: &str) -> String {
    let name = employee_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let name = if name.is_empty() { "unknown" } else { &name };
    format!("{}-{}.pdf", prefix, name)
}

pub fn render_raster(
    side: CardSide,
    data: &CardData,
    assets: &CardAssets,
    fonts: &FontSet,
    scale: u32,
) -> RgbImage {
    let _span = tracing::debug_span!("card.raster", side = side.as_str(), scale).entered();
    let mut target = RasterTarget::new(scale, fonts);
    render_side(side, &mut target, fonts, data, assets);
    target.finish()
}

fn encode_jpeg(raster: &RgbImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(raster)
        .map_err(|e| RenderError::ImageEncoding(e.to_string()))?;
    Ok(buf)
}

fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
) -> ObjectId {
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im1" => image_id,
        },
    });

    // The image covers the whole page.
    let content = format!(
        "q\n{} 0 0 {} 0 0 cm\n/Im1 Do\nQ\n",
        PAGE_WIDTH_PT, PAGE_HEIGHT_PT
    );
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH_PT.into(), PAGE_HEIGHT_PT.into()],
        "Resources" => resources_id,
        "Contents" => content_id,
    })
}

/// One page per raster, each filling a card-sized page.
pub fn assemble_card_pdf(sides: &[RgbImage], jpeg_quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(sides.len());
    for raster in sides {
        let jpeg = encode_jpeg(raster, jpeg_quality)?;
        let (width, height) = raster.dimensions();
        let page_id = add_image_page(&mut doc, pages_id, jpeg, width, height);
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::PdfAssembly(e.to_string()))?;
    Ok(buffer)
}

/// Renders front and back and returns the print PDF.
pub fn export_card_pdf(
    data: &CardData,
    assets: &CardAssets,
    fonts: &FontSet,
    scale: u32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RenderError> {
    let front = render_raster(CardSide::Front, data, assets, fonts, scale);
    let back = render_raster(CardSide::Back, data, assets, fonts, scale);
    assemble_card_pdf(&[front, back], jpeg_quality)
}

/// One side as PNG, scaled to `width` pixels wide.
pub fn preview_png(
    side: CardSide,
    data: &CardData,
    assets: &CardAssets,
    fonts: &FontSet,
    width: u32,
) -> Result<Vec<u8>, RenderError> {
    let width = width.clamp(16, CARD_WIDTH * 4);
    let scale = width.div_ceil(CARD_WIDTH).max(1);
    let raster = render_raster(side, data, assets, fonts, scale);
    let height = ((width as u64 * CARD_HEIGHT as u64) / CARD_WIDTH as u64).max(1) as u32;
    let preview = if raster.width() == width {
        raster
    } else {
        image::imageops::resize(&raster, width, height, FilterType::Triangle)
    };

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(preview)
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| RenderError::ImageEncoding(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::model::Application;

    fn data() -> CardData {
        let app = Application {
            employee_name: "Ravi Kumar".to_string(),
            ..Default::default()
        };
        CardData::from_application(&app, &CardConfig::default())
    }

    #[test]
    fn test_card_file_name() {
        assert_eq!(
            card_file_name("railway-id-card", "Ravi  Kumar\tSahu"),
            "railway-id-card-Ravi-Kumar-Sahu.pdf"
        );
        assert_eq!(card_file_name("railway-id-card", "   "), "railway-id-card-unknown.pdf");
    }

    #[test]
    fn test_export_has_two_card_sized_pages() {
        let pdf = export_card_pdf(&data(), &CardAssets::default(), &FontSet::default(), 1, 90)
            .unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        for page_id in pages.values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            let dims: Vec<f32> = media_box
                .iter()
                .map(|o| o.as_float().unwrap())
                .collect();
            assert_eq!(dims, vec![0.0, 0.0, 243.0, 153.0]);
        }
    }

    #[test]
    fn test_raster_dimensions_follow_scale() {
        let raster = render_raster(
            CardSide::Front,
            &data(),
            &CardAssets::default(),
            &FontSet::default(),
            2,
        );
        assert_eq!(raster.dimensions(), (2024, 1276));
    }

    #[test]
    fn test_preview_png_width() {
        let png = preview_png(
            CardSide::Back,
            &data(),
            &CardAssets::default(),
            &FontSet::default(),
            350,
        )
        .unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!(image.width(), 350);
        assert_eq!(image.height(), 220);
    }
}
