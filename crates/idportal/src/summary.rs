//! Printable A4 summary of an application.
//!
//! Pages are laid out top-down with a cursor; tables break onto a new page
//! whenever the next row would cross the bottom margin.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::RenderError;
use crate::model::{
    format_display_date, format_optional_date, ApplicantType, Application, NOT_AVAILABLE,
};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 40.0;
const MM: f32 = 72.0 / 25.4;

const PHOTO_BOX: (f32, f32) = (40.0 * MM, 50.0 * MM);
const SIGNATURE_BOX: (f32, f32) = (50.0 * MM, 20.0 * MM);
const MAX_IMAGE_PX: u32 = 400;

const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 13.0;
const CELL_PADDING: f32 = 4.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

#[derive(Debug, Clone)]
pub struct SummaryExport {
    pub file_name: String,
    pub pdf: Vec<u8>,
}

pub fn summary_file_name(id: &str) -> String {
    format!("application_{}.pdf", id)
}

/// Images embedded on the cover sheet.
#[derive(Debug, Clone, Default)]
pub struct SummaryImages {
    pub photo: Option<RgbaImage>,
    pub signature: Option<RgbaImage>,
}

/// Standard Helvetica only covers Latin-1; everything else becomes `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xff { c as u32 as u8 } else { b'?' })
        .collect()
}

fn or_na(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

/// Helvetica averages about half an em per glyph.
fn approx_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

/// Greedy word wrap by estimated width. Words wider than a line are split.
fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = ((width / (size * 0.5)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed =
                line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

struct EmbeddedImage {
    name: &'static str,
    width: u32,
    height: u32,
}

fn embed_image(
    doc: &mut Document,
    image: &RgbaImage,
    name: &'static str,
) -> Result<(EmbeddedImage, ObjectId), RenderError> {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    let rgb = if longest > MAX_IMAGE_PX {
        let ratio = MAX_IMAGE_PX as f32 / longest as f32;
        let nw = ((w as f32 * ratio).round() as u32).max(1);
        let nh = ((h as f32 * ratio).round() as u32).max(1);
        DynamicImage::ImageRgba8(image::imageops::resize(image, nw, nh, FilterType::Triangle))
            .to_rgb8()
    } else {
        DynamicImage::ImageRgba8(image.clone()).to_rgb8()
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, 85)
        .encode_image(&rgb)
        .map_err(|e| RenderError::ImageEncoding(e.to_string()))?;

    let (width, height) = rgb.dimensions();
    let id = doc.add_object(Stream::new(
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
    Ok((EmbeddedImage { name, width, height }, id))
}

/// Collects operations page by page. `y` is the top of the free area in
/// PDF coordinates (origin bottom-left).
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // pages is never empty
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn text(&mut self, x: f32, baseline: f32, text: &str, size: f32, font: &str) {
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(latin1(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn centered_line(&mut self, text: &str, size: f32, font: &str) {
        self.ensure(size * 1.4);
        let x = ((PAGE_WIDTH - approx_width(text, size)) / 2.0).max(MARGIN);
        let baseline = self.y - size;
        self.text(x, baseline, text, size, font);
        self.y -= size * 1.4;
    }

    fn heading(&mut self, text: &str) {
        self.ensure(LINE_HEIGHT * 3.0);
        self.y -= 8.0;
        let baseline = self.y - 12.0;
        self.text(MARGIN, baseline, text, 12.0, BOLD);
        self.y -= 20.0;
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let ops = self.ops();
        ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), w.into(), h.into()],
        ));
        ops.push(Operation::new("S", vec![]));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, grey: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("g", vec![grey.into()]));
        ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), w.into(), h.into()],
        ));
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Draws `image` contained in the box whose top-left corner is
    /// (`x`, `top`).
    fn image_in_box(&mut self, image: &EmbeddedImage, x: f32, top: f32, w: f32, h: f32) {
        let ratio = (w / image.width as f32).min(h / image.height as f32);
        let dw = image.width as f32 * ratio;
        let dh = image.height as f32 * ratio;
        let left = x + (w - dw) / 2.0;
        let bottom = top - h + (h - dh) / 2.0;

        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                dw.into(),
                0.into(),
                0.into(),
                dh.into(),
                left.into(),
                bottom.into(),
            ],
        ));
        ops.push(Operation::new("Do", vec![image.name.into()]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Table with fixed column widths. The header row is repeated after a
    /// page break.
    fn table(
        &mut self,
        widths: &[f32],
        header: Option<&[&str]>,
        rows: &[Vec<String>],
        bold_first: bool,
    ) {
        let draw_header = |writer: &mut PageWriter| {
            if let Some(header) = header {
                let cells: Vec<String> = header.iter().map(|s| s.to_string()).collect();
                writer.row(widths, &cells, true, true);
            }
        };

        draw_header(self);
        for row in rows {
            let height = row_height(widths, row);
            if self.y - height < MARGIN {
                self.new_page();
                draw_header(self);
            }
            self.row(widths, row, false, bold_first);
        }
    }

    fn row(&mut self, widths: &[f32], cells: &[String], shaded: bool, bold_first: bool) {
        let height = row_height(widths, cells);
        self.ensure(height);
        let bottom = self.y - height;
        let mut x = MARGIN;

        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if shaded {
                self.fill_rect(x, bottom, *width, height, 0.9);
            }
            self.stroke_rect(x, bottom, *width, height);

            let font = if shaded || (bold_first && i == 0) { BOLD } else { REGULAR };
            let lines = wrap(cell, width - CELL_PADDING * 2.0, BODY_SIZE);
            for (n, line) in lines.iter().enumerate() {
                let baseline = self.y - CELL_PADDING - BODY_SIZE - LINE_HEIGHT * n as f32 + 1.0;
                self.text(x + CELL_PADDING, baseline, line, BODY_SIZE, font);
            }
            x += width;
        }

        self.y = bottom;
    }
}

fn row_height(widths: &[f32], cells: &[String]) -> f32 {
    let lines = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap(cell, width - CELL_PADDING * 2.0, BODY_SIZE).len())
        .max()
        .unwrap_or(1);
    lines as f32 * LINE_HEIGHT + CELL_PADDING * 2.0
}

fn detail_rows(app: &Application) -> Vec<Vec<String>> {
    let identifier = match app.applicant_type {
        ApplicantType::Gazetted => &app.ruid_no,
        ApplicantType::NonGazetted => &app.employee_no,
    };

    let pairs: Vec<(&str, String)> = vec![
        ("Name", or_na(&app.employee_name)),
        ("Designation", or_na(&app.designation)),
        ("Applicant Type", app.applicant_type.as_str().to_string()),
        (app.applicant_type.identifier_label(), or_na(identifier)),
        ("Date of Birth", format_display_date(&app.date_of_birth)),
        ("Department", or_na(&app.department)),
        ("Station", or_na(&app.station)),
        ("Bill Unit", or_na(&app.bill_unit)),
        ("Residential Address", or_na(&app.residential_address)),
        ("Mobile Number", or_na(&app.mobile_number)),
        ("Railway Contact", or_na(&app.rly_contact_number)),
        ("Emergency Contact Name", or_na(&app.emergency_contact_name)),
        ("Emergency Contact Number", or_na(&app.emergency_contact_number)),
        ("Reason for Application", or_na(&app.reason_for_application)),
    ];

    pairs
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value])
        .collect()
}

fn family_rows(app: &Application) -> Vec<Vec<String>> {
    app.family_members
        .iter()
        .map(|m| {
            vec![
                or_na(&m.name),
                or_na(&m.relationship),
                format_optional_date(m.date_of_birth.as_deref()),
                or_na(&m.blood_group),
                or_na(&m.identification_marks),
            ]
        })
        .collect()
}

/// Builds the summary PDF. `title` is the organisation name on the cover.
pub fn build_summary_pdf(
    app: &Application,
    images: &SummaryImages,
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let photo = images
        .photo
        .as_ref()
        .map(|img| embed_image(&mut doc, img, "Im1"))
        .transpose()?;
    let signature = images
        .signature
        .as_ref()
        .map(|img| embed_image(&mut doc, img, "Im2"))
        .transpose()?;

    let mut xobjects = lopdf::Dictionary::new();
    for (image, id) in photo.iter().chain(signature.iter()) {
        xobjects.set(image.name, *id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
        "XObject" => xobjects,
    });

    let mut writer = PageWriter::new();

    writer.centered_line(title, 18.0, BOLD);
    writer.centered_line("ID Card Application", 14.0, BOLD);
    writer.centered_line(&format!("Application ID: {}", or_na(&app.id)), BODY_SIZE, REGULAR);
    writer.centered_line(
        &format!(
            "Submitted: {}",
            format_optional_date(app.application_date.as_deref())
        ),
        BODY_SIZE,
        REGULAR,
    );
    writer.y -= 10.0;

    // Photo on the left, signature on the right, captions above each.
    let caption_baseline = writer.y - BODY_SIZE;
    let photo_x = MARGIN;
    let signature_x = PAGE_WIDTH - MARGIN - SIGNATURE_BOX.0;
    writer.text(photo_x, caption_baseline, "Photograph", BODY_SIZE, BOLD);
    writer.text(signature_x, caption_baseline, "Signature", BODY_SIZE, BOLD);
    let box_top = writer.y - LINE_HEIGHT - 4.0;

    writer.stroke_rect(photo_x, box_top - PHOTO_BOX.1, PHOTO_BOX.0, PHOTO_BOX.1);
    match &photo {
        Some((image, _)) => writer.image_in_box(image, photo_x, box_top, PHOTO_BOX.0, PHOTO_BOX.1),
        None => writer.text(
            photo_x + CELL_PADDING,
            box_top - PHOTO_BOX.1 / 2.0,
            "Could not load photo.",
            8.0,
            REGULAR,
        ),
    }

    writer.stroke_rect(signature_x, box_top - SIGNATURE_BOX.1, SIGNATURE_BOX.0, SIGNATURE_BOX.1);
    match &signature {
        Some((image, _)) => writer.image_in_box(
            image,
            signature_x,
            box_top,
            SIGNATURE_BOX.0,
            SIGNATURE_BOX.1,
        ),
        None => writer.text(
            signature_x + CELL_PADDING,
            box_top - SIGNATURE_BOX.1 / 2.0,
            "Could not load signature.",
            8.0,
            REGULAR,
        ),
    }
    writer.y = box_top - PHOTO_BOX.1 - 10.0;

    let content_width = PAGE_WIDTH - MARGIN * 2.0;
    writer.heading("Applicant Details");
    writer.table(
        &[170.0, content_width - 170.0],
        None,
        &detail_rows(app),
        true,
    );

    let family = family_rows(app);
    if !family.is_empty() {
        writer.heading("Family Members");
        let widths = [
            content_width * 0.26,
            content_width * 0.16,
            content_width * 0.16,
            content_width * 0.14,
            content_width * 0.28,
        ];
        writer.table(
            &widths,
            Some(&[
                "Name",
                "Relationship",
                "Date of Birth",
                "Blood Group",
                "Identification Marks",
            ]),
            &family,
            false,
        );
    }

    let mut kids = Vec::with_capacity(writer.pages.len());
    for operations in writer.pages {
        let content = Content { operations };
        let bytes = content
            .encode()
            .map_err(|e| RenderError::PdfAssembly(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FamilyMember;
    use image::Rgba;

    fn application() -> Application {
        Application {
            id: "a1b2".to_string(),
            employee_name: "Ravi Kumar".to_string(),
            employee_no: "40213".to_string(),
            date_of_birth: "1988-07-21".to_string(),
            application_date: Some("2024-03-01T10:00:00Z".to_string()),
            ..Default::default()
        }
    }

    fn page_count(pdf: &[u8]) -> usize {
        Document::load_mem(pdf).unwrap().get_pages().len()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(summary_file_name("a1b2"), "application_a1b2.pdf");
    }

    #[test]
    fn test_short_application_fits_one_page() {
        let pdf = build_summary_pdf(&application(), &SummaryImages::default(), "East Coast Railway")
            .unwrap();
        assert_eq!(page_count(&pdf), 1);
    }

    #[test]
    fn test_long_family_table_paginates() {
        let mut app = application();
        app.family_members = (0..80)
            .map(|i| FamilyMember {
                name: format!("Member {}", i),
                relationship: "Son".to_string(),
                date_of_birth: Some("2010-01-01".to_string()),
                blood_group: "B+".to_string(),
                identification_marks: "Mole on left cheek".to_string(),
            })
            .collect();

        let pdf = build_summary_pdf(&app, &SummaryImages::default(), "East Coast Railway").unwrap();
        assert!(page_count(&pdf) >= 2);
    }

    #[test]
    fn test_images_are_embedded_and_downscaled() {
        let images = SummaryImages {
            photo: Some(RgbaImage::from_pixel(800, 1000, Rgba([1, 2, 3, 255]))),
            signature: Some(RgbaImage::from_pixel(300, 100, Rgba([9, 9, 9, 255]))),
        };
        let pdf = build_summary_pdf(&application(), &images, "East Coast Railway").unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        let widths: Vec<i64> = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(&b"Image"[..]))
            .filter_map(|s| s.dict.get(b"Width").and_then(|v| v.as_i64()).ok())
            .collect();
        assert_eq!(widths.len(), 2);
        assert!(widths.contains(&320));
        assert!(widths.contains(&300));
    }

    #[test]
    fn test_latin1_replacement() {
        assert_eq!(latin1("Ravi é"), b"Ravi \xe9".to_vec());
        assert_eq!(latin1("रवि"), b"???".to_vec());
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghij", 20.0, 10.0);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 100.0, 10.0), vec![""]);
    }
}
