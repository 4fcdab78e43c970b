//! Front and back card layouts on the 1012x638 base canvas.

use image::RgbaImage;

use super::target::{Color, ImageFit, Rect, RenderTarget, TextStyle};
use super::text::{truncate_to_width, wrap_text, TextMetrics};
use super::{CardSide, CARD_HEIGHT, CARD_WIDTH};
use crate::config::{CardConfig, CardHeader};
use crate::model::{format_display_date, Application, NOT_AVAILABLE};

const W: f32 = CARD_WIDTH as f32;
const H: f32 = CARD_HEIGHT as f32;

const TEAL: Color = Color::rgb(0x00, 0xA5, 0xB4);
const NAVY: Color = Color::rgb(0x00, 0x4B, 0x85);
const PHOTO_BG: Color = Color::rgb(0xe6, 0xf7, 0xff);
const LOGO_BG: Color = Color::rgb(0xf9, 0xf9, 0xf9);
const GREY: Color = Color::rgb(0x88, 0x88, 0x88);
const LIGHT_GREY: Color = Color::rgb(0xcc, 0xcc, 0xcc);
const NOTICE_GREY: Color = Color::rgb(0x66, 0x66, 0x66);

const LOGO_BOX: Rect = Rect::new(25.0, 25.0, 100.0, 100.0);
const PHOTO_BOX: Rect = Rect::new(25.0, 255.0, 120.0, 150.0);
const QR_BOX: Rect = Rect::new(W - 48.0 - 160.0, H - 35.0 - 160.0, 160.0, 160.0);

const DETAILS_X: f32 = 170.0;
const DETAILS_TOP: f32 = 255.0;
const DETAIL_ROW_PITCH: f32 = 41.0;
const NAME_MAX_WIDTH: f32 = 500.0;

const SIGNATURE_BLOCK_WIDTH: f32 = 240.0;
const SIGNATURE_MARGIN: f32 = 25.0;

const FAMILY_X: f32 = 48.0;
const FAMILY_TOP: f32 = 75.0;
const FAMILY_MAX_WIDTH: f32 = 700.0;
const FAMILY_SIZE: f32 = 19.0;
const FAMILY_LINE_HEIGHT: f32 = FAMILY_SIZE * 1.7;
const FAMILY_MEMBER_GAP: f32 = 4.0;
const EMERGENCY_GAP: f32 = 12.0;
const ADDRESS_GAP: f32 = 8.0;
const NOTICE_MAX_WIDTH: f32 = 650.0;
const NOTICE_SIZE: f32 = 15.0;
const NOTICE_LINE_HEIGHT: f32 = NOTICE_SIZE * 1.3;

/// Printable card values derived from one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardData {
    /// First three words of the name, uppercased.
    pub display_name: String,
    pub designation: String,
    pub identity_number: String,
    pub station: String,
    pub date_of_birth: String,
    pub department_english: String,
    pub department_hindi: String,
    pub serial_line: String,
    pub family_lines: Vec<String>,
    pub emergency_phone: String,
    pub address: String,
    pub header: CardHeader,
}

fn or_na(value: &str) -> String {
    match value.trim() {
        "" => NOT_AVAILABLE.to_string(),
        v => v.to_string(),
    }
}

/// First three whitespace-separated words, uppercased; "N/A" when empty.
pub fn display_name(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().take(3).collect();
    if words.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        words.join(" ").to_uppercase()
    }
}

impl CardData {
    pub fn from_application(app: &Application, config: &CardConfig) -> Self {
        let department = app.department.trim().to_uppercase();
        let department_hindi = config
            .department_label_hindi(&department)
            .map(str::to_string)
            .unwrap_or_else(|| or_na(&department));

        let family_lines = app
            .family_members
            .iter()
            .map(|fm| {
                [
                    or_na(&fm.name),
                    or_na(&fm.relationship),
                    format_display_date(fm.date_of_birth.as_deref().unwrap_or_default()),
                    or_na(&fm.blood_group),
                ]
                .join(" | ")
            })
            .collect();

        let emergency_phone = [
            app.emergency_contact_number.as_str(),
            app.mobile_number.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string();

        Self {
            display_name: display_name(&app.employee_name),
            designation: or_na(&app.designation),
            identity_number: app.identity_number().unwrap_or(NOT_AVAILABLE).to_string(),
            station: or_na(&app.station),
            date_of_birth: format_display_date(&app.date_of_birth),
            serial_line: format!("{} {}-", config.header.serial_prefix, department)
                .trim()
                .to_string(),
            department_english: or_na(&department),
            department_hindi,
            family_lines,
            emergency_phone,
            address: or_na(&app.residential_address),
            header: config.header.clone(),
        }
    }
}

/// Decoded images for one card. `None` renders the placeholder.
#[derive(Debug, Clone, Default)]
pub struct CardAssets {
    pub photo: Option<RgbaImage>,
    pub signature: Option<RgbaImage>,
    pub logo: Option<RgbaImage>,
    pub authority_signature: Option<RgbaImage>,
    pub qr: Option<RgbaImage>,
}

pub fn render_side(
    side: CardSide,
    target: &mut dyn RenderTarget,
    metrics: &dyn TextMetrics,
    data: &CardData,
    assets: &CardAssets,
) {
    match side {
        CardSide::Front => render_front(target, metrics, data, assets),
        CardSide::Back => render_back(target, metrics, data, assets),
    }
}

fn centered_text(
    target: &mut dyn RenderTarget,
    metrics: &dyn TextMetrics,
    area: Rect,
    text: &str,
    style: &TextStyle,
) {
    let width = metrics.text_width(text, style);
    let x = area.x + (area.width - width).max(0.0) / 2.0;
    let y = area.y + (area.height - style.size).max(0.0) / 2.0;
    target.draw_text(x, y, text, style);
}

fn image_or_placeholder(
    target: &mut dyn RenderTarget,
    metrics: &dyn TextMetrics,
    image: Option<&RgbaImage>,
    area: Rect,
    fit: ImageFit,
    placeholder: &str,
    placeholder_style: &TextStyle,
) {
    match image {
        Some(image) => target.draw_image(image, area, fit),
        None => centered_text(target, metrics, area, placeholder, placeholder_style),
    }
}

fn colour_bar(
    target: &mut dyn RenderTarget,
    metrics: &dyn TextMetrics,
    top: f32,
    color: Color,
    labels: [&str; 4],
) {
    let bar = Rect::new(0.0, top, W, 48.0);
    target.fill_rect(bar, color);
    let cell = W / 4.0;
    let style = TextStyle::bold(18.0, Color::WHITE);
    for (i, label) in labels.iter().enumerate() {
        let area = Rect::new(cell * i as f32, top, cell, 48.0);
        centered_text(target, metrics, area, label, &style);
    }
}

fn signature_block(
    target: &mut dyn RenderTarget,
    metrics: &dyn TextMetrics,
    left: f32,
    image: Option<&RgbaImage>,
    placeholder: &str,
    caption: [&str; 2],
) {
    let caption_style = TextStyle::bold(14.0, Color::BLACK);
    let caption_line = 14.0 * 1.2;
    let caption_top = H - SIGNATURE_MARGIN - caption_line * 2.0;
    let frame = Rect::new(
        left + (SIGNATURE_BLOCK_WIDTH - 140.0) / 2.0,
        caption_top - 8.0 - 40.0,
        140.0,
        40.0,
    );

    target.fill_rect(frame, Color::WHITE);
    image_or_placeholder(
        target,
        metrics,
        image,
        frame.centered(130.0, 35.0),
        ImageFit::Contain,
        placeholder,
        &TextStyle::regular(12.0, LIGHT_GREY),
    );

    for (i, line) in caption.iter().enumerate() {
        let area = Rect::new(
            left,
            caption_top + caption_line * i as f32,
            SIGNATURE_BLOCK_WIDTH,
            caption_line,
        );
        centered_text(target, metrics, area, line, &caption_style);
    }
}

pub fn render_front(
    target: &mut dyn RenderTarget,
    metrics: &dyn TextMetrics,
    data: &CardData,
    assets: &CardAssets,
) {
    target.fill_rect(Rect::new(0.0, 0.0, W, H), Color::WHITE);

    target.fill_rect(LOGO_BOX, LOGO_BG);
    image_or_placeholder(
        target,
        metrics,
        assets.logo.as_ref(),
        LOGO_BOX.centered(90.0, 90.0),
        ImageFit::Contain,
        "LOGO",
        &TextStyle::regular(18.0, GREY),
    );

    let header = &data.header;
    centered_text(
        target,
        metrics,
        Rect::new(0.0, 10.0, W, 44.0 * 1.1),
        &header.organisation_hindi,
        &TextStyle::bold(44.0, Color::BLACK),
    );
    centered_text(
        target,
        metrics,
        Rect::new(0.0, 10.0 + 44.0 * 1.1 + 12.0, W, 40.0),
        &header.organisation_english.to_uppercase(),
        &TextStyle::bold(36.0, Color::BLACK),
    );

    colour_bar(
        target,
        metrics,
        150.0,
        TEAL,
        [
            "विभाग",
            "DEPARTMENT",
            &data.department_hindi,
            &data.department_english,
        ],
    );
    colour_bar(
        target,
        metrics,
        198.0,
        NAVY,
        [
            &header.identity_card_hindi,
            &header.identity_card_english,
            &header.office_hindi,
            &data.serial_line,
        ],
    );

    target.fill_rect(PHOTO_BOX, PHOTO_BG);
    image_or_placeholder(
        target,
        metrics,
        assets.photo.as_ref(),
        PHOTO_BOX,
        ImageFit::Cover,
        "PHOTO",
        &TextStyle::regular(18.0, GREY),
    );

    let value_style = TextStyle::bold(22.0, Color::BLACK);
    let name_value = truncate_to_width(
        metrics,
        &format!(": {}", data.display_name),
        &value_style,
        NAME_MAX_WIDTH,
    );
    let rows: [(&str, &str, String); 5] = [
        ("नाम", "Name", name_value),
        ("पद नाम", "Desig", format!(": {}", data.designation)),
        ("पी.एफ.नं", "P.F.No.", format!(": {}", data.identity_number)),
        ("स्टेशन", "Station", format!(": {}", data.station)),
        ("जन्म तारीख", "D.O.B", format!(": {}", data.date_of_birth)),
    ];

    let label_style = TextStyle::bold(18.0, Color::BLACK);
    for (i, (hindi, english, value)) in rows.iter().enumerate() {
        let row = Rect::new(
            DETAILS_X,
            DETAILS_TOP + DETAIL_ROW_PITCH * i as f32,
            W - DETAILS_X - 25.0,
            33.0,
        );
        let label_y = row.y + (row.height - label_style.size) / 2.0;
        let value_y = row.y + (row.height - value_style.size) / 2.0;
        target.draw_text(row.x, label_y, hindi, &label_style);
        target.draw_text(row.x + 100.0, label_y, english, &label_style);
        target.draw_text(row.x + 200.0, value_y, value, &value_style);
    }

    signature_block(
        target,
        metrics,
        SIGNATURE_MARGIN,
        assets.signature.as_ref(),
        "SIGNATURE",
        ["कार्डधारी का हस्ताक्षर", "Signature of Card Holder"],
    );
    signature_block(
        target,
        metrics,
        W - SIGNATURE_MARGIN - SIGNATURE_BLOCK_WIDTH,
        assets.authority_signature.as_ref(),
        "AUTH SIGN",
        [
            "जारीकर्ता प्राधिकारी का हस्ताक्षर",
            "Signature of Issuing Authority",
        ],
    );
}

/// Family table rows, one group of wrapped lines per member, that fit in
/// `budget` card units. Members that do not fit are summarised in a final
/// "+N more" row.
fn fit_family_lines(
    metrics: &dyn TextMetrics,
    data: &CardData,
    style: &TextStyle,
    budget: f32,
) -> Vec<Vec<String>> {
    if data.family_lines.is_empty() {
        return vec![vec!["No family member details available".to_string()]];
    }

    let members: Vec<Vec<String>> = data
        .family_lines
        .iter()
        .map(|line| wrap_text(metrics, line, style, FAMILY_MAX_WIDTH))
        .collect();
    let more_row = FAMILY_MEMBER_GAP + FAMILY_LINE_HEIGHT;

    let mut rows = Vec::new();
    let mut used = 0.0;
    for (i, member) in members.iter().enumerate() {
        let gap = if i == 0 { 0.0 } else { FAMILY_MEMBER_GAP };
        let height = gap + FAMILY_LINE_HEIGHT * member.len() as f32;
        let reserve = if i + 1 < members.len() { more_row } else { 0.0 };
        if used + height + reserve > budget {
            let omitted = members.len() - i;
            tracing::debug!(omitted, "Family table truncated on card back");
            rows.push(vec![format!("+{} more family member(s)", omitted)]);
            break;
        }
        used += height;
        rows.push(member.clone());
    }
    rows
}

pub fn render_back(
    target: &mut dyn RenderTarget,
    metrics: &dyn TextMetrics,
    data: &CardData,
    assets: &CardAssets,
) {
    target.fill_rect(Rect::new(0.0, 0.0, W, H), Color::WHITE);

    centered_text(
        target,
        metrics,
        Rect::new(48.0, 20.0, W - 96.0, 32.0),
        "परिवार का विवरण/Details of the family",
        &TextStyle::bold(26.0, Color::BLACK),
    );

    let notice_style = TextStyle::regular(NOTICE_SIZE, NOTICE_GREY);
    let notice_lines: Vec<String> = [
        "यदि यह कार्ड मिले तो कृपया निकटतम पोस्ट बॉक्स में डाल दें।",
        "If found please drop it in the nearest Post Box",
    ]
    .iter()
    .flat_map(|line| wrap_text(metrics, line, &notice_style, NOTICE_MAX_WIDTH))
    .collect();
    let notice_top = H - 35.0 - NOTICE_LINE_HEIGHT * notice_lines.len() as f32;

    let regular = TextStyle::regular(FAMILY_SIZE, Color::BLACK);
    let bold = TextStyle::bold(FAMILY_SIZE, Color::BLACK);
    let emergency = wrap_text(
        metrics,
        &format!("Emergency Contact No. : {}", data.emergency_phone),
        &bold,
        FAMILY_MAX_WIDTH,
    );
    let address = wrap_text(
        metrics,
        &format!("घर का पता/Res.Address: {}", data.address),
        &regular,
        FAMILY_MAX_WIDTH,
    );

    // Emergency contact and address always get their lines; the family
    // table takes what is left.
    let limit = notice_top - 8.0;
    let trailing = EMERGENCY_GAP
        + ADDRESS_GAP
        + FAMILY_LINE_HEIGHT * (emergency.len() + address.len()) as f32;
    let family = fit_family_lines(metrics, data, &regular, limit - FAMILY_TOP - trailing);

    let mut blocks: Vec<(Vec<String>, &TextStyle, f32)> = family
        .into_iter()
        .enumerate()
        .map(|(i, lines)| {
            let gap = if i == 0 { 0.0 } else { FAMILY_MEMBER_GAP };
            (lines, &regular, gap)
        })
        .collect();
    blocks.push((emergency, &bold, EMERGENCY_GAP));
    blocks.push((address, &regular, ADDRESS_GAP));

    let mut y = FAMILY_TOP;
    for (lines, style, gap_before) in &blocks {
        y += gap_before;
        for line in lines {
            if y + FAMILY_LINE_HEIGHT > limit {
                tracing::warn!("Back side text does not fit, dropping a line");
                break;
            }
            let text_y = y + (FAMILY_LINE_HEIGHT - style.size) / 2.0;
            target.draw_text(FAMILY_X, text_y, line, style);
            y += FAMILY_LINE_HEIGHT;
        }
    }

    target.fill_rect(QR_BOX, Color::WHITE);
    image_or_placeholder(
        target,
        metrics,
        assets.qr.as_ref(),
        QR_BOX,
        ImageFit::Contain,
        "QR CODE",
        &TextStyle::regular(18.0, GREY),
    );

    for (i, line) in notice_lines.iter().enumerate() {
        let y = notice_top + NOTICE_LINE_HEIGHT * i as f32;
        target.draw_text(FAMILY_X, y, line, &notice_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::target::{DrawOp, RecordingTarget};
    use crate::card::text::ApproxMetrics;
    use crate::model::FamilyMember;

    fn application() -> Application {
        Application {
            employee_name: "ravi kumar sahu extra".to_string(),
            designation: "Senior Clerk".to_string(),
            employee_no: "40213".to_string(),
            station: "Khurda Road".to_string(),
            department: "Commercial".to_string(),
            date_of_birth: "1988-07-21T00:00:00.000Z".to_string(),
            mobile_number: "9876543210".to_string(),
            residential_address: "Qtr 12, Rail Vihar".to_string(),
            family_members: vec![FamilyMember {
                name: "Mina".to_string(),
                relationship: "Wife".to_string(),
                date_of_birth: Some("1990-01-05".to_string()),
                blood_group: String::new(),
                identification_marks: String::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("ravi kumar sahu extra"), "RAVI KUMAR SAHU");
        assert_eq!(display_name("  "), "N/A");
    }

    #[test]
    fn test_card_data_from_application() {
        let data = CardData::from_application(&application(), &CardConfig::default());
        assert_eq!(
            data,
            CardData::from_application(&application(), &CardConfig::default())
        );
        assert_eq!(data.display_name, "RAVI KUMAR SAHU");
        assert_eq!(data.identity_number, "40213");
        assert_eq!(data.date_of_birth, "21-07-1988");
        assert_eq!(data.department_english, "COMMERCIAL");
        assert_eq!(data.department_hindi, "व्यावसायिक");
        assert_eq!(data.serial_line, "H.Q. SI.No. COMMERCIAL-");
        assert_eq!(data.family_lines, vec!["Mina | Wife | 05-01-1990 | N/A"]);
        assert_eq!(data.emergency_phone, "9876543210");
    }

    #[test]
    fn test_missing_fields_render_na() {
        let data = CardData::from_application(&Application::default(), &CardConfig::default());
        assert_eq!(data.display_name, "N/A");
        assert_eq!(data.identity_number, "N/A");
        assert_eq!(data.date_of_birth, "N/A");
        assert_eq!(data.emergency_phone, "N/A");
        assert_eq!(data.address, "N/A");
    }

    #[test]
    fn test_front_placeholders_without_assets() {
        let data = CardData::from_application(&application(), &CardConfig::default());
        let mut target = RecordingTarget::new();
        render_front(&mut target, &ApproxMetrics, &data, &CardAssets::default());

        for placeholder in ["LOGO", "PHOTO", "SIGNATURE", "AUTH SIGN"] {
            assert!(target.has_text(placeholder), "missing {}", placeholder);
        }
        assert!(target.images().is_empty());
        assert!(target.has_text(": RAVI KUMAR SAHU"));
        assert!(target.has_text(": 21-07-1988"));
    }

    #[test]
    fn test_front_draws_photo_in_photo_box() {
        let data = CardData::from_application(&application(), &CardConfig::default());
        let assets = CardAssets {
            photo: Some(RgbaImage::new(300, 400)),
            ..Default::default()
        };
        let mut target = RecordingTarget::new();
        render_front(&mut target, &ApproxMetrics, &data, &assets);

        assert!(!target.has_text("PHOTO"));
        assert!(target.ops.iter().any(|op| matches!(
            op,
            DrawOp::Image { rect, fit: ImageFit::Cover, .. } if *rect == PHOTO_BOX
        )));
    }

    #[test]
    fn test_long_name_is_truncated() {
        let mut app = application();
        app.employee_name = "Venkata Subramanyam Ramachandramurthy".to_string();
        let data = CardData::from_application(&app, &CardConfig::default());
        let mut target = RecordingTarget::new();
        render_front(&mut target, &ApproxMetrics, &data, &CardAssets::default());

        let name = target
            .texts()
            .into_iter()
            .find(|t| t.starts_with(": VENKATA"))
            .unwrap()
            .to_string();
        assert!(name.ends_with('\u{2026}'));
        let width = ApproxMetrics.text_width(&name, &TextStyle::bold(22.0, Color::BLACK));
        assert!(width <= NAME_MAX_WIDTH);
    }

    #[test]
    fn test_back_side_contents() {
        let data = CardData::from_application(&application(), &CardConfig::default());
        let mut target = RecordingTarget::new();
        render_back(&mut target, &ApproxMetrics, &data, &CardAssets::default());

        assert!(target.has_text("Mina | Wife | 05-01-1990 | N/A"));
        assert!(target.has_text("Emergency Contact No. : 9876543210"));
        assert!(target.has_text("Res.Address: Qtr 12, Rail Vihar"));
        assert!(target.has_text("QR CODE"));
        assert!(target.has_text("If found please drop it in the nearest Post Box"));
    }

    #[test]
    fn test_back_side_without_family() {
        let mut app = application();
        app.family_members.clear();
        let data = CardData::from_application(&app, &CardConfig::default());
        let mut target = RecordingTarget::new();
        render_back(&mut target, &ApproxMetrics, &data, &CardAssets::default());

        assert!(target.has_text("No family member details available"));
    }

    #[test]
    fn test_back_side_keeps_contact_with_large_family() {
        let mut app = application();
        app.family_members = (1..=15)
            .map(|i| FamilyMember {
                name: format!("Member {}", i),
                relationship: "Son".to_string(),
                date_of_birth: Some("2010-05-06".to_string()),
                ..Default::default()
            })
            .collect();
        let data = CardData::from_application(&app, &CardConfig::default());
        let mut target = RecordingTarget::new();
        render_back(&mut target, &ApproxMetrics, &data, &CardAssets::default());

        assert!(target.has_text("Emergency Contact No. : 9876543210"));
        assert!(target.has_text("Res.Address: Qtr 12, Rail Vihar"));

        let drawn = target
            .texts()
            .iter()
            .filter(|t| t.starts_with("Member "))
            .count();
        let more = target
            .texts()
            .into_iter()
            .find_map(|t| t.strip_prefix('+'))
            .and_then(|t| t.split_whitespace().next())
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap();
        assert!(drawn > 0);
        assert_eq!(drawn + more, 15);

        let notice_y = target
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { y, text, .. } if text.starts_with("If found") => Some(*y),
                _ => None,
            })
            .unwrap();
        let address_y = target
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { y, text, .. } if text.contains("Res.Address") => Some(*y),
                _ => None,
            })
            .unwrap();
        assert!(address_y < notice_y);
    }

    #[test]
    fn test_back_side_qr_image_position() {
        let data = CardData::from_application(&application(), &CardConfig::default());
        let assets = CardAssets {
            qr: Some(RgbaImage::new(200, 200)),
            ..Default::default()
        };
        let mut target = RecordingTarget::new();
        render_back(&mut target, &ApproxMetrics, &data, &assets);

        assert_eq!(target.images(), vec![Rect::new(804.0, 443.0, 160.0, 160.0)]);
        assert!(!target.has_text("QR CODE"));
    }
}
