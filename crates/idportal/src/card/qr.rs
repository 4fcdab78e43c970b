//! QR payload and image sources.

use std::time::Duration;

use image::{Luma, RgbaImage};
use qrcode::QrCode;
use serde::Serialize;

use crate::config::QrConfig;
use crate::error::RenderError;
use crate::model::Application;

/// Fields encoded in the card's QR code, in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pf_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl QrPayload {
    pub fn from_application(app: &Application) -> Self {
        Self {
            name: non_empty(&app.employee_name),
            pf_number: app.identity_number().map(str::to_string),
            designation: non_empty(&app.designation),
            date_of_birth: non_empty(&app.date_of_birth),
            station: non_empty(&app.station),
            department: non_empty(&app.department),
        }
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        serde_json::to_string(self).map_err(|e| RenderError::QrCode(e.to_string()))
    }
}

/// Encodes the payload locally into a black-on-white square of roughly
/// `size` pixels.
pub fn generate_qr_image(payload: &QrPayload, size: u32) -> Result<RgbaImage, RenderError> {
    let data = payload.to_json()?;
    let code = QrCode::new(data.as_bytes()).map_err(|e| RenderError::QrCode(e.to_string()))?;
    let luma = code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .quiet_zone(true)
        .build();
    Ok(image::DynamicImage::ImageLuma8(luma).to_rgba8())
}

/// URL of the public QR endpoint for this payload.
pub fn external_qr_url(
    payload: &QrPayload,
    config: &QrConfig,
) -> Result<reqwest::Url, RenderError> {
    let data = payload.to_json()?;
    let size = format!("{0}x{0}", config.size);
    reqwest::Url::parse_with_params(
        &config.endpoint,
        [("size", size.as_str()), ("data", data.as_str())],
    )
    .map_err(|e| RenderError::QrCode(format!("Invalid QR endpoint: {}", e)))
}

/// Fetches the QR image from the public endpoint.
pub async fn fetch_external_qr(
    client: &reqwest::Client,
    payload: &QrPayload,
    config: &QrConfig,
) -> Result<RgbaImage, RenderError> {
    let url = external_qr_url(payload, config)?;
    let response = client
        .get(url)
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| RenderError::QrCode(format!("QR fetch failed: {}", e)))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| RenderError::QrCode(format!("QR fetch failed: {}", e)))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| RenderError::QrCode(format!("QR image undecodable: {}", e)))?;
    Ok(image.to_rgba8())
}
