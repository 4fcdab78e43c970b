use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub uploads: UploadLimits,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub card: CardConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            uploads: UploadLimits::default(),
            listing: ListingConfig::default(),
            card: CardConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root for the database and documents. Defaults to `~/.idportal/data`.
    #[serde(default)]
    pub data_directory: Option<String>,
    #[serde(default = "default_database_file")]
    pub database_file: String,
    #[serde(default = "default_documents_directory")]
    pub documents_directory: String,
}

fn default_database_file() -> String {
    crate::db::DATABASE_FILE_NAME.to_string()
}

fn default_documents_directory() -> String {
    "documents".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_directory: None,
            database_file: default_database_file(),
            documents_directory: default_documents_directory(),
        }
    }
}

impl StorageConfig {
    pub fn data_directory(&self) -> PathBuf {
        match &self.data_directory {
            Some(dir) => expand_home(dir),
            None => default_data_directory().unwrap_or_else(|| PathBuf::from("data")),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_directory().join(&self.database_file)
    }

    pub fn documents_path(&self) -> PathBuf {
        let dir = PathBuf::from(&self.documents_directory);
        if dir.is_absolute() {
            dir
        } else {
            self.data_directory().join(dir)
        }
    }
}

/// Returns `~/.idportal/data`.
pub fn default_data_directory() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".idportal").join("data"))
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadLimits {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_accepted_types")]
    pub accepted_types: Vec<String>,
}

fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_accepted_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/jpg".to_string(),
        "image/png".to_string(),
    ]
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            accepted_types: default_accepted_types(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_max_results")]
    pub max_results: u64,
}

fn default_max_results() -> u64 {
    1000
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfig {
    /// Raster scale over the 1012x638 base canvas.
    #[serde(default = "default_render_scale")]
    pub render_scale: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub authority_signature_path: Option<String>,
    #[serde(default)]
    pub header: CardHeader,
    /// Hindi labels keyed by uppercased department name.
    #[serde(default = "default_department_labels")]
    pub department_labels: HashMap<String, String>,
    #[serde(default)]
    pub qr: QrConfig,
    #[serde(default = "default_file_name_prefix")]
    pub file_name_prefix: String,
}

fn default_render_scale() -> u32 {
    2
}

fn default_jpeg_quality() -> u8 {
    95
}

fn default_preview_width() -> u32 {
    350
}

fn default_department_labels() -> HashMap<String, String> {
    HashMap::from([
        ("COMMERCIAL".to_string(), "व्यावसायिक".to_string()),
        ("ELECTRICAL".to_string(), "विद्युत".to_string()),
        ("MECHANICAL".to_string(), "यांत्रिक".to_string()),
        ("ENGINEERING".to_string(), "इंजीनियरिंग".to_string()),
        ("OPERATING".to_string(), "परिचालन".to_string()),
        ("PERSONNEL".to_string(), "कार्मिक".to_string()),
        ("ACCOUNTS".to_string(), "लेखा".to_string()),
        ("MEDICAL".to_string(), "चिकित्सा".to_string()),
        ("SECURITY".to_string(), "सुरक्षा".to_string()),
    ])
}

fn default_file_name_prefix() -> String {
    "railway-id-card".to_string()
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            render_scale: default_render_scale(),
            jpeg_quality: default_jpeg_quality(),
            preview_width: default_preview_width(),
            fonts: FontConfig::default(),
            logo_path: None,
            authority_signature_path: None,
            header: CardHeader::default(),
            department_labels: default_department_labels(),
            qr: QrConfig::default(),
            file_name_prefix: default_file_name_prefix(),
        }
    }
}

impl CardConfig {
    pub fn department_label_hindi(&self, department: &str) -> Option<&str> {
        self.department_labels
            .get(&department.trim().to_uppercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontConfig {
    /// TTF/OTF used for Latin text.
    #[serde(default)]
    pub latin: Option<String>,
    /// TTF/OTF used for Devanagari text.
    #[serde(default)]
    pub devanagari: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHeader {
    #[serde(default = "default_organisation_hindi")]
    pub organisation_hindi: String,
    #[serde(default = "default_organisation_english")]
    pub organisation_english: String,
    #[serde(default = "default_identity_card_hindi")]
    pub identity_card_hindi: String,
    #[serde(default = "default_identity_card_english")]
    pub identity_card_english: String,
    #[serde(default = "default_office_hindi")]
    pub office_hindi: String,
    #[serde(default = "default_serial_prefix")]
    pub serial_prefix: String,
}

fn default_organisation_hindi() -> String {
    "पूर्व तट रेलवे".to_string()
}

fn default_organisation_english() -> String {
    "East Coast Railway".to_string()
}

fn default_identity_card_hindi() -> String {
    "पहचान पत्र".to_string()
}

fn default_identity_card_english() -> String {
    "IDENTITY CARD".to_string()
}

fn default_office_hindi() -> String {
    "प्र.का".to_string()
}

fn default_serial_prefix() -> String {
    "H.Q. SI.No.".to_string()
}

impl Default for CardHeader {
    fn default() -> Self {
        Self {
            organisation_hindi: default_organisation_hindi(),
            organisation_english: default_organisation_english(),
            identity_card_hindi: default_identity_card_hindi(),
            identity_card_english: default_identity_card_english(),
            office_hindi: default_office_hindi(),
            serial_prefix: default_serial_prefix(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrMode {
    /// Encode the payload locally.
    #[default]
    Internal,
    /// Fetch the image from the public QR endpoint.
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    #[serde(default)]
    pub mode: QrMode,
    #[serde(default = "default_qr_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_qr_size")]
    pub size: u32,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_qr_endpoint() -> String {
    "https://api.qrserver.com/v1/create-qr-code/".to_string()
}

fn default_qr_size() -> u32 {
    200
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            mode: QrMode::default(),
            endpoint: default_qr_endpoint(),
            size: default_qr_size(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}
