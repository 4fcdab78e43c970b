//! Gathers the images a card needs. Every failure degrades to `None`, which
//! the layout renders as a placeholder.

use std::path::Path;

use image::RgbaImage;

use super::layout::CardAssets;
use super::qr::{fetch_external_qr, generate_qr_image, QrPayload};
use crate::config::{CardConfig, QrMode};
use crate::error::RenderError;
use crate::model::{Application, DocumentRef};
use crate::storage::DocumentStore;

const FILE_URL_PREFIX: &str = "/api/file/";

pub fn decode_image(bytes: &[u8]) -> Option<RgbaImage> {
    match image::load_from_memory(bytes) {
        Ok(image) => Some(image.to_rgba8()),
        Err(e) => {
            tracing::warn!(error = %e, "Could not decode card image");
            None
        }
    }
}

pub async fn load_image_file(path: &Path) -> Option<RgbaImage> {
    match tokio::fs::read(path).await {
        Ok(bytes) => decode_image(&bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read card image");
            None
        }
    }
}

/// Reads a stored document on the blocking pool; the store holds the
/// database lock and uses blocking file reads.
async fn from_store(store: &DocumentStore, file_id: &str, slot: &str) -> Option<RgbaImage> {
    let reader = store.clone();
    let id = file_id.to_string();
    let result = match tokio::task::spawn_blocking(move || reader.get(&id)).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(slot, error = %e, "Card document read did not finish");
            return None;
        }
    };
    match result {
        Ok(doc) => decode_image(&doc.bytes),
        Err(e) => {
            tracing::warn!(slot, file_id, error = %e, "Card document unavailable");
            None
        }
    }
}

async fn from_url(client: &reqwest::Client, url: &str, slot: &str) -> Option<RgbaImage> {
    let response = match client.get(url).send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(slot, error = %e, "Card image fetch failed");
            return None;
        }
    };
    match response.bytes().await {
        Ok(bytes) => decode_image(&bytes),
        Err(e) => {
            tracing::warn!(slot, error = %e, "Card image fetch failed");
            None
        }
    }
}

/// Resolves a document reference: stored file id first, then a local
/// `/api/file/{id}` URL, then an absolute http(s) URL.
pub async fn resolve_document(
    store: &DocumentStore,
    client: &reqwest::Client,
    doc: &DocumentRef,
    slot: &str,
) -> Option<RgbaImage> {
    if let Some(file_id) = doc.file_id.as_deref() {
        return from_store(store, file_id, slot).await;
    }

    let url = doc.url.as_deref()?.trim();
    if let Some(file_id) = url.strip_prefix(FILE_URL_PREFIX) {
        return from_store(store, file_id, slot).await;
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return from_url(client, url, slot).await;
    }

    tracing::warn!(slot, "Unsupported document reference");
    None
}

async fn resolve_qr(
    app: &Application,
    store: &DocumentStore,
    client: &reqwest::Client,
    config: &CardConfig,
) -> Option<RgbaImage> {
    if app.qr.is_present() {
        return resolve_document(store, client, &app.qr, "qr").await;
    }

    let payload = QrPayload::from_application(app);
    let result = match config.qr.mode {
        QrMode::Internal => {
            let size = config.qr.size;
            tokio::task::spawn_blocking(move || generate_qr_image(&payload, size))
                .await
                .unwrap_or_else(|e| Err(RenderError::QrCode(e.to_string())))
        }
        QrMode::External => fetch_external_qr(client, &payload, &config.qr).await,
    };
    match result {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!(error = %e, "QR code unavailable");
            None
        }
    }
}

pub async fn resolve_assets(
    app: &Application,
    store: &DocumentStore,
    client: &reqwest::Client,
    config: &CardConfig,
) -> CardAssets {
    let photo = resolve_document(store, client, &app.photo, "photo").await;
    let signature = resolve_document(store, client, &app.signature, "signature").await;
    let qr = resolve_qr(app, store, client, config).await;

    let logo = match config.logo_path.as_deref() {
        Some(path) => load_image_file(Path::new(path)).await,
        None => None,
    };
    let authority_signature = match config.authority_signature_path.as_deref() {
        Some(path) => load_image_file(Path::new(path)).await,
        None => None,
    };

    CardAssets {
        photo,
        signature,
        logo,
        authority_signature,
        qr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::model::Upload;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_resolves_stored_documents_and_internal_qr() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path(), Database::open_in_memory().unwrap());
        let photo_id = store
            .put(&Upload::new("p.png", Some("image/png"), png_bytes()))
            .unwrap();
        let signature_id = store
            .put(&Upload::new("s.png", Some("image/png"), b"not an image".to_vec()))
            .unwrap();

        let app = Application {
            employee_name: "Ravi".to_string(),
            photo: DocumentRef::from_file_id(&photo_id),
            signature: DocumentRef {
                file_id: None,
                url: Some(format!("/api/file/{}", signature_id)),
            },
            ..Default::default()
        };

        let client = reqwest::Client::new();
        let assets = resolve_assets(&app, &store, &client, &CardConfig::default()).await;
        assert_eq!(assets.photo.unwrap().dimensions(), (8, 8));
        assert!(assets.signature.is_none());
        assert!(assets.qr.is_some());
        assert!(assets.logo.is_none());
    }

    #[tokio::test]
    async fn test_missing_logo_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path(), Database::open_in_memory().unwrap());
        let config = CardConfig {
            logo_path: Some("/nonexistent/logo.png".to_string()),
            ..Default::default()
        };

        let client = reqwest::Client::new();
        let assets = resolve_assets(&Application::default(), &store, &client, &config).await;
        assert!(assets.logo.is_none());
        assert!(assets.photo.is_none());
    }
}
