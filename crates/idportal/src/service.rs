//! Portal operations: submission, review, status lookup and exports.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::backend::{ApplicationBackend, ApplicationQuery, DashboardStats, SqliteBackend};
use crate::card::assets::resolve_document;
use crate::card::{
    card_file_name, export_card_pdf, preview_png, resolve_assets, CardData, CardExport, CardSide,
    FontSet,
};
use crate::config::PortalConfig;
use crate::db::Database;
use crate::error::{ConfigError, PortalError, RenderError, Result};
use crate::model::{
    file_url, map_record, same_date, Application, ApplicationForm, ApplicationStatus, RawRecord,
};
use crate::storage::{DocumentStore, StoredDocument};
use crate::summary::{build_summary_pdf, summary_file_name, SummaryExport, SummaryImages};
use crate::validation::{validate_form, validate_status_update, ValidationErrors};

/// Result of an approve/reject action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdateOutcome {
    pub success: bool,
    pub message: String,
}

/// What an applicant sees after the id + date-of-birth check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLookup {
    pub application_id: String,
    pub status: ApplicationStatus,
    pub applicant_name: String,
    pub submission_date: Option<String>,
    pub remark: Option<String>,
    pub photo_url: Option<String>,
    pub signature_url: Option<String>,
}

/// The portal service. Cheap to clone; clones share the backend, the
/// document store and the loaded fonts.
#[derive(Clone)]
pub struct Portal {
    backend: Arc<dyn ApplicationBackend>,
    store: DocumentStore,
    config: Arc<PortalConfig>,
    fonts: Arc<FontSet>,
    client: reqwest::Client,
}

impl Portal {
    pub fn new(
        backend: Arc<dyn ApplicationBackend>,
        store: DocumentStore,
        config: PortalConfig,
    ) -> Result<Self> {
        let fonts = FontSet::load(&config.card.fonts);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.card.qr.fetch_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Validation {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            backend,
            store,
            config: Arc::new(config),
            fonts: Arc::new(fonts),
            client,
        })
    }

    /// Opens the configured database and document directory and wires the
    /// SQLite backend.
    pub fn open(config: PortalConfig) -> Result<Self> {
        let db = Database::open_configured(&config.storage)?;
        let store = DocumentStore::new(config.storage.documents_path(), db.clone());
        let backend = Arc::new(SqliteBackend::new(db));
        Self::new(backend, store, config)
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Validates the form, stores its documents and creates a pending
    /// application.
    pub fn submit_application(&self, form: ApplicationForm) -> Result<Application> {
        let _span = tracing::info_span!(
            "application.submit",
            applicant_type = %form.applicant_type
        )
        .entered();

        validate_form(&form, &self.config.uploads)?;

        let documents = [
            ("photo", &form.photo),
            ("signature", &form.signature),
            ("hindiName", &form.hindi_name),
            ("hindiDesignation", &form.hindi_designation),
        ];
        let mut file_ids: Vec<(&str, String)> = Vec::new();
        for (slot, upload) in documents {
            let Some(upload) = upload.as_ref().filter(|u| !u.is_empty()) else {
                continue;
            };
            match self.store.put(upload) {
                Ok(id) => file_ids.push((slot, id)),
                Err(e) => {
                    tracing::warn!(slot, error = %e, "Document upload failed");
                    self.discard_documents(&file_ids);
                    return Err(e);
                }
            }
        }

        let record = build_record(&form, &file_ids)?;
        let created = match self.backend.create_application(record) {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!(error = %e, "Application could not be created");
                self.discard_documents(&file_ids);
                return Err(e);
            }
        };

        let application = map_record(&created);
        tracing::info!(
            application_id = %application.id,
            documents = file_ids.len(),
            "Application submitted"
        );
        Ok(application)
    }

    fn discard_documents(&self, file_ids: &[(&str, String)]) {
        for (_, id) in file_ids {
            if let Err(e) = self.store.delete(id) {
                tracing::warn!(file_id = %id, error = %e, "Failed to remove orphaned document");
            }
        }
    }

    /// Newest first, capped by the configured listing limit.
    pub fn list_applications(&self, query: &ApplicationQuery) -> Result<Vec<Application>> {
        let max = self.config.listing.max_results;
        let query = ApplicationQuery {
            limit: Some(query.limit.map_or(max, |l| l.min(max))),
            ..query.clone()
        };
        let records = self.backend.list_applications(&query)?;
        Ok(records.iter().map(map_record).collect())
    }

    pub fn get_application(&self, id: &str) -> Result<Option<Application>> {
        Ok(self.backend.get_application(id)?.map(|r| map_record(&r)))
    }

    fn require_application(&self, id: &str) -> Result<Application> {
        self.get_application(id)?
            .ok_or_else(|| PortalError::NotFound { id: id.to_string() })
    }

    /// [`Self::require_application`] on the blocking pool, for async callers.
    async fn load_application(&self, id: &str) -> Result<Application> {
        let portal = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || portal.require_application(&id))
            .await
            .map_err(|e| PortalError::Task(e.to_string()))?
    }

    /// Approves or rejects a pending application.
    pub fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
        remark: Option<&str>,
    ) -> Result<StatusUpdateOutcome> {
        let _span =
            tracing::info_span!("application.status", application_id = %id, status = %status)
                .entered();

        validate_status_update(status, remark)?;

        let current = self.require_application(id)?;
        if !current.status.can_transition_to(status) {
            return Err(PortalError::InvalidTransition {
                from: current.status.to_string(),
                to: status.to_string(),
            });
        }

        let remark = match status {
            ApplicationStatus::Rejected => remark.map(str::trim),
            _ => None,
        };
        if !self.backend.update_status(id, current.status, status, remark)? {
            // Someone else moved it first.
            let latest = self.require_application(id)?;
            return Err(PortalError::InvalidTransition {
                from: latest.status.to_string(),
                to: status.to_string(),
            });
        }

        tracing::info!("Application status updated");
        Ok(StatusUpdateOutcome {
            success: true,
            message: format!("Application {} successfully.", status),
        })
    }

    /// Two-factor lookup: the application id plus a date of birth that must
    /// match the stored one by calendar date.
    pub fn get_application_status(&self, id: &str, date_of_birth: &str) -> Result<StatusLookup> {
        let id = id.trim();
        let mut errors = ValidationErrors::new();
        if id.is_empty() {
            errors.push("applicationId", "Application ID is required");
        }
        if date_of_birth.trim().is_empty() {
            errors.push("dateOfBirth", "Date of Birth is required");
        }
        errors.into_result()?;

        let _span = tracing::info_span!("application.lookup", application_id = %id).entered();
        let app = self.require_application(id)?;
        if !same_date(date_of_birth, &app.date_of_birth) {
            tracing::info!("Date of birth did not match");
            return Err(PortalError::DateOfBirthMismatch);
        }

        Ok(StatusLookup {
            application_id: app.id,
            status: app.status,
            applicant_name: app.employee_name,
            submission_date: app.application_date,
            remark: app.remark,
            photo_url: app.photo.url,
            signature_url: app.signature.url,
        })
    }

    pub fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.backend.status_counts()
    }

    pub fn document(&self, file_id: &str) -> Result<StoredDocument> {
        self.store.get(file_id)
    }

    /// Renders both card sides and wraps them into the print PDF.
    pub async fn export_card(&self, id: &str) -> Result<CardExport> {
        let span = tracing::info_span!("card.export", application_id = %id);
        async {
            let app = self.load_application(id).await?;
            let card = &self.config.card;
            let assets = resolve_assets(&app, &self.store, &self.client, card).await;
            let data = CardData::from_application(&app, card);

            let fonts = Arc::clone(&self.fonts);
            let scale = card.render_scale;
            let quality = card.jpeg_quality;
            let pdf = tokio::task::spawn_blocking(move || {
                export_card_pdf(&data, &assets, &fonts, scale, quality)
            })
            .await
            .map_err(|e| RenderError::PdfAssembly(e.to_string()))??;

            tracing::info!(bytes = pdf.len(), "Card exported");
            Ok(CardExport {
                file_name: card_file_name(&card.file_name_prefix, &app.employee_name),
                pdf,
            })
        }
        .instrument(span)
        .await
    }

    /// One card side as a PNG preview. `width` defaults to the configured
    /// preview width.
    pub async fn preview_card(
        &self,
        id: &str,
        side: CardSide,
        width: Option<u32>,
    ) -> Result<Vec<u8>> {
        let span = tracing::info_span!("card.preview", application_id = %id, side = %side);
        async {
            let app = self.load_application(id).await?;
            let card = &self.config.card;
            let assets = resolve_assets(&app, &self.store, &self.client, card).await;
            let data = CardData::from_application(&app, card);

            let fonts = Arc::clone(&self.fonts);
            let width = width.unwrap_or(card.preview_width);
            let png = tokio::task::spawn_blocking(move || {
                preview_png(side, &data, &assets, &fonts, width)
            })
            .await
            .map_err(|e| RenderError::ImageEncoding(e.to_string()))??;
            Ok(png)
        }
        .instrument(span)
        .await
    }

    /// Multi-page application summary.
    pub async fn export_summary(&self, id: &str) -> Result<SummaryExport> {
        let span = tracing::info_span!("summary.export", application_id = %id);
        async {
            let app = self.load_application(id).await?;
            let images = SummaryImages {
                photo: resolve_document(&self.store, &self.client, &app.photo, "photo").await,
                signature: resolve_document(&self.store, &self.client, &app.signature, "signature")
                    .await,
            };
            let title = self.config.card.header.organisation_english.clone();
            let file_name = summary_file_name(&app.id);

            let pdf = tokio::task::spawn_blocking(move || {
                build_summary_pdf(&app, &images, &title)
            })
            .await
            .map_err(|e| RenderError::PdfAssembly(e.to_string()))??;

            tracing::info!(bytes = pdf.len(), "Summary exported");
            Ok(SummaryExport { file_name, pdf })
        }
        .instrument(span)
        .await
    }
}

/// The stored shape of a new application.
fn build_record(form: &ApplicationForm, file_ids: &[(&str, String)]) -> Result<RawRecord> {
    let mut record = RawRecord::new();
    let mut put = |key: &str, value: &str| {
        record.insert(key.to_string(), Value::String(value.trim().to_string()));
    };

    put("applicantType", form.applicant_type.as_str());
    put("employeeName", &form.employee_name);
    put("designation", &form.designation);
    put("employeeNo", &form.employee_no);
    put("ruidNo", &form.ruid_no);
    put("dateOfBirth", &form.date_of_birth);
    put("department", &form.department);
    put("station", &form.station);
    put("billUnit", &form.bill_unit);
    put("residentialAddress", &form.residential_address);
    put("rlyContactNumber", &form.rly_contact_number);
    put("mobileNumber", &form.mobile_number);
    put("reasonForApplication", &form.reason_for_application);
    put("emergencyContactName", &form.emergency_contact_name);
    put("emergencyContactNumber", &form.emergency_contact_number);
    put("status", ApplicationStatus::Pending.label());
    put("applicationDate", &Utc::now().to_rfc3339());

    for (slot, id) in file_ids {
        put(&format!("{}FileId", slot), id);
        put(&format!("{}Url", slot), &file_url(id));
    }

    let family = serde_json::to_string(&form.family_members)
        .map_err(crate::db::DatabaseError::from)?;
    record.insert("familyMembersJson".to_string(), Value::String(family));

    Ok(record)
}
