use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use idportal::{
    ApplicantType, ApplicationForm, ApplicationQuery, ApplicationStatus, FamilyMember,
    PortalError, Upload, ValidationErrors,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub applicant_type: Option<String>,
    pub status: Option<String>,
}

/// `all`, blank or absent means no filter.
fn filter_value<T>(
    raw: Option<&str>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => parse(v)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown {}: {}", name, v))),
    }
}

impl ListParams {
    pub fn to_query(&self) -> Result<ApplicationQuery, AppError> {
        Ok(ApplicationQuery {
            applicant_type: filter_value(
                self.applicant_type.as_deref(),
                "applicant type",
                ApplicantType::parse,
            )?,
            status: filter_value(self.status.as_deref(), "status", ApplicationStatus::parse)?,
            limit: None,
        })
    }
}

pub async fn list_employees(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.to_query()?;
    let employees = state
        .blocking(move |portal| portal.list_applications(&query))
        .await?;
    Ok(Json(json!({ "employees": employees })))
}

pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let application = state
        .blocking(move |portal| {
            portal
                .get_application(&id)?
                .ok_or(PortalError::NotFound { id })
        })
        .await?;
    let actions = application.available_actions();
    Ok(Json(json!({
        "success": true,
        "data": application,
        "actions": actions,
    })))
}

const FILE_FIELDS: [&str; 4] = [
    "uploadPhoto",
    "uploadSignature",
    "uploadHindiName",
    "uploadHindiDesignation",
];

/// Reads the submission form. Unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<ApplicationForm, AppError> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed form data: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if FILE_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
            if bytes.is_empty() && filename.is_empty() {
                continue;
            }
            let upload = Upload::new(filename, content_type.as_deref(), bytes.to_vec());
            match name.as_str() {
                "uploadPhoto" => form.photo = Some(upload),
                "uploadSignature" => form.signature = Some(upload),
                "uploadHindiName" => form.hindi_name = Some(upload),
                _ => form.hindi_designation = Some(upload),
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;

        match name.as_str() {
            "applicantType" => {
                form.applicant_type = ApplicantType::parse(&value).ok_or_else(|| {
                    PortalError::Validation(ValidationErrors::single(
                        "applicantType",
                        "Applicant type must be gazetted or non-gazetted",
                    ))
                })?;
            }
            "familyMembersJson" => {
                if !value.trim().is_empty() {
                    form.family_members = serde_json::from_str::<Vec<FamilyMember>>(&value)
                        .map_err(|_| {
                            PortalError::Validation(ValidationErrors::single(
                                "familyMembersJson",
                                "Family member details are not valid JSON",
                            ))
                        })?;
                }
            }
            _ => {
                form.set_field(&name, value);
            }
        }
    }

    Ok(form)
}

pub async fn submit_application(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart).await?;
    let application = state
        .blocking(move |portal| portal.submit_application(form))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": application })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    #[serde(default)]
    pub remark: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = match ApplicationStatus::parse(&request.status) {
        Some(s @ (ApplicationStatus::Approved | ApplicationStatus::Rejected)) => s,
        _ => {
            return Err(PortalError::Validation(ValidationErrors::single(
                "status",
                "Status must be approved or rejected",
            ))
            .into())
        }
    };

    let outcome = state
        .blocking(move |portal| {
            portal.update_application_status(&id, status, request.remark.as_deref())
        })
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLookupRequest {
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub date_of_birth: String,
}

pub async fn lookup_status(
    State(state): State<AppState>,
    Json(request): Json<StatusLookupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lookup = state
        .blocking(move |portal| {
            portal.get_application_status(&request.application_id, &request.date_of_birth)
        })
        .await?;
    Ok(Json(json!({ "success": true, "data": lookup })))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = state.blocking(|portal| portal.dashboard_stats()).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_all_means_unfiltered() {
        let params = ListParams {
            applicant_type: Some("all".to_string()),
            status: Some("ALL".to_string()),
        };
        assert_eq!(params.to_query().unwrap(), ApplicationQuery::default());
    }

    #[test]
    fn test_list_params_parse() {
        let params = ListParams {
            applicant_type: Some("gaz".to_string()),
            status: Some("Rejected".to_string()),
        };
        let query = params.to_query().unwrap();
        assert_eq!(query.applicant_type, Some(ApplicantType::Gazetted));
        assert_eq!(query.status, Some(ApplicationStatus::Rejected));

        let params = ListParams {
            applicant_type: None,
            status: Some("archived".to_string()),
        };
        assert!(matches!(params.to_query(), Err(AppError::BadRequest(_))));
    }
}
