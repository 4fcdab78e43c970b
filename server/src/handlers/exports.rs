use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use idportal::CardSide;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name.replace('"', ""))
}

pub async fn card_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let export = state.portal.export_card(&id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&export.file_name)),
        ],
        export.pdf,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewParams {
    pub width: Option<u32>,
}

/// `front.png` / `back.png`; the extension is optional.
fn parse_side(raw: &str) -> Result<CardSide, AppError> {
    raw.strip_suffix(".png")
        .unwrap_or(raw)
        .parse::<CardSide>()
        .map_err(AppError::BadRequest)
}

pub async fn card_preview(
    State(state): State<AppState>,
    Path((id, side)): Path<(String, String)>,
    Query(params): Query<PreviewParams>,
) -> Result<impl IntoResponse, AppError> {
    let side = parse_side(&side)?;
    let png = state.portal.preview_card(&id, side, params.width).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

pub async fn summary_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let export = state.portal.export_summary(&id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&export.file_name)),
        ],
        export.pdf,
    ))
}
