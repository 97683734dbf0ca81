//! Keyword-categorized CSV preview

use axum::{extract::Multipart, Json};
use tracing::debug;

use tally_core::import::annotate_rows;
use tally_core::models::AnnotatedRow;

use crate::upload::read_file_field;
use crate::AppError;

/// Multipart field carrying the CSV
const FILE_FIELD: &str = "csv";

/// POST /api/upload - Return the uploaded rows with a keyword `Category` column
pub async fn upload_preview(mut multipart: Multipart) -> Result<Json<Vec<AnnotatedRow>>, AppError> {
    let file = read_file_field(&mut multipart, FILE_FIELD)
        .await?
        .ok_or_else(|| AppError::bad_request("No file uploaded"))?;

    let rows = annotate_rows(file.data.as_slice())
        .map_err(|e| AppError::internal("Error parsing CSV").with_source(e))?;

    debug!(rows = rows.len(), "Annotated CSV preview");
    Ok(Json(rows))
}
