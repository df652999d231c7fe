use std::path::Path as FsPath;
use std::str::FromStr;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use common::storage::BoxReader;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::bill::{BillResponse, OwnerQuery};
use crate::service::UploadBill;
use crate::state::AppState;

/// Room for the non-file multipart fields on top of the file size limit.
const FORM_OVERHEAD: u64 = 64 * 1024;

pub fn bill_upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(max_upload_size + FORM_OVERHEAD).unwrap_or(usize::MAX))
}

/// The file part of an upload, spooled to disk.
struct SpooledFile {
    filename: String,
    content_type: Option<String>,
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Bills",
    operation_id = "uploadBill",
    summary = "Upload a bill",
    description = "Stores the `file` multipart field and records it as a bill owned by `user_id`. \
        Optional fields: `name` (defaults to the filename), `category_id`, `product_id`, \
        `amount`, `due_date` (YYYY-MM-DD).",
    request_body(content_type = "multipart/form-data", description = "Bill file and metadata"),
    responses(
        (status = 201, description = "Bill created", body = BillResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_bill(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.storage.max_upload_size;
    let temp_path = std::env::temp_dir().join(format!("keepsy-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut file: Option<SpooledFile> = None;
        let mut user_id: Option<i32> = None;
        let mut name: Option<String> = None;
        let mut category_id: Option<i32> = None;
        let mut product_id: Option<i32> = None;
        let mut amount: Option<f64> = None;
        let mut due_date: Option<NaiveDate> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_size))?
        {
            let Some(field_name) = field.name().map(str::to_owned) else {
                continue;
            };
            match field_name.as_str() {
                "file" => file = Some(spool_field(field, &temp_path, max_size).await?),
                "user_id" => user_id = parse_field(&field_name, text(field).await?)?,
                "name" => name = Some(text(field).await?),
                "category_id" => category_id = parse_field(&field_name, text(field).await?)?,
                "product_id" => product_id = parse_field(&field_name, text(field).await?)?,
                "amount" => amount = parse_field(&field_name, text(field).await?)?,
                "due_date" => due_date = parse_field(&field_name, text(field).await?)?,
                _ => {} // Ignore unknown fields.
            }
        }

        let user_id = user_id.ok_or_else(|| AppError::Validation("user_id is required".into()))?;
        let file = file.ok_or_else(|| AppError::Validation("File is required".into()))?;

        let content_type = file
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| guess_content_type(&file.filename));

        let reader = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen spooled upload: {e}")))?;
        let reader: BoxReader = Box::new(reader);

        let req = UploadBill {
            user_id,
            category_id,
            product_id,
            name,
            filename: file.filename,
            content_type,
            amount,
            due_date,
        };

        Ok::<_, AppError>(state.bills.upload(reader, req).await?)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    let bill = result?;
    Ok((StatusCode::CREATED, Json(BillResponse::from(bill))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Bills",
    operation_id = "listBills",
    summary = "List a user's bills",
    description = "Returns the bills owned by `user_id`, newest first. Always an array.",
    params(OwnerQuery),
    responses(
        (status = 200, description = "Bill list", body = Vec<BillResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(user_id = query.user_id))]
pub async fn list_bills(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<OwnerQuery>,
) -> Result<Json<Vec<BillResponse>>, AppError> {
    let bills = state.bills.list_by_owner(query.user_id).await?;
    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Bills",
    operation_id = "getBill",
    summary = "Get a bill",
    params(
        ("id" = i32, Path, description = "Bill ID"),
        OwnerQuery,
    ),
    responses(
        (status = 200, description = "Bill", body = BillResponse),
        (status = 403, description = "Bill belongs to another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Bill not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(user_id = query.user_id))]
pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<OwnerQuery>,
) -> Result<Json<BillResponse>, AppError> {
    let bill = state.bills.get_for_owner(id, query.user_id).await?;
    Ok(Json(BillResponse::from(bill)))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Bills",
    operation_id = "downloadBill",
    summary = "Download a bill",
    description = "Redirects to the stored file. Depending on the storage backend the target is \
        a public URL or a time-limited signed URL.",
    params(
        ("id" = i32, Path, description = "Bill ID"),
        OwnerQuery,
    ),
    responses(
        (status = 302, description = "Redirect to the file"),
        (status = 403, description = "Bill belongs to another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Bill not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(user_id = query.user_id))]
pub async fn download_bill(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<OwnerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let location = state.bills.get_download_location(id, query.user_id).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

fn multipart_error(err: MultipartError, max_size: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit: max_size }
    } else {
        AppError::Validation(format!("Multipart error: {err}"))
    }
}

async fn text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_owned();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// Parse an optional form value. Blank values count as absent.
fn parse_field<T: FromStr>(name: &str, value: String) -> Result<Option<T>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("Invalid {name}: {value}")))
}

fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(FsPath::new(filename))
        .first_or_octet_stream()
        .to_string()
}

/// Stream the file part to `temp_path`, enforcing `max_size`.
async fn spool_field(
    mut field: Field<'_>,
    temp_path: &FsPath,
    max_size: u64,
) -> Result<SpooledFile, AppError> {
    let filename = field
        .file_name()
        .map(str::to_owned)
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let content_type = field.content_type().map(str::to_owned);

    let mut temp_file = tokio::fs::File::create(temp_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    let mut total_size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        total_size += chunk.len() as u64;
        if total_size > max_size {
            return Err(AppError::PayloadTooLarge { limit: max_size });
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    tracing::debug!(filename = %filename, bytes = total_size, "Spooled upload");
    Ok(SpooledFile {
        filename,
        content_type,
    })
}
