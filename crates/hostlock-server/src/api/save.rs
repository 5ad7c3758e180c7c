//! Save transfer handlers
//!
//! - GET  /api/save          - download the save and take the lock
//! - POST /api/save          - upload a new save and release the lock
//! - GET  /api/save/status   - read-only view of the lock record
//!
//! Downloading while someone else holds the lock answers 409 with the
//! holder's name; callers treat that as "someone else hosts this session",
//! not as a failure.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, get, post, web};
use futures::StreamExt;
use tracing::warn;

use hostlock_common::{HostlockError, MAX_IDENTIFIER_LEN, error, is_valid_name, secure_equals};
use hostlock_core::{AcquireOutcome, ReleaseOutcome, SaveFile};
use serde::Deserialize;

use crate::model::{AppState, Result};

/// Query parameters shared by fetch and submit
#[derive(Debug, Deserialize)]
pub struct SaveParams {
    pub who_are_you: String,
    pub password: String,
}

/// Query parameters for the status endpoint
#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub password: String,
}

/// Validate identity and credential; `None` means the request may proceed.
fn check_request(data: &AppState, who_are_you: &str, password: &str) -> Option<HttpResponse> {
    if who_are_you.len() > MAX_IDENTIFIER_LEN || !is_valid_name(who_are_you) {
        return Some(Result::<String>::http_response(
            400,
            error::PARAMETER_VALIDATE_ERROR.code,
            "Parameter 'who_are_you' is missing or invalid".to_string(),
            String::new(),
        ));
    }

    if password.len() > MAX_IDENTIFIER_LEN || !secure_equals(password, &data.secret) {
        return Some(Result::<String>::http_response(
            403,
            error::ACCESS_DENIED.code,
            "Provided password not valid".to_string(),
            String::new(),
        ));
    }

    None
}

fn error_response(e: HostlockError) -> HttpResponse {
    match e {
        HostlockError::SaveNotInitialized | HostlockError::BlobNotFound(_) => {
            Result::<String>::http_response(
                404,
                error::SAVE_NOT_FOUND.code,
                e.to_string(),
                String::new(),
            )
        }
        HostlockError::StorageUnavailable(_) => Result::<String>::http_response(
            503,
            error::STORAGE_ERROR.code,
            e.to_string(),
            String::new(),
        ),
        other => {
            warn!(error = %other, "Unexpected error in save handler");
            Result::<String>::http_response(
                500,
                error::SERVER_ERROR.code,
                other.to_string(),
                String::new(),
            )
        }
    }
}

fn save_file_response(file: SaveFile, previous_holder: Option<&str>) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder
        .content_type("application/octet-stream")
        .insert_header(("Save-Filename", file.name.as_str()));
    if let Some(previous) = previous_holder {
        builder.insert_header(("Previous-Holder", previous));
    }
    builder.body(file.content)
}

/// Download the current save
///
/// GET /api/save?who_are_you=<name>&password=<secret>
///
/// On success the caller becomes the lock holder and receives the save
/// bytes; the blob name travels in the `Save-Filename` header.
#[get("")]
pub async fn fetch_save(
    data: web::Data<AppState>,
    params: web::Query<SaveParams>,
) -> impl Responder {
    if let Some(response) = check_request(&data, &params.who_are_you, &params.password) {
        return response;
    }

    match data.lock_manager.acquire(&params.who_are_you).await {
        Ok(AcquireOutcome::Acquired(file)) => save_file_response(file, None),
        Ok(AcquireOutcome::ForceAcquired {
            file,
            previous_holder,
        }) => save_file_response(file, Some(&previous_holder)),
        Ok(AcquireOutcome::AlreadyLocked { holder }) => Result::<String>::http_response(
            409,
            error::SAVE_LOCKED.code,
            format!("Cannot download as save is locked by {}", holder),
            holder,
        ),
        Err(e) => error_response(e),
    }
}

/// Upload a new save and release the lock
///
/// POST /api/save?who_are_you=<name>&password=<secret>
///
/// Multipart body with a `file` part; its filename becomes the new blob
/// name. Refused with 409 when no lock is held, so a stale upload after
/// someone else already cycled the lock cannot clobber their save.
#[post("")]
pub async fn submit_save(
    data: web::Data<AppState>,
    params: web::Query<SaveParams>,
    mut payload: Multipart,
) -> impl Responder {
    if let Some(response) = check_request(&data, &params.who_are_you, &params.password) {
        return response;
    }

    let mut filename: Option<String> = None;
    let mut file_data: Vec<u8> = Vec::new();
    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => {
                warn!(error = %e, "Malformed multipart payload");
                return Result::<String>::http_response(
                    400,
                    error::PARAMETER_VALIDATE_ERROR.code,
                    "Malformed multipart payload".to_string(),
                    String::new(),
                );
            }
        };
        if let Some(content_disposition) = field.content_disposition()
            && content_disposition
                .get_name()
                .map(|n| n == "file")
                .unwrap_or(false)
        {
            filename = content_disposition.get_filename().map(|f| f.to_string());
            // A stream error here means the body broke off mid-file; the
            // partial bytes must never become the canonical save.
            while let Some(chunk) = field.next().await {
                match chunk {
                    Ok(chunk) => file_data.extend_from_slice(&chunk),
                    Err(e) => {
                        warn!(error = %e, "Upload ended before the file was complete");
                        return Result::<String>::http_response(
                            400,
                            error::PARAMETER_VALIDATE_ERROR.code,
                            "Upload ended before the file was complete".to_string(),
                            String::new(),
                        );
                    }
                }
            }
            break;
        }
    }

    let Some(filename) = filename.filter(|name| is_valid_name(name)) else {
        return Result::<String>::http_response(
            400,
            error::PARAMETER_VALIDATE_ERROR.code,
            "Uploaded file must carry a valid filename".to_string(),
            String::new(),
        );
    };

    if file_data.is_empty() {
        return Result::<String>::http_response(
            400,
            error::PARAMETER_VALIDATE_ERROR.code,
            "No file uploaded".to_string(),
            String::new(),
        );
    }

    match data
        .lock_manager
        .release(&filename, file_data.into())
        .await
    {
        Ok(ReleaseOutcome::Released) => Result::<String>::http_success(format!(
            "File '{}' uploaded successfully by '{}'",
            filename, params.who_are_you
        )),
        Ok(ReleaseOutcome::NotLocked) => Result::<String>::http_response(
            409,
            error::LOCK_NOT_HELD.code,
            "Cannot upload: no lock is currently held".to_string(),
            String::new(),
        ),
        Err(e) => error_response(e),
    }
}

/// Read-only view of the lock record
///
/// GET /api/save/status?password=<secret>
#[get("/status")]
pub async fn save_status(
    data: web::Data<AppState>,
    params: web::Query<StatusParams>,
) -> impl Responder {
    if params.password.len() > MAX_IDENTIFIER_LEN || !secure_equals(&params.password, &data.secret)
    {
        return Result::<String>::http_response(
            403,
            error::ACCESS_DENIED.code,
            "Provided password not valid".to_string(),
            String::new(),
        );
    }

    match data.lock_manager.status().await {
        Ok(record) => Result::<hostlock_persistence::LockRecord>::http_success(record),
        Err(e) => error_response(e),
    }
}
