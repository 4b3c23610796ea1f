/// REST API routes for the bucket admin panel.
///
/// Every failure is answered with `{ "error": <message> }`: 400 for
/// missing fields, 401 for denied writes, 500 for store failures. Store
/// error details only go to the log.
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::AppState;
use crate::access::{Capability, Principal};
use crate::error::AdminError;
use crate::files::listing::{FileEntry, FolderEntry};
use crate::files::path::Category;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Turn an operation error into a response. `failure` is the message
/// shown when the store itself failed.
fn reject(failure: &str, e: AdminError) -> ApiError {
    match e {
        AdminError::Validation(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        AdminError::Auth(_) => error_response(StatusCode::UNAUTHORIZED, "Unauthorized"),
        other => {
            error!(error = %other, "{failure}");
            error_response(other.status(), failure)
        }
    }
}

/// Refuse non-owners before the request body is even looked at.
fn require_write(state: &AppState, principal: &Principal) -> Result<(), ApiError> {
    state
        .files
        .gate()
        .check(principal, Capability::Write)
        .map_err(|e| reject("Unauthorized", e))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))
}

// ─── Health ──────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Session ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    authenticated: bool,
    email: Option<String>,
    can_write: bool,
}

/// GET /api/session — Who the caller is and whether they may write.
async fn session(principal: Principal, State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let can_write = state
        .files
        .gate()
        .authorize(&principal, Capability::Write)
        .granted;

    Json(SessionResponse {
        authenticated: principal.email().is_some(),
        email: principal.email().map(str::to_string),
        can_write,
    })
}

// ─── Browsing ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "type")]
    kind: Option<String>,
    prefix: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    success: bool,
    folders: Vec<FolderEntry>,
    files: Vec<FileEntry>,
    current_path: String,
}

/// GET /api/list — One folder level. No authentication required.
async fn list(
    principal: Principal,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let category = Category::from_param(params.kind.as_deref());
    let prefix = params.prefix.unwrap_or_default();

    let view = state
        .files
        .list(&principal, category, &prefix)
        .await
        .map_err(|e| reject("Failed to list files", e))?;

    Ok(Json(ListResponse {
        success: true,
        folders: view.folders,
        files: view.files,
        current_path: prefix,
    }))
}

// ─── Mutations ───────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    url: String,
    key: String,
    file_name: String,
}

/// POST /api/upload — Multipart form with `file`, `folder` and `type`.
///
/// The whole file is buffered before it is written to the store.
async fn upload(
    principal: Principal,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    require_write(&state, &principal)?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut folder = String::new();
    let mut kind: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
                file = Some((name, content_type, bytes.to_vec()));
            }
            Some("folder") => {
                folder = field
                    .text()
                    .await
                    .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
            }
            Some("type") => {
                kind = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?,
                );
            }
            _ => {}
        }
    }

    let Some((file_name, content_type, body)) = file.filter(|(name, _, _)| !name.is_empty())
    else {
        return Err(error_response(StatusCode::BAD_REQUEST, "No file provided"));
    };

    let category = Category::from_param(kind.as_deref());
    let uploaded = state
        .files
        .upload(&principal, category, &folder, body, &file_name, &content_type)
        .await
        .map_err(|e| reject("Failed to upload file", e))?;

    Ok(Json(UploadResponse {
        success: true,
        url: uploaded.url,
        key: uploaded.key,
        file_name: uploaded.file_name,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderRequest {
    folder_name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderResponse {
    success: bool,
    folder_path: String,
    folder_name: String,
}

/// POST /api/folders — Create an empty folder marker.
async fn create_folder(
    principal: Principal,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<Json<CreateFolderResponse>, ApiError> {
    require_write(&state, &principal)?;
    let req = json_body(payload)?;

    let category = Category::from_param(req.kind.as_deref());
    let created = state
        .files
        .create_folder(&principal, category, req.folder_name.as_deref().unwrap_or_default())
        .await
        .map_err(|e| reject("Failed to create folder", e))?;

    Ok(Json(CreateFolderResponse {
        success: true,
        folder_path: created.folder_path,
        folder_name: created.folder_name,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameRequest {
    old_key: Option<String>,
    new_name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenameResponse {
    success: bool,
    new_key: String,
    new_url: String,
    new_name: String,
}

/// POST /api/rename — Copy to the new name, then delete the old key.
async fn rename(
    principal: Principal,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<RenameResponse>, ApiError> {
    require_write(&state, &principal)?;
    let req = json_body(payload)?;

    let category = Category::from_param(req.kind.as_deref());
    let renamed = state
        .files
        .rename(
            &principal,
            req.old_key.as_deref().unwrap_or_default(),
            req.new_name.as_deref().unwrap_or_default(),
            category,
        )
        .await
        .map_err(|e| reject("Failed to rename file", e))?;

    Ok(Json(RenameResponse {
        success: true,
        new_key: renamed.new_key,
        new_url: renamed.new_url,
        new_name: renamed.new_name,
    }))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    key: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
    message: &'static str,
}

/// DELETE /api/delete — Remove exactly one key.
async fn delete_object(
    principal: Principal,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    require_write(&state, &principal)?;
    let req = json_body(payload)?;

    state
        .files
        .delete(&principal, req.key.as_deref().unwrap_or_default())
        .await
        .map_err(|e| reject("Failed to delete file", e))?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully",
    }))
}

// ─── Route groups ────────────────────────────────────────

/// Liveness check, served outside the API prefix.
pub fn health_route() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Endpoints any caller may use: who am I, and what is in a folder.
pub fn browse_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(session))
        .route("/list", get(list))
}

/// Bucket mutations. Each handler checks the write capability before
/// reading its body, so uploads carry no size limit here.
pub fn mutation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload).layer(DefaultBodyLimit::disable()))
        .route("/folders", post(create_folder))
        .route("/rename", post(rename))
        .route("/delete", delete(delete_object))
}
