//! HTTP handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Form, Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::Session;
use crate::margin::PolicyForm;
use crate::pdf::apply_margins_to_bytes;
use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Liveness message
pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "PDF Margin API is running. Use /upload/ to modify a PDF."
    }))
}

/// Name of the returned attachment, built from the uploaded file name
///
/// Directory components are dropped and anything that is not printable ASCII
/// is replaced so the name is always a valid header value.
pub fn download_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("document.pdf");

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '"' | ';' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!("modified_{}", cleaned)
}

/// Rewrite page margins of an uploaded PDF
///
/// The policy is parsed before the document is touched, so malformed policy
/// input never reaches the PDF layer.
pub async fn upload(
    mut multipart: Multipart,
) -> Result<([(header::HeaderName, String); 2], Vec<u8>), ApiError> {
    let mut form = PolicyForm::default();
    let mut mode_seen = false;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                file = Some((file_name, field.bytes().await?));
            }
            "mode" => {
                form.mode = field.text().await?;
                mode_seen = true;
            }
            "margins" => form.margins = field.text().await?,
            "margins_odd" => form.margins_odd = field.text().await?,
            "margins_even" => form.margins_even = field.text().await?,
            "selected_pages" => form.selected_pages = field.text().await?,
            "group_margins" => form.group_margins = field.text().await?,
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }

    if !mode_seen {
        return Err(ApiError::InvalidRequest("Missing form field: mode".into()));
    }
    let (file_name, pdf) =
        file.ok_or_else(|| ApiError::InvalidRequest("Missing form field: file".into()))?;

    let policy = form.to_policy()?;
    info!(file = %file_name, mode = %form.mode, bytes = pdf.len(), "processing upload");

    let output = tokio::task::spawn_blocking(move || apply_margins_to_bytes(&pdf, &policy))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", download_name(&file_name)),
            ),
        ],
        output,
    ))
}

/// Text form fields, sent either url-encoded or as multipart
pub struct FormFields(pub HashMap<String, String>);

impl FormFields {
    pub fn require(&self, name: &str) -> Result<&str, ApiError> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Missing form field: {}", name)))
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
            return Ok(Self(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            if let Some(name) = field.name().map(str::to_string) {
                fields.insert(name, field.text().await?);
            }
        }
        Ok(Self(fields))
    }
}

/// Check credentials and issue a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .users
        .login(fields.require("username")?, fields.require("password")?)
        .await?;
    Ok(Json(session))
}

/// Invalidate a session token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<Json<Value>, ApiError> {
    let username = state.users.logout(fields.require("token")?).await?;
    Ok(Json(json!({
        "message": "Logged out",
        "username": username,
    })))
}
