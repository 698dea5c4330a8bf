use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use chrono::Local;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::layout_document;
use crate::render::pdf::{export_filename, render_pdf};
use crate::session::events::current_document;
use crate::state::AppState;

/// GET /api/v1/sessions/:id/export
///
/// Lays out and renders the current document on the blocking pool.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = current_document(&state.sessions, id)?;
    let config = state.page_config.clone();
    let now = Local::now();
    let name = document.subject_name().to_string();
    let filename = export_filename(&name, now);

    let bytes = tokio::task::spawn_blocking(move || {
        let pages = layout_document(&document, &config);
        render_pdf(&pages, &config, &name, now)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF render task failed: {e}")))??;

    info!("Session {}: exported {} ({} bytes)", id, filename, bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        bytes,
    ))
}

/// `attachment` disposition with an ASCII `filename` for older clients and the exact
/// UTF-8 name in `filename*` (RFC 6266 / RFC 5987).
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename.chars().map(ascii_fold).collect();
    let mut encoded = String::with_capacity(filename.len());
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

/// Latin letters lose their accents; anything else outside printable ASCII becomes `_`.
fn ascii_fold(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        '"' | '\\' => '_',
        c if c.is_ascii_graphic() || c == ' ' => c,
        _ => '_',
    }
}
