//! Uploaded resume → plain text.
//!
//! PDFs go through `pdf-extract`; link annotations are then collected with `lopdf` and
//! appended as `[Link: uri]` lines so profile URLs hidden behind anchor text survive.
//! Anything else is read as UTF-8.

use lopdf::{Document, Object};
use tracing::{debug, info};

use crate::errors::AppError;

/// Extracts text from an uploaded file. Runs the parsers on the blocking pool; a parser
/// panic is contained there and reported as an extraction error.
pub async fn extract_text(
    file_name: &str,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    let is_pdf = is_pdf(file_name, content_type);
    let name = file_name.to_string();

    let text = tokio::task::spawn_blocking(move || {
        if is_pdf {
            extract_pdf(&bytes)
        } else {
            decode_text(&bytes)
        }
    })
    .await
    .map_err(|e| AppError::Extraction(format!("could not read '{name}': {e}")))??;

    if text.is_empty() {
        return Err(AppError::Extraction(format!(
            "no text could be extracted from '{file_name}'"
        )));
    }

    info!("Extracted {} characters from {}", text.len(), file_name);
    Ok(text)
}

fn is_pdf(file_name: &str, content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"))
        || file_name.to_ascii_lowercase().ends_with(".pdf")
}

fn decode_text(bytes: &[u8]) -> Result<String, AppError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::Extraction(format!("file is not valid UTF-8 text: {e}")))?;
    Ok(text.trim().to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, AppError> {
    let mut text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("PDF extraction error: {e}")))?
        .trim()
        .to_string();

    let links = link_uris(bytes);
    debug!("Found {} link annotations", links.len());
    for uri in links {
        text.push_str(&format!("\n[Link: {uri}]"));
    }

    Ok(text.trim().to_string())
}

/// URIs of every link annotation, in page order. Unreadable structure yields no links.
pub fn link_uris(bytes: &[u8]) -> Vec<String> {
    let Ok(doc) = Document::load_mem(bytes) else {
        return Vec::new();
    };

    let mut uris = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Ok(annots) = page.get(b"Annots").map(|o| resolve(&doc, o)) else {
            continue;
        };
        let Ok(annots) = annots.as_array() else {
            continue;
        };

        for annot in annots {
            if let Some(uri) = annotation_uri(&doc, resolve(&doc, annot)) {
                uris.push(uri);
            }
        }
    }
    uris
}

fn annotation_uri(doc: &Document, annot: &Object) -> Option<String> {
    let annot = annot.as_dict().ok()?;
    let action = resolve(doc, annot.get(b"A").ok()?).as_dict().ok()?;
    let uri = resolve(doc, action.get(b"URI").ok()?).as_str().ok()?;
    let uri = String::from_utf8_lossy(uri).trim().to_string();
    (!uri.is_empty()).then_some(uri)
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}
