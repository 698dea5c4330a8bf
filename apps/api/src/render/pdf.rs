//! Writes laid-out pages as a PDF using the standard Type1 fonts.

use chrono::{DateTime, Local};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::errors::AppError;
use crate::layout::flow::{Page, PlacedLink, PlacedText, Rule};
use crate::layout::font_metrics::{PageConfig, Weight};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const RULE_WIDTH: f32 = 0.5;

/// Encodes text as WinAnsi (CP1252) bytes for the standard fonts.
///
/// Latin-1 maps directly, common typographic punctuation uses the CP1252 slots, a few
/// other characters fall back to ASCII look-alikes and anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => out.push(c as u8),
            '\u{20ac}' => out.push(0x80),
            '\u{2026}' => out.push(0x85),
            '\u{2018}' => out.push(0x91),
            '\u{2019}' => out.push(0x92),
            '\u{201c}' => out.push(0x93),
            '\u{201d}' => out.push(0x94),
            '\u{2022}' => out.push(0x95),
            '\u{2013}' => out.push(0x96),
            '\u{2014}' => out.push(0x97),
            '\u{2122}' => out.push(0x99),
            '\t' | '\n' | '\r' | '\u{2002}' | '\u{2003}' | '\u{2009}' => out.push(b' '),
            '\u{2010}' | '\u{2011}' | '\u{2212}' => out.push(b'-'),
            '\u{2192}' => out.extend_from_slice(b"->"),
            _ => out.push(b'?'),
        }
    }
    out
}

fn font_key(weight: Weight) -> &'static str {
    match weight {
        Weight::Regular => REGULAR_FONT,
        Weight::Bold => BOLD_FONT,
    }
}

fn text_operations(text: &PlacedText) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![font_key(text.weight).into(), Object::Real(text.size)],
        ),
        Operation::new("Td", vec![Object::Real(text.x), Object::Real(text.y)]),
        Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&text.text),
                StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn rule_operations(rule: &Rule) -> Vec<Operation> {
    vec![
        Operation::new("w", vec![Object::Real(RULE_WIDTH)]),
        Operation::new("m", vec![Object::Real(rule.x1), Object::Real(rule.y)]),
        Operation::new("l", vec![Object::Real(rule.x2), Object::Real(rule.y)]),
        Operation::new("S", vec![]),
    ]
}

/// URI link annotation without a visible border.
fn link_annotation(link: &PlacedLink) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            Object::Real(link.x1),
            Object::Real(link.y1),
            Object::Real(link.x2),
            Object::Real(link.y2),
        ],
        "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        "A" => dictionary! {
            "Type" => "Action",
            "S" => "URI",
            "URI" => Object::string_literal(link.uri.as_str()),
        },
    }
}

fn add_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Renders pages to PDF bytes. `title` goes into the document info dictionary.
pub fn render_pdf(
    pages: &[Page],
    config: &PageConfig,
    title: &str,
    created: DateTime<Local>,
) -> Result<Vec<u8>, AppError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = add_font(&mut doc, config.font.base_font(Weight::Regular));
    let bold_id = add_font(&mut doc, config.font.base_font(Weight::Bold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations: Vec<Operation> = page.rules.iter().flat_map(rule_operations).collect();
        operations.extend(page.texts.iter().flat_map(text_operations));

        let encoded = Content { operations }
            .encode()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode page content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let annots: Vec<Object> = page
            .links
            .iter()
            .map(|link| doc.add_object(link_annotation(link)).into())
            .collect();
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !annots.is_empty() {
            page_dict.set("Annots", annots);
        }
        let page_id = doc.add_object(page_dict);
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(config.page_width_pt),
                Object::Real(config.page_height_pt),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
        "CreationDate" => Object::string_literal(created.format("D:%Y%m%d%H%M%S").to_string()),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write PDF: {e}")))?;
    Ok(bytes)
}

/// `{Name}_{YYYY-mm-dd_HH-MM-SS}.pdf`, safe to use as a download filename.
pub fn export_filename(name: &str, timestamp: DateTime<Local>) -> String {
    let stem: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    let stem = stem.trim_matches('.');
    let stem = if stem.is_empty() { "resume" } else { stem };
    format!("{}_{}.pdf", stem, timestamp.format("%Y-%m-%d_%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::layout::flow::layout_document;
    use crate::ingest::extract::link_uris;
    use crate::layout::font_metrics::{default_page_config, StandardFont};
    use crate::models::resume::ResumeDocument;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("Ada Lovelace", at()),
            "Ada_Lovelace_2024-03-09_14-05-07.pdf"
        );
        assert_eq!(
            export_filename("  ../etc/passwd ", at()),
            "etcpasswd_2024-03-09_14-05-07.pdf"
        );
        assert_eq!(export_filename("", at()), "resume_2024-03-09_14-05-07.pdf");
        assert_eq!(
            export_filename("José  Núñez", at()),
            "José_Núñez_2024-03-09_14-05-07.pdf"
        );
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Café"), b"Caf\xe9".to_vec());
        assert_eq!(encode_win_ansi("\u{2022} a\u{2014}b"), b"\x95 a\x97b".to_vec());
        assert_eq!(encode_win_ansi("x \u{2192} y"), b"x -> y".to_vec());
        assert_eq!(encode_win_ansi("\u{4e2d}"), b"?".to_vec());
    }

    #[test]
    fn test_rendered_pdf_loads_with_expected_pages() {
        let mut doc = ResumeDocument::default();
        doc.overview.name = "Ada Lovelace".to_string();
        doc.overview.professional_summary = "Engineer.".to_string();
        doc.achievements = (0..150).map(|i| format!("Achievement {i}")).collect();

        let config = default_page_config(StandardFont::Helvetica);
        let pages = layout_document(&doc, &config);
        let bytes = render_pdf(&pages, &config, "Ada Lovelace", at()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), pages.len());
        assert!(pages.len() >= 2);
    }

    #[test]
    fn test_contact_links_are_clickable_in_export() {
        let mut doc = ResumeDocument::default();
        doc.overview.name = "Ada Lovelace".to_string();
        doc.contact_info.email = "ada@example.com".to_string();
        doc.contact_info
            .profile_links
            .insert("GitHub".to_string(), "https://github.com/ada".to_string());

        let config = default_page_config(StandardFont::Times);
        let pages = layout_document(&doc, &config);
        let bytes = render_pdf(&pages, &config, "Ada Lovelace", at()).unwrap();

        assert_eq!(
            link_uris(&bytes),
            vec!["mailto:ada@example.com", "https://github.com/ada"]
        );
    }
}
