//! Flows a `ResumeDocument` onto fixed-size pages.
//!
//! Output is a list of pages, each holding text runs positioned in PDF user space
//! (origin bottom-left, y is the baseline) plus the rules drawn under section headings.
//! Rendering just writes these out; no measuring happens after this pass.

use serde::Serialize;

use crate::layout::font_metrics::{PageConfig, Weight};
use crate::models::resume::ResumeDocument;

const BULLET: &str = "\u{2022}";
const SECTION_SPACE_BEFORE: f32 = 8.0;
const SECTION_SPACE_AFTER: f32 = 4.0;
const ENTRY_SPACE_AFTER: f32 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedText {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub weight: Weight,
    pub size: f32,
}

/// A horizontal rule from `x1` to `x2` at height `y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
}

/// Clickable area over placed text. Coordinates bound the glyphs, `uri` is the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLink {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub texts: Vec<PlacedText>,
    pub rules: Vec<Rule>,
    pub links: Vec<PlacedLink>,
}

/// One `|`-separated piece of the contact line, optionally linked.
#[derive(Debug, Clone, PartialEq)]
struct ContactPart {
    text: String,
    uri: Option<String>,
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
}

struct Flow<'a> {
    config: &'a PageConfig,
    pages: Vec<Page>,
    cursor_y: f32,
}

impl<'a> Flow<'a> {
    fn new(config: &'a PageConfig) -> Self {
        Self {
            config,
            pages: vec![Page::default()],
            cursor_y: config.page_height_pt - config.margin_top_pt,
        }
    }

    fn left(&self) -> f32 {
        self.config.margin_left_pt
    }

    fn right(&self) -> f32 {
        self.config.page_width_pt - self.config.margin_right_pt
    }

    fn page(&mut self) -> &mut Page {
        // `pages` starts non-empty and only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn measure(&self, text: &str, weight: Weight, size: f32) -> f32 {
        self.config.font.metrics(weight).measure_str(text, size)
    }

    /// Moves to the next baseline, starting a new page when the line would cross the
    /// bottom margin. The first line of a page never breaks.
    fn advance(&mut self, line_height: f32) -> f32 {
        let top = self.config.page_height_pt - self.config.margin_top_pt;
        if self.cursor_y - line_height < self.config.margin_bottom_pt && self.cursor_y < top {
            self.pages.push(Page::default());
            self.cursor_y = top;
        }
        self.cursor_y -= line_height;
        self.cursor_y
    }

    fn space(&mut self, points: f32) {
        let top = self.config.page_height_pt - self.config.margin_top_pt;
        // Vertical space at the top of a fresh page is dropped.
        if self.cursor_y < top {
            self.cursor_y = (self.cursor_y - points).max(self.config.margin_bottom_pt);
        }
    }

    fn place(&mut self, x: f32, y: f32, text: String, weight: Weight, size: f32) {
        self.page().texts.push(PlacedText {
            x,
            y,
            text,
            weight,
            size,
        });
    }

    fn paragraph(&mut self, text: &str, weight: Weight, size: f32, indent: f32, align: Align) {
        let width = self.right() - self.left() - indent;
        let lines = self.config.font.metrics(weight).wrap(text, size, width);
        let line_height = size * self.config.leading;
        for line in lines {
            let y = self.advance(line_height);
            let x = match align {
                Align::Left => self.left() + indent,
                Align::Center => {
                    let w = self.measure(&line, weight, size);
                    self.left() + ((self.right() - self.left() - w) / 2.0).max(0.0)
                }
            };
            self.place(x, y, line, weight, size);
        }
    }

    fn bullet(&mut self, text: &str) {
        let size = self.config.bullet_size_pt;
        let indent = self.config.bullet_indent_pt;
        let width = self.right() - self.left() - indent;
        let lines = self.config.font.metrics(Weight::Regular).wrap(text, size, width);
        let line_height = size * self.config.leading;
        for (i, line) in lines.into_iter().enumerate() {
            let y = self.advance(line_height);
            if i == 0 {
                let x = self.left();
                self.place(x, y, BULLET.to_string(), Weight::Regular, size);
            }
            let x = self.left() + indent;
            self.place(x, y, line, Weight::Regular, size);
        }
    }

    fn bullets(&mut self, items: &[String]) {
        for item in items.iter().filter(|i| !i.trim().is_empty()) {
            self.bullet(item);
        }
    }

    fn heading(&mut self, title: &str) {
        let size = self.config.heading_size_pt;
        self.space(SECTION_SPACE_BEFORE);
        let y = self.advance(size * self.config.leading);
        let x = self.left();
        let width = self.measure(title, Weight::Bold, size);
        self.place(x, y, title.to_string(), Weight::Bold, size);
        self.page().rules.push(Rule {
            x1: x,
            x2: x + width,
            y: y - 1.5,
        });
        self.space(SECTION_SPACE_AFTER / 2.0);
    }

    /// Centered `|`-separated parts, packed greedily onto as few lines as fit. Linked
    /// parts get a link rectangle over their glyphs.
    fn linked_line(&mut self, parts: &[ContactPart], size: f32) {
        const SEPARATOR: &str = " | ";
        let metrics = self.config.font.metrics(Weight::Regular);
        let width = self.right() - self.left();
        let separator_width = metrics.measure_str(SEPARATOR, size);

        // A part wider than the line is wrapped into pieces that keep its link.
        let pieces = parts.iter().flat_map(|part| {
            if metrics.measure_str(&part.text, size) <= width {
                vec![part.clone()]
            } else {
                metrics
                    .wrap(&part.text, size, width)
                    .into_iter()
                    .map(|text| ContactPart {
                        text,
                        uri: part.uri.clone(),
                    })
                    .collect()
            }
        });

        let mut lines: Vec<Vec<ContactPart>> = Vec::new();
        let mut line_width = 0.0_f32;
        for piece in pieces {
            let piece_width = metrics.measure_str(&piece.text, size);
            let fits = !lines.is_empty() && line_width + separator_width + piece_width <= width;
            if fits {
                line_width += separator_width + piece_width;
                if let Some(line) = lines.last_mut() {
                    line.push(piece);
                }
            } else {
                line_width = piece_width;
                lines.push(vec![piece]);
            }
        }

        for line in lines {
            let text = line
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(SEPARATOR);
            let y = self.advance(size * self.config.leading);
            let start = self.left() + ((width - metrics.measure_str(&text, size)) / 2.0).max(0.0);

            let mut x = start;
            for (i, part) in line.iter().enumerate() {
                if i > 0 {
                    x += separator_width;
                }
                let part_width = metrics.measure_str(&part.text, size);
                if let Some(uri) = &part.uri {
                    self.page().links.push(PlacedLink {
                        x1: x,
                        y1: y - size * 0.25,
                        x2: x + part_width,
                        y2: y + size * 0.85,
                        uri: uri.clone(),
                    });
                }
                x += part_width;
            }
            self.place(start, y, text, Weight::Regular, size);
        }
    }

    /// One line with `left` flush left and `right` flush right, both bold.
    fn split_row(&mut self, left: &str, right: &str) {
        let size = self.config.body_size_pt;
        let right_width = self.measure(right, Weight::Bold, size);
        let gap = self.measure("  ", Weight::Bold, size);
        let left_width = self.right() - self.left() - right_width - gap;

        let metrics = self.config.font.metrics(Weight::Bold);
        let mut lines = metrics.wrap(left, size, left_width.max(size)).into_iter();
        let first = lines.next().unwrap_or_default();

        let y = self.advance(size * self.config.leading);
        let x = self.left();
        self.place(x, y, first, Weight::Bold, size);
        if !right.is_empty() {
            let x = self.right() - right_width;
            self.place(x, y, right.to_string(), Weight::Bold, size);
        }
        for line in lines {
            let y = self.advance(size * self.config.leading);
            let x = self.left();
            self.place(x, y, line, Weight::Bold, size);
        }
    }
}

fn non_empty(parts: &[&str]) -> Vec<String> {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Link target for a profile URL; bare hosts such as `github.com/ada` get `https://`.
fn link_target(url: &str) -> String {
    if url.contains("://") || url.starts_with("mailto:") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Contact line parts: location | phone | email | Platform: url ...
/// The email links to `mailto:` and each profile entry links to its URL.
fn contact_parts(doc: &ResumeDocument) -> Vec<ContactPart> {
    let contact = &doc.contact_info;
    let plain = |text: &str| ContactPart {
        text: text.to_string(),
        uri: None,
    };

    let mut parts: Vec<ContactPart> = non_empty(&[contact.location.as_str(), contact.phone.as_str()])
        .iter()
        .map(|t| plain(t.as_str()))
        .collect();
    let email = contact.email.trim();
    if !email.is_empty() {
        parts.push(ContactPart {
            text: email.to_string(),
            uri: Some(format!("mailto:{email}")),
        });
    }
    parts.extend(
        contact
            .profile_links
            .iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(platform, url)| ContactPart {
                text: format!("{}: {}", platform.trim(), url.trim()),
                uri: Some(link_target(url.trim())),
            }),
    );
    parts
}

/// Lays out the whole document. Sections without content are left out.
pub fn layout_document(doc: &ResumeDocument, config: &PageConfig) -> Vec<Page> {
    let mut flow = Flow::new(config);

    let name = doc.subject_name();
    if !name.is_empty() {
        flow.paragraph(
            &name.to_uppercase(),
            Weight::Bold,
            config.name_size_pt,
            0.0,
            Align::Center,
        );
        flow.space(4.0);
    }
    let contact = contact_parts(doc);
    if !contact.is_empty() {
        flow.linked_line(&contact, config.body_size_pt);
        flow.space(6.0);
    }

    let summary = doc.overview.professional_summary.trim();
    if !summary.is_empty() {
        flow.heading("OBJECTIVE");
        flow.paragraph(summary, Weight::Regular, config.bullet_size_pt, 0.0, Align::Left);
    }

    let skills = non_empty(&doc.skills.iter().map(String::as_str).collect::<Vec<_>>());
    if !skills.is_empty() {
        flow.heading("TECHNICAL SKILLS");
        flow.paragraph(
            &skills.join(", "),
            Weight::Regular,
            config.bullet_size_pt,
            0.0,
            Align::Left,
        );
    }

    if !doc.work_experience.is_empty() {
        flow.heading("WORK EXPERIENCE");
        for job in &doc.work_experience {
            flow.split_row(job.company.trim(), job.duration.trim());
            let title = non_empty(&[job.title.as_str(), job.location.as_str()]).join(" | ");
            if !title.is_empty() {
                flow.paragraph(&title, Weight::Regular, config.body_size_pt, 0.0, Align::Left);
            }
            flow.bullets(&job.description);
            flow.space(ENTRY_SPACE_AFTER);
        }
    }

    if !doc.projects.is_empty() {
        flow.heading("PROJECTS");
        for project in &doc.projects {
            let technologies = non_empty(
                &project
                    .technologies
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>(),
            );
            let title = if technologies.is_empty() {
                project.name.trim().to_string()
            } else {
                format!("{} | {}", project.name.trim(), technologies.join(", "))
            };
            flow.paragraph(&title, Weight::Bold, config.body_size_pt, 0.0, Align::Left);
            flow.bullets(&project.description);
            flow.space(ENTRY_SPACE_AFTER);
        }
    }

    if !doc.education.is_empty() {
        flow.heading("EDUCATION");
        for edu in &doc.education {
            let mut line = non_empty(&[edu.institution.as_str(), edu.degree.as_str()]).join(" - ");
            if !edu.duration.trim().is_empty() {
                line = format!("{line} | {}", edu.duration.trim());
            }
            flow.paragraph(&line, Weight::Regular, config.body_size_pt, 0.0, Align::Left);
        }
    }

    if doc.achievements.iter().any(|a| !a.trim().is_empty()) {
        flow.heading("ACHIEVEMENTS");
        flow.bullets(&doc.achievements);
    }

    if !doc.certifications.is_empty() {
        flow.heading("CERTIFICATIONS");
        let items: Vec<String> = doc
            .certifications
            .iter()
            .map(|cert| {
                if cert.issuer.trim().is_empty() {
                    cert.name.trim().to_string()
                } else {
                    format!("{} ({})", cert.name.trim(), cert.issuer.trim())
                }
            })
            .collect();
        flow.bullets(&items);
    }

    flow.pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{default_page_config, StandardFont};
    use crate::models::resume::{Certification, Education, Project, WorkExperience};

    fn sample() -> ResumeDocument {
        let mut doc = ResumeDocument::default();
        doc.overview.name = "Ada Lovelace".to_string();
        doc.overview.professional_summary = "Engineer focused on analytical engines.".to_string();
        doc.contact_info.location = "London".to_string();
        doc.contact_info.email = "ada@example.com".to_string();
        doc.contact_info
            .profile_links
            .insert("GitHub".to_string(), "https://github.com/ada".to_string());
        doc.contact_info
            .profile_links
            .insert("Portfolio".to_string(), String::new());
        doc.skills = vec!["Rust".to_string(), "Python".to_string()];
        doc.work_experience = vec![WorkExperience {
            title: "Engineer".to_string(),
            company: "Babbage & Co".to_string(),
            duration: "1842 - 1843".to_string(),
            location: "London".to_string(),
            description: vec!["Wrote the first published algorithm.".to_string()],
        }];
        doc.projects = vec![Project {
            name: "Engine".to_string(),
            technologies: vec!["Rust".to_string(), "Axum".to_string()],
            description: vec!["Built it.".to_string()],
            ..Project::default()
        }];
        doc.education = vec![Education {
            degree: "Mathematics".to_string(),
            institution: "Home".to_string(),
            duration: "1830".to_string(),
        }];
        doc.certifications = vec![Certification {
            name: "Analyst".to_string(),
            issuer: "Royal Society".to_string(),
            ..Certification::default()
        }];
        doc
    }

    fn config() -> PageConfig {
        default_page_config(StandardFont::Times)
    }

    /// All text on the page in drawing order, one run per line.
    fn plain_text(page: &Page) -> String {
        page.texts
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_sections_in_order() {
        let pages = layout_document(&sample(), &config());
        assert_eq!(pages.len(), 1);
        let text = plain_text(&pages[0]);

        let order = [
            "ADA LOVELACE",
            "London | ada@example.com | GitHub: https://github.com/ada",
            "OBJECTIVE",
            "TECHNICAL SKILLS",
            "Rust, Python",
            "WORK EXPERIENCE",
            "Babbage & Co",
            "1842 - 1843",
            "Engineer | London",
            "PROJECTS",
            "Engine | Rust, Axum",
            "EDUCATION",
            "Home - Mathematics | 1830",
            "CERTIFICATIONS",
            "Analyst (Royal Society)",
        ];
        let mut from = 0;
        for needle in order {
            let at = text[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("'{needle}' missing or out of order"));
            from += at;
        }
        assert!(!text.contains("ACHIEVEMENTS"));
    }

    #[test]
    fn test_empty_document_has_one_blank_page() {
        let pages = layout_document(&ResumeDocument::default(), &config());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].texts.is_empty());
    }

    #[test]
    fn test_duration_is_right_aligned() {
        let config = config();
        let pages = layout_document(&sample(), &config);
        let duration = pages[0]
            .texts
            .iter()
            .find(|t| t.text == "1842 - 1843")
            .unwrap();
        let company = pages[0]
            .texts
            .iter()
            .find(|t| t.text == "Babbage & Co")
            .unwrap();
        let width = config
            .font
            .metrics(Weight::Bold)
            .measure_str(&duration.text, duration.size);
        assert!((duration.x + width - (config.page_width_pt - config.margin_right_pt)).abs() < 0.01);
        assert_eq!(duration.y, company.y);
    }

    #[test]
    fn test_long_documents_flow_onto_more_pages() {
        let mut doc = sample();
        doc.achievements = (0..120)
            .map(|i| format!("Achievement number {i} with enough words to matter."))
            .collect();
        let config = config();
        let pages = layout_document(&doc, &config);
        assert!(pages.len() >= 2);

        for page in &pages {
            for text in &page.texts {
                assert!(text.y >= config.margin_bottom_pt - 0.01);
                assert!(text.y <= config.page_height_pt - config.margin_top_pt);
                let width = config.font.metrics(text.weight).measure_str(&text.text, text.size);
                assert!(text.x + width <= config.page_width_pt - config.margin_right_pt + 0.01);
            }
        }
        let all: String = pages.iter().map(plain_text).collect::<Vec<_>>().join("\n");
        assert!(all.contains("Achievement number 119"));
    }

    #[test]
    fn test_bullet_lines_use_hanging_indent() {
        let mut doc = ResumeDocument::default();
        doc.achievements = vec!["word ".repeat(60)];
        let config = config();
        let pages = layout_document(&doc, &config);
        let bullets: Vec<_> = pages[0].texts.iter().filter(|t| t.text == BULLET).collect();
        assert_eq!(bullets.len(), 1);
        let body: Vec<_> = pages[0]
            .texts
            .iter()
            .filter(|t| t.text.starts_with("word"))
            .collect();
        assert!(body.len() > 1);
        assert!(body
            .iter()
            .all(|t| t.x == config.margin_left_pt + config.bullet_indent_pt));
    }

    #[test]
    fn test_contact_links_cover_their_text() {
        let config = config();
        let pages = layout_document(&sample(), &config);
        let links = &pages[0].links;
        let uris: Vec<_> = links.iter().map(|l| l.uri.as_str()).collect();
        assert_eq!(uris, vec!["mailto:ada@example.com", "https://github.com/ada"]);

        let line = pages[0]
            .texts
            .iter()
            .find(|t| t.text.starts_with("London | "))
            .unwrap();
        let metrics = config.font.metrics(Weight::Regular);
        let email_x = line.x + metrics.measure_str("London | ", line.size);
        assert!((links[0].x1 - email_x).abs() < 0.01);
        let email_width = metrics.measure_str("ada@example.com", line.size);
        assert!((links[0].x2 - links[0].x1 - email_width).abs() < 0.01);
        assert!(links[0].y1 < line.y && links[0].y2 > line.y);
    }

    #[test]
    fn test_bare_profile_urls_get_a_scheme() {
        let mut doc = ResumeDocument::default();
        doc.contact_info
            .profile_links
            .insert("LinkedIn".to_string(), "linkedin.com/in/ada".to_string());
        let pages = layout_document(&doc, &config());
        assert_eq!(pages[0].links[0].uri, "https://linkedin.com/in/ada");
        assert_eq!(pages[0].texts[0].text, "LinkedIn: linkedin.com/in/ada");
    }

    #[test]
    fn test_long_contact_line_wraps_between_parts() {
        let mut doc = ResumeDocument::default();
        for i in 0..8 {
            doc.contact_info.profile_links.insert(
                format!("Site{i}"),
                format!("https://example.com/profiles/ada-lovelace-{i}"),
            );
        }
        let config = config();
        let pages = layout_document(&doc, &config);
        let lines: Vec<_> = pages[0].texts.iter().collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|t| !t.text.starts_with(" | ") && !t.text.ends_with(" | ")));
        assert_eq!(pages[0].links.len(), 8);
        for link in &pages[0].links {
            assert!(link.x2 <= config.page_width_pt - config.margin_right_pt + 0.01);
        }
    }
}
