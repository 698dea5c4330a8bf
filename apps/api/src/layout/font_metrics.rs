//! Static width tables for the standard PDF fonts used by the exporter.
//!
//! Widths are the Adobe AFM advance widths in 1/1000 em for ASCII 0x20..=0x7E.
//! Index = (char as usize) - 32. Characters outside that range are measured with
//! `fallback_width`, which is close to the font's average lowercase advance.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font family / weight
// ────────────────────────────────────────────────────────────────────────────

/// Base-14 font families that every PDF reader ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardFont {
    Helvetica,
    Times,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weight {
    Regular,
    Bold,
}

impl StandardFont {
    /// PostScript name written into the font dictionary.
    pub fn base_font(self, weight: Weight) -> &'static str {
        match (self, weight) {
            (StandardFont::Helvetica, Weight::Regular) => "Helvetica",
            (StandardFont::Helvetica, Weight::Bold) => "Helvetica-Bold",
            (StandardFont::Times, Weight::Regular) => "Times-Roman",
            (StandardFont::Times, Weight::Bold) => "Times-Bold",
            (StandardFont::Courier, Weight::Regular) => "Courier",
            (StandardFont::Courier, Weight::Bold) => "Courier-Bold",
        }
    }

    pub fn metrics(self, weight: Weight) -> &'static FontMetricTable {
        match (self, weight) {
            (StandardFont::Helvetica, Weight::Regular) => &HELVETICA_TABLE,
            (StandardFont::Helvetica, Weight::Bold) => &HELVETICA_BOLD_TABLE,
            (StandardFont::Times, Weight::Regular) => &TIMES_TABLE,
            (StandardFont::Times, Weight::Bold) => &TIMES_BOLD_TABLE,
            (StandardFont::Courier, _) => &COURIER_TABLE,
        }
    }
}

impl FromStr for StandardFont {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "helvetica" => Ok(StandardFont::Helvetica),
            "times" | "times-roman" => Ok(StandardFont::Times),
            "courier" => Ok(StandardFont::Courier),
            other => Err(format!(
                "unknown font '{other}' (expected helvetica, times or courier)"
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Page geometry and type sizes for export. All lengths are in PDF points (1/72 in).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub font: StandardFont,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margin_left_pt: f32,
    pub margin_right_pt: f32,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
    pub name_size_pt: f32,
    pub heading_size_pt: f32,
    pub body_size_pt: f32,
    pub bullet_size_pt: f32,
    /// Line height as a multiple of the font size.
    pub leading: f32,
    /// Hanging indent for bullet text.
    pub bullet_indent_pt: f32,
}

impl PageConfig {
    pub fn text_width_pt(&self) -> f32 {
        self.page_width_pt - self.margin_left_pt - self.margin_right_pt
    }
}

/// US letter, 0.5" side margins, 0.3" top and bottom margins.
pub fn default_page_config(font: StandardFont) -> PageConfig {
    PageConfig {
        font,
        page_width_pt: 612.0,
        page_height_pt: 792.0,
        margin_left_pt: 36.0,
        margin_right_pt: 36.0,
        margin_top_pt: 21.6,
        margin_bottom_pt: 21.6,
        name_size_pt: 18.0,
        heading_size_pt: 10.0,
        body_size_pt: 10.0,
        bullet_size_pt: 9.0,
        leading: 1.2,
        bullet_indent_pt: 12.0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

pub struct FontMetricTable {
    widths: [u16; 95],
    pub fallback_width: u16,
}

impl FontMetricTable {
    fn char_width(&self, c: char) -> u16 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.fallback_width
        }
    }

    /// Rendered width of `s` in points at `size_pt`.
    pub fn measure_str(&self, s: &str, size_pt: f32) -> f32 {
        let units: u32 = s.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size_pt / 1000.0
    }

    /// Greedy word wrap. Words wider than `max_width_pt` get a line of their own.
    pub fn wrap(&self, text: &str, size_pt: f32, max_width_pt: f32) -> Vec<String> {
        let space = self.measure_str(" ", size_pt);
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in text.split_whitespace() {
            let word_width = self.measure_str(word, size_pt);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else if current_width + space + word_width > max_width_pt {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A-M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N-Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a-m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n-z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    fallback_width: 556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    fallback_width: 611,
};

static TIMES_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        278, 278, 564, 564, 564, 444, 921,
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        333, 278, 333, 469, 500, 333,
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        480, 200, 480, 541,
    ],
    fallback_width: 500,
};

static TIMES_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        333, 333, 570, 570, 570, 500, 930,
        722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
        722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
        333, 278, 333, 581, 500, 333,
        500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
        556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
        394, 220, 394, 520,
    ],
    fallback_width: 556,
};

/// Courier and Courier-Bold are monospaced at 600 units.
static COURIER_TABLE: FontMetricTable = FontMetricTable {
    widths: [600; 95],
    fallback_width: 600,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courier_is_monospaced() {
        let table = StandardFont::Courier.metrics(Weight::Regular);
        assert_eq!(table.measure_str("iiii", 10.0), table.measure_str("WWWW", 10.0));
        assert!((table.measure_str("abc", 10.0) - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "Senior Software Engineer";
        for font in [StandardFont::Helvetica, StandardFont::Times] {
            let regular = font.metrics(Weight::Regular).measure_str(text, 10.0);
            let bold = font.metrics(Weight::Bold).measure_str(text, 10.0);
            assert!(bold > regular, "{font:?}");
        }
    }

    #[test]
    fn test_wrap_respects_width() {
        let table = StandardFont::Times.metrics(Weight::Regular);
        let text = "Designed and deployed a recommender system using matrix factorization, \
                    increasing user engagement by thirty percent across four product surfaces.";
        let lines = table.wrap(text, 9.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(table.measure_str(line, 9.0) <= 200.0, "{line}");
        }
        assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let table = StandardFont::Helvetica.metrics(Weight::Regular);
        let lines = table.wrap("see https://example.com/a/very/long/path ok", 10.0, 60.0);
        assert_eq!(lines[0], "see");
        assert_eq!(lines[1], "https://example.com/a/very/long/path");
        assert!(table.wrap("   ", 10.0, 60.0).is_empty());
    }

    #[test]
    fn test_font_from_str() {
        assert_eq!("Times".parse::<StandardFont>(), Ok(StandardFont::Times));
        assert_eq!(" courier ".parse::<StandardFont>(), Ok(StandardFont::Courier));
        assert!("comic-sans".parse::<StandardFont>().is_err());
    }

    #[test]
    fn test_letter_text_width() {
        let config = default_page_config(StandardFont::Times);
        assert_eq!(config.text_width_pt(), 540.0);
    }
}
