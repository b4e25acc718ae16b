//! Text measurement and line breaking for the PDF writer.
//!
//! Widths come from the standard Helvetica and Helvetica-Bold font metrics
//! (units of 1/1000 em). Accented letters take the width of their base letter.

use super::common::fold_accent;

/// A4 in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN_X: f32 = 62.0;
pub const MARGIN_TOP: f32 = 56.0;
/// Content never goes below this line; the footer lives underneath it.
pub const MARGIN_BOTTOM: f32 = 64.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
}

// Widths for ASCII 32..=126.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

fn glyph_width(ch: char, face: FontFace) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    let base = fold_accent(ch);
    match base {
        ' '..='~' => table[base as usize - 32],
        'º' | 'ª' => 370,
        '°' => 400,
        '§' => 556,
        '–' => 556,
        '—' => 1000,
        '“' | '”' => 333,
        '‘' | '’' => 222,
        _ => 556,
    }
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, face) as u32).sum();
    units as f32 * size / 1000.0
}

/// A run of same-face text within a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub face: FontFace,
}

/// A laid-out line with its measured width.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub runs: Vec<Run>,
    pub width: f32,
}

impl Line {
    fn new() -> Self {
        Self {
            runs: Vec::new(),
            width: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn push_word(&mut self, word: &str, face: FontFace, size: f32) {
        if !self.is_empty() {
            // The separating space belongs to the previous run.
            if let Some(last) = self.runs.last_mut() {
                last.text.push(' ');
                self.width += text_width(" ", last.face, size);
            }
        }
        match self.runs.last_mut() {
            Some(last) if last.face == face => last.text.push_str(word),
            _ => self.runs.push(Run {
                text: word.to_string(),
                face,
            }),
        }
        self.width += text_width(word, face, size);
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Split a word that is wider than the line into chunks that fit.
fn split_long_word(word: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if !current.is_empty() && text_width(&candidate, face, size) > max_width {
            chunks.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedy word wrap over mixed-face spans.
pub fn wrap_spans(spans: &[(String, FontFace)], size: f32, max_width: f32) -> Vec<Line> {
    let space = |face| text_width(" ", face, size);
    let mut lines = Vec::new();
    let mut line = Line::new();

    for (text, face) in spans {
        for word in text.split_whitespace() {
            let pieces = if text_width(word, *face, size) > max_width {
                split_long_word(word, *face, size, max_width)
            } else {
                vec![word.to_string()]
            };
            for piece in pieces {
                let needed = text_width(&piece, *face, size)
                    + if line.is_empty() {
                        0.0
                    } else {
                        space(line.runs.last().map(|r| r.face).unwrap_or(*face))
                    };
                if !line.is_empty() && line.width + needed > max_width {
                    lines.push(std::mem::replace(&mut line, Line::new()));
                }
                line.push_word(&piece, *face, size);
            }
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_regular(text: &str, size: f32, max_width: f32) -> Vec<Line> {
        wrap_spans(&[(text.to_string(), FontFace::Regular)], size, max_width)
    }

    #[test]
    fn test_text_width_uses_font_metrics() {
        // "Hi" = 722 + 222 in Helvetica
        assert!((text_width("Hi", FontFace::Regular, 10.0) - 9.44).abs() < 1e-4);
        assert!(text_width("Hi", FontFace::Bold, 10.0) > text_width("Hi", FontFace::Regular, 10.0));
        assert_eq!(
            text_width("ção", FontFace::Regular, 12.0),
            text_width("cao", FontFace::Regular, 12.0)
        );
    }

    #[test]
    fn test_wrap_never_exceeds_width() {
        let text = "Pelo presente instrumento particular de procuração, a outorgante nomeia e constitui seu bastante procurador o advogado abaixo qualificado.";
        let lines = wrap_regular(text, 11.0, 200.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 200.0 + 1e-3));
        let joined: Vec<String> = lines.iter().map(Line::text).collect();
        assert_eq!(joined.join(" "), text);
    }

    #[test]
    fn test_mixed_faces_keep_order() {
        let spans = vec![
            ("OUTORGANTE:".to_string(), FontFace::Bold),
            ("Maria Souza, brasileira".to_string(), FontFace::Regular),
        ];
        let lines = wrap_spans(&spans, 11.0, CONTENT_WIDTH);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].runs.len(), 2);
        assert_eq!(lines[0].runs[0].text, "OUTORGANTE: ");
        assert_eq!(lines[0].text(), "OUTORGANTE: Maria Souza, brasileira");
    }

    #[test]
    fn test_long_word_is_split() {
        let word = "x".repeat(200);
        let lines = wrap_regular(&word, 11.0, 100.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 100.0 + 1e-3));
        let total: usize = lines.iter().map(|l| l.text().len()).sum();
        assert_eq!(total, 200);
    }
}
