//! A minimal PDF 1.4 writer for text-only documents.
//!
//! Drawing works like a plotter: pick a font, draw a string at a position,
//! finish the page. Only the two Helvetica base fonts are available, which
//! every PDF viewer ships, so nothing has to be embedded. The price is the
//! WinAnsi character set: text outside Latin-1 and a few typographic marks
//! (CJK, Devanagari, emoji) prints as `?`, counted by
//! [`Canvas::replaced_chars`].

use std::fmt::Write as _;

/// A4 in PDF points.
pub const A4: (f32, f32) = (595.28, 841.89);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }
}

const DEFAULT_FONT: (Font, f32) = (Font::Helvetica, 12.0);

pub struct Canvas {
    width: f32,
    height: f32,
    pages: Vec<Vec<u8>>,
    current: Vec<u8>,
    font: (Font, f32),
    replaced_chars: usize,
}

impl Canvas {
    pub fn new((width, height): (f32, f32)) -> Self {
        Self {
            width,
            height,
            pages: Vec::new(),
            current: Vec::new(),
            font: DEFAULT_FONT,
            replaced_chars: 0,
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(!self.current.is_empty())
    }

    /// Characters drawn so far that the base fonts cannot show and were
    /// printed as `?` instead.
    pub fn replaced_chars(&self) -> usize {
        self.replaced_chars
    }

    pub fn set_font(&mut self, font: Font, size: f32) {
        self.font = (font, size);
    }

    pub fn draw_string(&mut self, x: f32, y: f32, text: &str) {
        let (font, size) = self.font;
        let mut op = String::new();
        let _ = write!(
            op,
            "BT /{} {:.1} Tf {:.2} {:.2} Td (",
            font.resource(),
            size,
            x,
            y
        );
        self.current.extend_from_slice(op.as_bytes());
        let (encoded, replaced) = encode_text(text);
        self.current.extend(encoded);
        self.replaced_chars += replaced;
        self.current.extend_from_slice(b") Tj ET\n");
    }

    /// Closes the current page. The font falls back to the default, so
    /// callers re-select theirs on the next page.
    pub fn show_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.font = DEFAULT_FONT;
    }

    /// Serializes the document. An open page with content is closed first;
    /// an empty document still gets one blank page.
    pub fn finish(mut self) -> Vec<u8> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.show_page();
        }

        let mut out: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| 5 + 2 * i).collect();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");

        push_object(&mut out, &mut offsets, "<< /Type /Catalog /Pages 2 0 R >>".as_bytes());
        push_object(
            &mut out,
            &mut offsets,
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, self.pages.len()).as_bytes(),
        );
        for base in ["Helvetica", "Helvetica-Bold"] {
            push_object(
                &mut out,
                &mut offsets,
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    base
                )
                .as_bytes(),
            );
        }

        for (page_id, content) in page_ids.iter().zip(&self.pages) {
            let page = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                self.width,
                self.height,
                page_id + 1
            );
            push_object(&mut out, &mut offsets, page.as_bytes());

            let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            stream.extend_from_slice(content);
            stream.extend_from_slice(b"\nendstream");
            push_object(&mut out, &mut offsets, &stream);
        }

        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
        for offset in &offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_at
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

fn push_object(out: &mut Vec<u8>, offsets: &mut Vec<usize>, body: &[u8]) {
    offsets.push(out.len());
    let id = offsets.len();
    out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendobj\n");
}

fn win_ansi(c: char) -> Option<u8> {
    match c {
        ' '..='~' => Some(c as u8),
        '\u{a0}'..='\u{ff}' => Some(c as u32 as u8),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201c}' => Some(0x93),
        '\u{201d}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\u{2026}' => Some(0x85),
        _ => None,
    }
}

/// Encodes `text` as a WinAnsi PDF string body, escaping delimiters.
/// Characters the encoding cannot represent become `?`; the second value
/// counts them.
fn encode_text(text: &str) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(text.len());
    let mut replaced = 0;
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            _ => match win_ansi(c) {
                Some(byte) => out.push(byte),
                None => {
                    out.push(b'?');
                    replaced += 1;
                }
            },
        }
    }
    (out, replaced)
}
