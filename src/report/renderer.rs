use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::report::pdf::{Canvas, Font, A4};
use crate::report::wrap::wrap_line;
use crate::session::{ChatTurn, ImageRecord};

const MARGIN: f32 = 72.0;
const WRAP_WIDTH: usize = 90;
const LINE_HEIGHT: f32 = 14.0;
/// After an image block, a new page starts once the cursor is this low.
const IMAGE_BLOCK_FLOOR: f32 = 150.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The parts of a session a report is built from.
pub struct ReportData<'a> {
    pub chat_history: &'a [ChatTurn],
    pub image_history: &'a [ImageRecord],
}

pub struct ReportRenderer {
    reports_dir: PathBuf,
}

impl ReportRenderer {
    pub fn new(reports_dir: impl AsRef<Path>) -> Result<Self, ReportError> {
        let reports_dir = reports_dir.as_ref().to_path_buf();
        fs::create_dir_all(&reports_dir)?;
        Ok(Self { reports_dir })
    }

    /// Location of the report for `session_id`, whether or not it exists yet.
    pub fn report_path(&self, session_id: &str) -> PathBuf {
        self.reports_dir.join(report_file_name(session_id))
    }

    /// Renders the report and writes it, replacing any previous one.
    pub fn render(&self, session_id: &str, data: &ReportData<'_>) -> Result<PathBuf, ReportError> {
        let bytes = layout(session_id, data);
        let path = self.report_path(session_id);
        let tmp = path.with_extension("pdf.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        info!("Rendered report {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

pub fn report_file_name(session_id: &str) -> String {
    format!("{}.pdf", session_id)
}

/// Tracks the vertical cursor and breaks pages before a line would fall
/// below the bottom margin.
struct PageCursor {
    canvas: Canvas,
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        let canvas = Canvas::new(A4);
        let y = canvas.height() - MARGIN;
        Self { canvas, y }
    }

    fn new_page(&mut self) {
        self.canvas.show_page();
        self.y = self.canvas.height() - MARGIN;
    }

    fn heading(&mut self, text: &str, size: f32, advance: f32) {
        if self.y < MARGIN {
            self.new_page();
        }
        self.canvas.set_font(Font::HelveticaBold, size);
        self.canvas.draw_string(MARGIN, self.y, text);
        self.y -= advance;
    }

    fn body_line(&mut self, text: &str) {
        if self.y < MARGIN {
            self.new_page();
        }
        self.canvas.set_font(Font::Helvetica, 10.0);
        self.canvas.draw_string(MARGIN, self.y, text);
        self.y -= LINE_HEIGHT;
    }

    fn wrapped(&mut self, text: &str) {
        for line in wrap_line(text, WRAP_WIDTH) {
            self.body_line(&line);
        }
    }
}

fn layout(session_id: &str, data: &ReportData<'_>) -> Vec<u8> {
    let mut page = PageCursor::new();

    page.heading(&format!("Dog Health AI Report (Session {})", session_id), 18.0, 24.0);
    page.canvas.set_font(Font::Helvetica, 10.0);
    page.canvas.draw_string(MARGIN, page.y, "This report covers only this session.");
    page.y -= 32.0;

    for (idx, record) in data.image_history.iter().enumerate() {
        page.heading(&format!("Image Analysis {}", idx + 1), 14.0, 20.0);
        for (key, value) in record.analysis.fields() {
            page.wrapped(&format!("{}: {}", key, value));
        }
        page.y -= 10.0;
        if page.y < IMAGE_BLOCK_FLOOR {
            page.new_page();
        }
    }

    page.heading("Chat History", 14.0, 20.0);
    for turn in data.chat_history {
        let lines: Vec<String> = match turn {
            ChatTurn::Plain(text) => vec![format!("Q: {}", text)],
            ChatTurn::QaPair { question, answer } => {
                vec![format!("Q: {}", question), format!("A: {}", answer)]
            }
            ChatTurn::RoleText { role, text } => vec![format!("{}: {}", role, text)],
            ChatTurn::Other(_) => continue,
        };
        for line in &lines {
            page.wrapped(line);
        }
        page.y -= 6.0;
    }

    let replaced = page.canvas.replaced_chars();
    if replaced > 0 {
        warn!(
            "Report for session {} printed {} characters as '?' (outside the PDF font encoding)",
            session_id, replaced
        );
    }
    page.canvas.finish()
}
