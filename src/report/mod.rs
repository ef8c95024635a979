pub mod pdf;
pub mod renderer;
pub mod wrap;

pub use renderer::{report_file_name, ReportData, ReportError, ReportRenderer};
pub use wrap::wrap_line;
