use std::path::Path;

use lopdf::Document;
use tracing::warn;

use super::{ExtractError, Extraction};

/// Extract the text of every page, one page per line block.
///
/// A page that fails to decode is skipped and reported in
/// [`Extraction::warnings`]; the remaining pages are still returned.
pub fn extract_pdf(path: &Path) -> Result<Extraction, ExtractError> {
    let document = Document::load(path)?;
    let mut extraction = Extraction::default();

    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => {
                extraction.text.push_str(page_text.trim_end_matches('\n'));
                extraction.text.push('\n');
            }
            Err(e) => {
                warn!(path = %path.display(), page = page_number, error = %e, "Skipping unreadable PDF page");
                extraction.warnings.push(format!(
                    "Error extracting text from a page in {}. Some text might be missing.",
                    path.display()
                ));
            }
        }
    }

    Ok(extraction)
}
