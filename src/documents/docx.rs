use std::path::Path;

use docx_rust::document::BodyContent;
use docx_rust::DocxFile;

use super::ExtractError;

/// Concatenate the text of the body's top-level paragraphs, one per line.
pub fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let file = DocxFile::from_file(path).map_err(|e| ExtractError::Docx(format!("{:?}", e)))?;
    let docx = file.parse().map_err(|e| ExtractError::Docx(format!("{:?}", e)))?;

    let mut text = String::new();
    for content in &docx.document.body.content {
        if let BodyContent::Paragraph(paragraph) = content {
            text.push_str(&paragraph.text());
            text.push('\n');
        }
    }
    Ok(text)
}
