use std::path::Path;
use thiserror::Error;

/// One `<image> <label>` pair from an evaluation list file, relative to the dataset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub image: String,
    pub label: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("list line {line}: expected `<image> <label>`, got {content:?}")]
pub struct ListParseError {
    pub line: usize,
    pub content: String,
}

impl ListEntry {
    /// Output prefix for this sample: the label file name without its extension.
    pub fn name(&self) -> String {
        Path::new(&self.label)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.label)
            .to_string()
    }
}

/// Parse a list file body. Blank lines and `#` comments are skipped.
pub fn parse_list(text: &str) -> Result<Vec<ListEntry>, ListParseError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [image, label] => entries.push(ListEntry {
                image: (*image).to_string(),
                label: (*label).to_string(),
            }),
            _ => {
                return Err(ListParseError {
                    line: idx + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(entries)
}
