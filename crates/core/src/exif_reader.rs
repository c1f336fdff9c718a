use anyhow::{Context, Result};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Raw date strings found in an image's EXIF block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDateFields {
    /// `DateTimeOriginal` from the Exif sub-IFD.
    pub original: Option<String>,
    /// `DateTime` from IFD0.
    pub date_time: Option<String>,
}

pub fn read_image_date_fields(path: &Path) -> Result<ImageDateFields> {
    let file = File::open(path)
        .with_context(|| format!("EXIF読み込み対象を開けませんでした: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut buf)
        .with_context(|| format!("EXIFを解析できませんでした: {}", path.display()))?;

    Ok(ImageDateFields {
        original: ascii_field(&exif, Tag::DateTimeOriginal),
        date_time: ascii_field(&exif, Tag::DateTime),
    })
}

// display_value() rewrites EXIF dates as `YYYY-MM-DD`; the raw ASCII keeps the
// colon layout the parser expects.
fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let raw = match &field.value {
        Value::Ascii(values) => values
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).to_string()),
        _ => Some(field.display_value().to_string()),
    };
    normalize(raw)
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim_matches(|c: char| c == '\0' || c.is_whitespace()).to_string())
        .filter(|v| !v.is_empty())
}
