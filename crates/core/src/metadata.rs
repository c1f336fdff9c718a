use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the date cascade. Variants are listed in cascade order per kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MetadataSource {
    ExifOriginal,
    ExifDateTime,
    FileMetadata,
    AviDateTimeOriginal,
    QuickTimeCreated,
    ShellDateEncoded,
    FallbackFileModified,
}

pub const IMAGE_SOURCES: &[MetadataSource] = &[
    MetadataSource::ExifOriginal,
    MetadataSource::ExifDateTime,
    MetadataSource::FileMetadata,
];

pub const VIDEO_SOURCES: &[MetadataSource] = &[
    MetadataSource::AviDateTimeOriginal,
    MetadataSource::QuickTimeCreated,
    MetadataSource::ShellDateEncoded,
];

impl MetadataSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::ExifOriginal => "exif:DateTimeOriginal",
            Self::ExifDateTime => "exif:DateTime",
            Self::FileMetadata => "file:ModifiedDate",
            Self::AviDateTimeOriginal => "avi:DateTimeOriginal",
            Self::QuickTimeCreated => "quicktime:Created",
            Self::ShellDateEncoded => "shell:DateEncoded",
            Self::FallbackFileModified => "fs:LastWrite",
        }
    }
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A capture timestamp together with the source that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: DateTime<Local>,
    pub source: MetadataSource,
}

impl ResolvedDate {
    pub fn new(date: DateTime<Local>, source: MetadataSource) -> Self {
        Self { date, source }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn is_plausible(&self, min_year: i32) -> bool {
        self.year() >= min_year
    }
}
