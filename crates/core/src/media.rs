use crate::hash::{hash_file, ContentHash};
use crate::metadata::ResolvedDate;
use crate::report::Reporter;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "heic", "heif", "webp", "dng", "cr2", "nef", "arw",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "3gp", "avi", "mts", "m2ts"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Extension filter in the form `*`, `*.jpg`, or `jpg,mp4`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtensionFilter {
    extensions: Option<Vec<String>>,
}

impl ExtensionFilter {
    pub fn all() -> Self {
        Self { extensions: None }
    }

    pub fn parse(pattern: &str) -> Self {
        let mut extensions = Vec::new();
        for part in pattern.split(',') {
            let part = part.trim();
            if matches!(part, "*" | "*.*") {
                return Self::all();
            }
            let ext = part.trim_start_matches('*').trim_start_matches('.');
            if !ext.is_empty() {
                extensions.push(ext.to_ascii_lowercase());
            }
        }

        if extensions.is_empty() {
            Self::all()
        } else {
            Self {
                extensions: Some(extensions),
            }
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(extensions) = &self.extensions else {
            return true;
        };
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }
}

/// A single file moving through the pipeline. Discarded once placed.
#[derive(Debug)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub date: Option<ResolvedDate>,
    hash: OnceCell<Option<ContentHash>>,
}

impl MediaItem {
    pub fn new(path: PathBuf, kind: MediaKind) -> Self {
        Self {
            path,
            kind,
            date: None,
            hash: OnceCell::new(),
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        MediaKind::from_path(path).map(|kind| Self::new(path.to_path_buf(), kind))
    }

    /// Content digest, computed on first use.
    pub fn content_hash(&self, reporter: &dyn Reporter) -> Option<ContentHash> {
        *self.hash.get_or_init(|| hash_file(&self.path, reporter))
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string())
    }

    pub fn extension_with_dot(&self) -> String {
        self.path
            .extension()
            .map(|v| format!(".{}", v.to_string_lossy()))
            .unwrap_or_default()
    }
}
