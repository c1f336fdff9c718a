use crate::metadata::MetadataSource;
use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
}

/// Events emitted while resolving and placing a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    MetadataUnreadable {
        path: PathBuf,
        reason: String,
    },
    MetadataMissing {
        path: PathBuf,
        source: MetadataSource,
    },
    UnparseableDate {
        path: PathBuf,
        source: MetadataSource,
        raw: String,
    },
    ImplausibleYear {
        path: PathBuf,
        source: MetadataSource,
        year: i32,
    },
    UnrecognizedContainer {
        path: PathBuf,
        reason: String,
    },
    ShellPropertyUnavailable {
        path: PathBuf,
        reason: String,
    },
    DateResolved {
        path: PathBuf,
        date: DateTime<Local>,
        source: MetadataSource,
    },
    DateUnresolved {
        path: PathBuf,
    },
    HashFailed {
        path: PathBuf,
        reason: String,
    },
    NameCollision {
        existing: PathBuf,
    },
    Copied {
        from: PathBuf,
        to: PathBuf,
    },
    DuplicateSkipped {
        path: PathBuf,
        existing: PathBuf,
    },
    Moved {
        from: PathBuf,
        to: PathBuf,
    },
    FileFailed {
        path: PathBuf,
        reason: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MetadataMissing { .. }
            | Self::UnrecognizedContainer { .. }
            | Self::ShellPropertyUnavailable { .. }
            | Self::NameCollision { .. } => Severity::Debug,
            Self::MetadataUnreadable { .. }
            | Self::DateResolved { .. }
            | Self::Copied { .. }
            | Self::DuplicateSkipped { .. }
            | Self::Moved { .. } => Severity::Info,
            Self::UnparseableDate { .. }
            | Self::ImplausibleYear { .. }
            | Self::DateUnresolved { .. }
            | Self::HashFailed { .. }
            | Self::FileFailed { .. } => Severity::Warning,
        }
    }

    /// The file the event is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::MetadataUnreadable { path, .. }
            | Self::MetadataMissing { path, .. }
            | Self::UnparseableDate { path, .. }
            | Self::ImplausibleYear { path, .. }
            | Self::UnrecognizedContainer { path, .. }
            | Self::ShellPropertyUnavailable { path, .. }
            | Self::DateResolved { path, .. }
            | Self::DateUnresolved { path }
            | Self::HashFailed { path, .. }
            | Self::DuplicateSkipped { path, .. }
            | Self::FileFailed { path, .. } => path,
            Self::NameCollision { existing } => existing,
            Self::Copied { from, .. } | Self::Moved { from, .. } => from,
        }
    }

    pub fn metadata_source(&self) -> Option<MetadataSource> {
        match self {
            Self::MetadataMissing { source, .. }
            | Self::UnparseableDate { source, .. }
            | Self::ImplausibleYear { source, .. }
            | Self::DateResolved { source, .. } => Some(*source),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetadataUnreadable { path, reason } => {
                write!(f, "メタデータを読めませんでした: {} ({reason})", path.display())
            }
            Self::MetadataMissing { path, source } => {
                write!(f, "{source} がありません: {}", path.display())
            }
            Self::UnparseableDate { path, source, raw } => {
                write!(
                    f,
                    "{source} の日時を解析できませんでした: {} ({raw:?})",
                    path.display()
                )
            }
            Self::ImplausibleYear { path, source, year } => {
                write!(
                    f,
                    "{source} の年 {year} は不自然なため更新日時を使用します: {}",
                    path.display()
                )
            }
            Self::UnrecognizedContainer { path, reason } => {
                write!(f, "動画形式を判別できませんでした: {} ({reason})", path.display())
            }
            Self::ShellPropertyUnavailable { path, reason } => {
                write!(f, "シェルプロパティを取得できませんでした: {} ({reason})", path.display())
            }
            Self::DateResolved { path, date, source } => {
                write!(f, "日時: {} -> {} ({source})", path.display(), date.format("%Y-%m-%d %H:%M:%S"))
            }
            Self::DateUnresolved { path } => {
                write!(f, "日時を決定できないためスキップします: {}", path.display())
            }
            Self::HashFailed { path, reason } => {
                write!(f, "ハッシュを計算できませんでした: {} ({reason})", path.display())
            }
            Self::NameCollision { existing } => {
                write!(f, "同名の別ファイルがあります: {}", existing.display())
            }
            Self::Copied { from, to } => {
                write!(f, "コピー: {} -> {}", from.display(), to.display())
            }
            Self::DuplicateSkipped { path, existing } => {
                write!(
                    f,
                    "同一内容のファイルが既にあるためスキップします: {} (= {})",
                    path.display(),
                    existing.display()
                )
            }
            Self::Moved { from, to } => {
                write!(f, "移動: {} -> {}", from.display(), to.display())
            }
            Self::FileFailed { path, reason } => {
                write!(f, "処理に失敗しました: {} ({reason})", path.display())
            }
        }
    }
}

/// Sink for diagnostics. Passed explicitly to every stage of the pipeline.
pub trait Reporter {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `tracing` subscriber installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        let path = diagnostic.path().display();
        let source = diagnostic.metadata_source().map(MetadataSource::label);
        match diagnostic.severity() {
            Severity::Debug => tracing::debug!(path = %path, source, "{diagnostic}"),
            Severity::Info => tracing::info!(path = %path, source, "{diagnostic}"),
            Severity::Warning => tracing::warn!(path = %path, source, "{diagnostic}"),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: RefCell<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn contains(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.events.borrow().iter().any(predicate)
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        self.events.borrow_mut().push(diagnostic);
    }
}
