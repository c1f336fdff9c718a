use crate::backup::move_to_backup;
use crate::media::{ExtensionFilter, MediaItem, MediaKind};
use crate::metadata::MetadataSource;
use crate::placement::{place, Category, NamingPolicy, Placement};
use crate::report::{Diagnostic, Reporter, Severity};
use crate::resolver::{resolve_date, ResolverOptions};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Originals are moved here after a successful copy when set.
    pub backup: Option<PathBuf>,
    pub filter: ExtensionFilter,
    pub include_hidden: bool,
    pub photo_naming: NamingPolicy,
    pub video_naming: NamingPolicy,
    pub resolver: ResolverOptions,
}

impl OrganizeOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            backup: None,
            filter: ExtensionFilter::all(),
            include_hidden: false,
            photo_naming: NamingPolicy::Rename,
            video_naming: NamingPolicy::Preserve,
            resolver: ResolverOptions::default(),
        }
    }

    pub fn naming_for(&self, kind: MediaKind) -> NamingPolicy {
        match kind {
            MediaKind::Image => self.photo_naming,
            MediaKind::Video => self.video_naming,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnsupportedExtension,
    UnresolvedDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Placed {
        source: PathBuf,
        target: PathBuf,
        date: DateTime<Local>,
        date_source: MetadataSource,
        backup: Option<PathBuf>,
        backup_error: Option<String>,
    },
    Duplicate {
        source: PathBuf,
        existing: PathBuf,
    },
    Skipped {
        source: PathBuf,
        reason: SkipReason,
    },
    Failed {
        source: PathBuf,
        reason: String,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            Self::Placed { source, .. }
            | Self::Duplicate { source, .. }
            | Self::Skipped { source, .. }
            | Self::Failed { source, .. } => source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunSummary {
    pub scanned: usize,
    pub filtered_out: usize,
    pub skipped_hidden: usize,
    pub placed: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
    pub moved: usize,
    pub backup_failed: usize,
    pub outcomes: Vec<FileOutcome>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, outcome: FileOutcome) {
        match &outcome {
            FileOutcome::Placed {
                backup,
                backup_error,
                ..
            } => {
                self.placed += 1;
                if backup.is_some() {
                    self.moved += 1;
                }
                if backup_error.is_some() {
                    self.backup_failed += 1;
                }
            }
            FileOutcome::Duplicate { .. } => self.duplicates += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Forwards every diagnostic and keeps the warning-level ones for the summary.
struct WarningRecorder<'a> {
    inner: &'a dyn Reporter,
    warnings: RefCell<Vec<String>>,
}

impl Reporter for WarningRecorder<'_> {
    fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.severity() == Severity::Warning {
            self.warnings.borrow_mut().push(diagnostic.to_string());
        }
        self.inner.report(diagnostic);
    }
}

/// Sorts every matching file under `options.input` into `options.output`.
/// Per-file problems end up in the summary; only an unusable input or output
/// root is an error.
pub fn organize(options: &OrganizeOptions, reporter: &dyn Reporter) -> Result<RunSummary> {
    if !options.input.is_dir() {
        bail!("入力フォルダが存在しません: {}", options.input.display());
    }

    let mut resolved = options.clone();
    resolved.input = canonical(&options.input)?;
    resolved.output = prepare_root(&options.output, "出力フォルダ")?;
    if let Some(backup) = &options.backup {
        resolved.backup = Some(prepare_root(backup, "バックアップフォルダ")?);
    }

    let recorder = WarningRecorder {
        inner: reporter,
        warnings: RefCell::new(Vec::new()),
    };
    let mut summary = RunSummary::default();
    let files = collect_files(&resolved, &mut summary, &recorder);

    for path in files {
        let outcome = process_file(&path, &resolved, &recorder);
        summary.record(outcome);
    }

    summary.warnings = recorder.warnings.into_inner();
    Ok(summary)
}

fn prepare_root(path: &Path, label: &str) -> Result<PathBuf> {
    fs::create_dir_all(path)
        .with_context(|| format!("{label}を作成できませんでした: {}", path.display()))?;
    canonical(path)
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path)
        .with_context(|| format!("フォルダを解決できませんでした: {}", path.display()))
}

fn collect_files(
    options: &OrganizeOptions,
    summary: &mut RunSummary,
    reporter: &dyn Reporter,
) -> Vec<PathBuf> {
    let mut out = Vec::new();

    let walker = WalkDir::new(&options.input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_managed_root(entry.path(), options));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let source = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| options.input.clone());
                let reason = format!("フォルダ走査に失敗しました: {err}");
                reporter.report(Diagnostic::FileFailed {
                    path: source.clone(),
                    reason: reason.clone(),
                });
                summary.record(FileOutcome::Failed { source, reason });
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        summary.scanned += 1;

        let path = entry.path();
        if is_hidden(path) && !options.include_hidden {
            summary.skipped_hidden += 1;
            continue;
        }
        if !options.filter.matches(path) {
            summary.filtered_out += 1;
            continue;
        }
        out.push(path.to_path_buf());
    }

    out
}

// Output and backup trees may live inside the input tree.
fn is_managed_root(path: &Path, options: &OrganizeOptions) -> bool {
    path == options.output || options.backup.as_deref() == Some(path)
}

fn process_file(path: &Path, options: &OrganizeOptions, reporter: &dyn Reporter) -> FileOutcome {
    let Some(mut item) = MediaItem::from_path(path) else {
        return FileOutcome::Skipped {
            source: path.to_path_buf(),
            reason: SkipReason::UnsupportedExtension,
        };
    };

    match place_item(&mut item, options, reporter) {
        Ok(outcome) => outcome,
        Err(err) => {
            let reason = format!("{err:#}");
            reporter.report(Diagnostic::FileFailed {
                path: path.to_path_buf(),
                reason: reason.clone(),
            });
            FileOutcome::Failed {
                source: path.to_path_buf(),
                reason,
            }
        }
    }
}

fn place_item(
    item: &mut MediaItem,
    options: &OrganizeOptions,
    reporter: &dyn Reporter,
) -> Result<FileOutcome> {
    let Some(resolved) = resolve_date(&item.path, item.kind, &options.resolver, reporter) else {
        return Ok(FileOutcome::Skipped {
            source: item.path.clone(),
            reason: SkipReason::UnresolvedDate,
        });
    };
    item.date = Some(resolved);

    let relative = item.path.strip_prefix(&options.input).unwrap_or(&item.path);
    let category = Category::from_source_path(relative);
    let placement = place(
        item,
        &resolved.date,
        &options.output,
        category,
        options.naming_for(item.kind),
        reporter,
    )?;

    let target = match placement {
        Placement::AlreadyPresent(existing) => {
            reporter.report(Diagnostic::DuplicateSkipped {
                path: item.path.clone(),
                existing: existing.clone(),
            });
            return Ok(FileOutcome::Duplicate {
                source: item.path.clone(),
                existing,
            });
        }
        Placement::Target(target) => target,
    };

    copy_new_file(&item.path, &target)?;
    reporter.report(Diagnostic::Copied {
        from: item.path.clone(),
        to: target.clone(),
    });

    let (backup, backup_error) = match &options.backup {
        None => (None, None),
        Some(root) => match move_to_backup(&item.path, root, reporter) {
            Ok(moved) => (Some(moved), None),
            Err(err) => {
                let reason = err.to_string();
                reporter.report(Diagnostic::FileFailed {
                    path: item.path.clone(),
                    reason: reason.clone(),
                });
                (None, Some(reason))
            }
        },
    };

    Ok(FileOutcome::Placed {
        source: item.path.clone(),
        target,
        date: resolved.date,
        date_source: resolved.source,
        backup,
        backup_error,
    })
}

/// Copies without ever replacing an existing file and keeps the source mtime.
fn copy_new_file(from: &Path, to: &Path) -> Result<()> {
    let mut reader =
        File::open(from).with_context(|| format!("コピー元を開けませんでした: {}", from.display()))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .with_context(|| format!("コピー先を作成できませんでした: {}", to.display()))?;
    if let Err(err) = io::copy(&mut reader, &mut writer) {
        drop(writer);
        // A partial copy would hash differently from its source on the next run.
        let _ = fs::remove_file(to);
        return Err(err).with_context(|| {
            format!("コピーに失敗しました: {} -> {}", from.display(), to.display())
        });
    }

    let modified = FileTime::from_last_modification_time(
        &fs::metadata(from)
            .with_context(|| format!("コピー元の情報を読めませんでした: {}", from.display()))?,
    );
    filetime::set_file_mtime(to, modified)
        .with_context(|| format!("更新日時を設定できませんでした: {}", to.display()))?;
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
