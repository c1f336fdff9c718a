use crate::container::{read_container_dates, ContainerDates};
use crate::date_format::{
    format_locale_datetime, parse_image_datetime, parse_shell_datetime, parse_video_datetime,
};
use crate::exif_reader::{read_image_date_fields, ImageDateFields};
use crate::media::MediaKind;
use crate::metadata::{MetadataSource, ResolvedDate, IMAGE_SOURCES, VIDEO_SOURCES};
use crate::report::{Diagnostic, Reporter};
use crate::shell_props::query_date_encoded;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MIN_PLAUSIBLE_YEAR: i32 = 1990;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Parsed dates before this year are replaced by the last-write time.
    pub min_plausible_year: i32,
    /// `exiftool` executable used for the shell date lookup; `None` disables it.
    pub exiftool: Option<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            min_plausible_year: DEFAULT_MIN_PLAUSIBLE_YEAR,
            exiftool: Some("exiftool".to_string()),
        }
    }
}

/// Resolves the capture date of `path`. `None` means no source, including the
/// filesystem, produced a usable timestamp.
pub fn resolve_date(
    path: &Path,
    kind: MediaKind,
    options: &ResolverOptions,
    reporter: &dyn Reporter,
) -> Option<ResolvedDate> {
    let candidate = match kind {
        MediaKind::Image => resolve_image_date(path, reporter),
        MediaKind::Video => resolve_video_date(path, options, reporter),
    };

    let accepted = match candidate {
        Some(resolved) if resolved.is_plausible(options.min_plausible_year) => Some(resolved),
        Some(resolved) => {
            reporter.report(Diagnostic::ImplausibleYear {
                path: path.to_path_buf(),
                source: resolved.source,
                year: resolved.year(),
            });
            None
        }
        None => None,
    };

    let resolved = accepted.or_else(|| {
        last_write_date(path)
            .map(|date| ResolvedDate::new(date, MetadataSource::FallbackFileModified))
    });

    match resolved {
        Some(resolved) => reporter.report(Diagnostic::DateResolved {
            path: path.to_path_buf(),
            date: resolved.date,
            source: resolved.source,
        }),
        None => reporter.report(Diagnostic::DateUnresolved {
            path: path.to_path_buf(),
        }),
    }
    resolved
}

fn resolve_image_date(path: &Path, reporter: &dyn Reporter) -> Option<ResolvedDate> {
    let fields = match read_image_date_fields(path) {
        Ok(fields) => fields,
        Err(err) => {
            reporter.report(Diagnostic::MetadataUnreadable {
                path: path.to_path_buf(),
                reason: format!("{err:#}"),
            });
            ImageDateFields::default()
        }
    };

    IMAGE_SOURCES.iter().find_map(|&source| {
        let raw = match source {
            MetadataSource::ExifOriginal => fields.original.clone(),
            MetadataSource::ExifDateTime => fields.date_time.clone(),
            MetadataSource::FileMetadata => file_metadata_stamp(path),
            _ => None,
        };
        parse_candidate(path, source, raw, parse_image_datetime, reporter)
    })
}

fn resolve_video_date(
    path: &Path,
    options: &ResolverOptions,
    reporter: &dyn Reporter,
) -> Option<ResolvedDate> {
    let dates = match read_container_dates(path) {
        Ok(dates) => dates,
        Err(err) => {
            reporter.report(Diagnostic::UnrecognizedContainer {
                path: path.to_path_buf(),
                reason: err.to_string(),
            });
            ContainerDates::default()
        }
    };

    VIDEO_SOURCES.iter().find_map(|&source| match source {
        MetadataSource::AviDateTimeOriginal => parse_candidate(
            path,
            source,
            dates.avi_original.clone(),
            parse_video_datetime,
            reporter,
        ),
        MetadataSource::QuickTimeCreated => match dates.movie_created {
            Some(created) => Some(ResolvedDate::new(created.with_timezone(&Local), source)),
            None => {
                report_missing(path, source, reporter);
                None
            }
        },
        MetadataSource::ShellDateEncoded => shell_date(path, options, reporter),
        _ => None,
    })
}

fn shell_date(
    path: &Path,
    options: &ResolverOptions,
    reporter: &dyn Reporter,
) -> Option<ResolvedDate> {
    let source = MetadataSource::ShellDateEncoded;
    let Some(program) = options.exiftool.as_deref() else {
        report_missing(path, source, reporter);
        return None;
    };

    match query_date_encoded(program, path) {
        Ok(raw) => parse_candidate(path, source, raw, parse_shell_datetime, reporter),
        Err(err) => {
            reporter.report(Diagnostic::ShellPropertyUnavailable {
                path: path.to_path_buf(),
                reason: format!("{err:#}"),
            });
            None
        }
    }
}

fn parse_candidate(
    path: &Path,
    source: MetadataSource,
    raw: Option<String>,
    parse: fn(&str) -> Option<DateTime<Local>>,
    reporter: &dyn Reporter,
) -> Option<ResolvedDate> {
    let Some(raw) = raw else {
        report_missing(path, source, reporter);
        return None;
    };

    match parse(&raw) {
        Some(date) => Some(ResolvedDate::new(date, source)),
        None => {
            reporter.report(Diagnostic::UnparseableDate {
                path: path.to_path_buf(),
                source,
                raw,
            });
            None
        }
    }
}

fn report_missing(path: &Path, source: MetadataSource, reporter: &dyn Reporter) {
    reporter.report(Diagnostic::MetadataMissing {
        path: path.to_path_buf(),
        source,
    });
}

/// The modified stamp a metadata reader records for the file itself, in the
/// locale layout.
fn file_metadata_stamp(path: &Path) -> Option<String> {
    last_write_date(path).map(|date| format_locale_datetime(&date))
}

pub fn last_write_date(path: &Path) -> Option<DateTime<Local>> {
    let time = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::from(time))
}
