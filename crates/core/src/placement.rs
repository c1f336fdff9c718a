use crate::hash::{hash_file, same_content};
use crate::media::MediaItem;
use crate::report::{Diagnostic, Reporter};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest value the four-digit sequence field can carry.
pub const MAX_SEQUENCE: u32 = 9999;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    Favorites,
    Highlights,
}

impl Category {
    /// Looks for a "favorite" or "highlight" hint in the directories of `path`.
    pub fn from_source_path(path: &Path) -> Option<Self> {
        let dir = path.parent()?.to_string_lossy().to_lowercase();
        if dir.contains("favorite") {
            Some(Self::Favorites)
        } else if dir.contains("highlight") {
            Some(Self::Highlights)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Favorites => "Favorites",
            Self::Highlights => "Highlights",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// `YYYYMMDD_NNNN.ext`
    #[default]
    Rename,
    /// Original name, `stem_NNNN.ext` on collision.
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Nothing exists at this path yet.
    Target(PathBuf),
    /// A file with identical content already sits at this path.
    AlreadyPresent(PathBuf),
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("連番が上限 {max} に達しました: {dir}")]
    SequenceExhausted { dir: PathBuf, max: u32 },
    #[error("保存先フォルダを作成できませんでした: {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `root/YYYY/Month YYYY[/Month YYYY Favorites|Highlights]`
pub fn destination_dir(root: &Path, date: &DateTime<Local>, category: Option<Category>) -> PathBuf {
    let year = date.format("%Y").to_string();
    let month = date.format("%B %Y").to_string();
    let dir = root.join(year).join(&month);
    match category {
        Some(category) => dir.join(format!("{} {}", month, category.label())),
        None => dir,
    }
}

pub fn candidate_name(
    item: &MediaItem,
    date: &DateTime<Local>,
    policy: NamingPolicy,
    sequence: u32,
) -> String {
    let extension = item.extension_with_dot();
    match policy {
        NamingPolicy::Rename => format!("{}_{:04}{}", date.format("%Y%m%d"), sequence, extension),
        NamingPolicy::Preserve if sequence <= 1 => item.file_name(),
        NamingPolicy::Preserve => {
            let stem = item
                .path
                .file_stem()
                .map(|v| v.to_string_lossy().to_string())
                .unwrap_or_else(|| "untitled".to_string());
            format!("{}_{:04}{}", stem, sequence, extension)
        }
    }
}

/// Creates the destination directory for `date` and picks a path for `item`
/// inside it that does not overwrite anything.
pub fn place(
    item: &MediaItem,
    date: &DateTime<Local>,
    root: &Path,
    category: Option<Category>,
    policy: NamingPolicy,
    reporter: &dyn Reporter,
) -> Result<Placement, PlacementError> {
    let dir = destination_dir(root, date, category);
    fs::create_dir_all(&dir).map_err(|source| PlacementError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    assign_target(item, date, &dir, policy, reporter)
}

pub fn assign_target(
    item: &MediaItem,
    date: &DateTime<Local>,
    dir: &Path,
    policy: NamingPolicy,
    reporter: &dyn Reporter,
) -> Result<Placement, PlacementError> {
    assign_target_within(item, date, dir, policy, MAX_SEQUENCE, reporter)
}

fn assign_target_within(
    item: &MediaItem,
    date: &DateTime<Local>,
    dir: &Path,
    policy: NamingPolicy,
    max_sequence: u32,
    reporter: &dyn Reporter,
) -> Result<Placement, PlacementError> {
    for sequence in 1..=max_sequence {
        let candidate = dir.join(candidate_name(item, date, policy, sequence));
        if !candidate.exists() {
            return Ok(Placement::Target(candidate));
        }

        let existing = hash_file(&candidate, reporter);
        if same_content(existing, item.content_hash(reporter)) {
            return Ok(Placement::AlreadyPresent(candidate));
        }
        reporter.report(Diagnostic::NameCollision {
            existing: candidate,
        });
    }

    Err(PlacementError::SequenceExhausted {
        dir: dir.to_path_buf(),
        max: max_sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use crate::test_support::local;
    use tempfile::tempdir;

    fn write_item(dir: &Path, name: &str, body: &[u8]) -> MediaItem {
        fs::create_dir_all(dir).expect("create source dir");
        let path = dir.join(name);
        fs::write(&path, body).expect("write source");
        MediaItem::from_path(&path).expect("media item")
    }

    fn copy_to(placement: &Placement, item: &MediaItem) -> PathBuf {
        let Placement::Target(target) = placement else {
            panic!("expected a fresh target, got {placement:?}");
        };
        fs::copy(&item.path, target).expect("copy");
        target.clone()
    }

    #[test]
    fn renaming_policy_builds_dated_name() {
        let temp = tempdir().expect("tempdir");
        let output = temp.path().join("OUTPUT");
        let item = write_item(&temp.path().join("in"), "IMG_001.jpg", b"photo-a");
        let date = local(2020, 5, 14, 10, 22);

        let reporter = CollectingReporter::new();
        let placement = place(&item, &date, &output, None, NamingPolicy::Rename, &reporter)
            .expect("place");
        assert_eq!(
            placement,
            Placement::Target(output.join("2020").join("May 2020").join("20200514_0001.jpg"))
        );
        assert!(output.join("2020").join("May 2020").is_dir());
    }

    #[test]
    fn identical_content_is_already_present() {
        let temp = tempdir().expect("tempdir");
        let output = temp.path().join("OUTPUT");
        let item = write_item(&temp.path().join("in"), "IMG_001.jpg", b"photo-a");
        let date = local(2020, 5, 14, 10, 22);
        let reporter = CollectingReporter::new();

        let first = place(&item, &date, &output, None, NamingPolicy::Rename, &reporter)
            .expect("first place");
        let placed = copy_to(&first, &item);

        let again = MediaItem::from_path(&item.path).expect("media item");
        let second = place(&again, &date, &output, None, NamingPolicy::Rename, &reporter)
            .expect("second place");
        assert_eq!(second, Placement::AlreadyPresent(placed));
    }

    #[test]
    fn different_content_gets_next_sequence() {
        let temp = tempdir().expect("tempdir");
        let output = temp.path().join("OUTPUT");
        let first = write_item(&temp.path().join("in"), "IMG_001.jpg", b"photo-a");
        let second = write_item(&temp.path().join("in"), "IMG_002.jpg", b"photo-b");
        let date = local(2020, 5, 14, 10, 22);
        let reporter = CollectingReporter::new();

        let placement = place(&first, &date, &output, None, NamingPolicy::Rename, &reporter)
            .expect("place first");
        copy_to(&placement, &first);

        let placement = place(&second, &date, &output, None, NamingPolicy::Rename, &reporter)
            .expect("place second");
        assert_eq!(
            placement,
            Placement::Target(output.join("2020").join("May 2020").join("20200514_0002.jpg"))
        );
        assert!(reporter.contains(|d| matches!(d, Diagnostic::NameCollision { .. })));
    }

    #[test]
    fn preserving_policy_keeps_name_then_suffixes() {
        let temp = tempdir().expect("tempdir");
        let output = temp.path().join("OUTPUT");
        let a = write_item(&temp.path().join("a"), "clip.mp4", b"video-a");
        let b = write_item(&temp.path().join("b"), "clip.mp4", b"video-b");
        let date = local(2019, 7, 4, 8, 30);
        let reporter = CollectingReporter::new();
        let dir = output.join("2019").join("July 2019");

        let placement = place(&a, &date, &output, None, NamingPolicy::Preserve, &reporter)
            .expect("place a");
        assert_eq!(placement, Placement::Target(dir.join("clip.mp4")));
        copy_to(&placement, &a);

        let placement = place(&b, &date, &output, None, NamingPolicy::Preserve, &reporter)
            .expect("place b");
        assert_eq!(placement, Placement::Target(dir.join("clip_0002.mp4")));
    }

    #[test]
    fn category_hint_adds_suffix_directory() {
        let temp = tempdir().expect("tempdir");
        let output = temp.path().join("OUTPUT");
        let item = write_item(&temp.path().join("favorite"), "IMG_100.jpg", b"fav");
        let date = local(2021, 1, 1, 9, 0);
        let reporter = CollectingReporter::new();

        let category = Category::from_source_path(Path::new("favorite/IMG_100.jpg"));
        assert_eq!(category, Some(Category::Favorites));
        let placement = place(&item, &date, &output, category, NamingPolicy::Rename, &reporter)
            .expect("place");
        assert_eq!(
            placement,
            Placement::Target(
                output
                    .join("2021")
                    .join("January 2021")
                    .join("January 2021 Favorites")
                    .join("20210101_0001.jpg")
            )
        );
    }

    #[test]
    fn category_detection_is_case_insensitive_and_favorite_first() {
        assert_eq!(
            Category::from_source_path(Path::new("Trip/My Highlights/a.jpg")),
            Some(Category::Highlights)
        );
        assert_eq!(
            Category::from_source_path(Path::new("FAVORITES/highlight/a.jpg")),
            Some(Category::Favorites)
        );
        assert_eq!(Category::from_source_path(Path::new("favorite.jpg")), None);
        assert_eq!(Category::from_source_path(Path::new("plain/a.jpg")), None);
    }

    #[test]
    fn unreadable_existing_file_is_treated_as_distinct() {
        let temp = tempdir().expect("tempdir");
        let item = write_item(&temp.path().join("in"), "IMG_001.jpg", b"photo-a");
        let date = local(2020, 5, 14, 10, 22);
        let dir = temp.path().join("out");
        // a directory at the first candidate cannot be hashed
        fs::create_dir_all(dir.join("20200514_0001.jpg")).expect("blocker");

        let reporter = CollectingReporter::new();
        let placement = assign_target(&item, &date, &dir, NamingPolicy::Rename, &reporter)
            .expect("assign");
        assert_eq!(placement, Placement::Target(dir.join("20200514_0002.jpg")));
        assert!(reporter.contains(|d| matches!(d, Diagnostic::HashFailed { .. })));
    }

    #[test]
    fn exhausted_sequence_fails_explicitly() {
        let temp = tempdir().expect("tempdir");
        let item = write_item(&temp.path().join("in"), "IMG_001.jpg", b"photo-a");
        let date = local(2020, 5, 14, 10, 22);
        let dir = temp.path().join("out");
        fs::create_dir_all(&dir).expect("out");
        fs::write(dir.join("20200514_0001.jpg"), b"other-1").expect("w1");
        fs::write(dir.join("20200514_0002.jpg"), b"other-2").expect("w2");

        let reporter = CollectingReporter::new();
        let err = assign_target_within(&item, &date, &dir, NamingPolicy::Rename, 2, &reporter)
            .expect_err("should be exhausted");
        assert!(matches!(err, PlacementError::SequenceExhausted { max: 2, .. }));
    }
}
