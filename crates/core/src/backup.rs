use crate::report::{Diagnostic, Reporter};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("バックアップ先に既にファイルがあります: {0}")]
    TargetExists(PathBuf),
    #[error("バックアップ先の相対パスを作れません: {0}")]
    NoRelativePath(PathBuf),
    #[error("バックアップ用フォルダを作成できませんでした: {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("バックアップへの移動に失敗しました: {from} -> {to}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Re-roots `source` under `backup_root`, dropping its drive prefix and root.
pub fn backup_path(source: &Path, backup_root: &Path) -> Result<PathBuf, BackupError> {
    let relative: PathBuf = source
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if relative.as_os_str().is_empty() {
        return Err(BackupError::NoRelativePath(source.to_path_buf()));
    }
    Ok(backup_root.join(relative))
}

/// Moves `source` into the backup tree. An existing file at the backup path is
/// never replaced.
pub fn move_to_backup(
    source: &Path,
    backup_root: &Path,
    reporter: &dyn Reporter,
) -> Result<PathBuf, BackupError> {
    let target = backup_path(source, backup_root)?;
    if target.exists() {
        return Err(BackupError::TargetExists(target));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| BackupError::CreateDir {
            path: parent.to_path_buf(),
            source: err,
        })?;
    }

    move_file(source, &target).map_err(|err| BackupError::Move {
        from: source.to_path_buf(),
        to: target.clone(),
        source: err,
    })?;

    reporter.report(Diagnostic::Moved {
        from: source.to_path_buf(),
        to: target.clone(),
    });
    Ok(target)
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // rename cannot cross filesystems
    let modified = FileTime::from_last_modification_time(&fs::metadata(from)?);
    fs::copy(from, to)?;
    filetime::set_file_mtime(to, modified)?;
    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::{backup_path, move_to_backup, BackupError};
    use crate::report::{CollectingReporter, Diagnostic};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn backup_path_preserves_relative_tree() {
        let path = backup_path(
            Path::new("/photos/2020/camera/IMG_0001.JPG"),
            Path::new("/backup"),
        )
        .expect("backup path");
        assert_eq!(path, Path::new("/backup/photos/2020/camera/IMG_0001.JPG"));
    }

    #[test]
    fn backup_path_drops_parent_components() {
        let path = backup_path(Path::new("../outside/IMG.JPG"), Path::new("/backup"))
            .expect("backup path");
        assert_eq!(path, Path::new("/backup/outside/IMG.JPG"));
        assert!(matches!(
            backup_path(Path::new("/"), Path::new("/backup")),
            Err(BackupError::NoRelativePath(_))
        ));
    }

    #[test]
    fn move_to_backup_relocates_original() {
        let temp = tempdir().expect("tempdir");
        let source_dir = temp.path().join("in").join("nested");
        fs::create_dir_all(&source_dir).expect("source dir");
        let source = source_dir.join("IMG_0001.JPG");
        fs::write(&source, b"original").expect("write");
        let backup_root = temp.path().join("backup");

        let reporter = CollectingReporter::new();
        let moved = move_to_backup(&source, &backup_root, &reporter).expect("move");

        assert!(!source.exists());
        assert!(moved.starts_with(&backup_root));
        assert!(moved.ends_with("in/nested/IMG_0001.JPG"));
        assert_eq!(fs::read(&moved).expect("read moved"), b"original");
        assert!(reporter.contains(|d| matches!(d, Diagnostic::Moved { .. })));
    }

    #[test]
    fn existing_backup_target_is_refused() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("IMG_0002.JPG");
        fs::write(&source, b"new").expect("write");
        let backup_root = temp.path().join("backup");
        let existing = backup_path(&source, &backup_root).expect("backup path");
        fs::create_dir_all(existing.parent().expect("parent")).expect("parent dir");
        fs::write(&existing, b"old").expect("write existing");

        let reporter = CollectingReporter::new();
        let err = move_to_backup(&source, &backup_root, &reporter).expect_err("should refuse");
        assert!(matches!(err, BackupError::TargetExists(_)));
        assert!(source.exists(), "original must stay in place");
        assert_eq!(fs::read(&existing).expect("read existing"), b"old");
    }
}
