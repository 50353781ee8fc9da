//! Picks the file a session writes to and opens it.

use std::io;
use std::path::Path;

use tokio::fs::{self, File, OpenOptions};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::FileInfo;
use crate::utils::file_name_from_url;

const MAX_NAME_ATTEMPTS: usize = 8;

/// Resolves the destination for `url` inside `dir` and opens it for writing.
///
/// With `overwrite`, whatever sits at the derived path is removed first and
/// the file is truncated. Otherwise an occupied path is never touched: the
/// name is replaced by an id-based one that keeps the original extension.
pub(crate) async fn open_destination(
    url: &str,
    dir: &Path,
    overwrite: bool,
    session_id: &str,
) -> io::Result<(File, FileInfo)> {
    let original = file_name_from_url(url).unwrap_or_else(|| session_id.to_string());

    if overwrite {
        let path = dir.join(&original);
        remove_existing(&path).await;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;
        return Ok((
            file,
            FileInfo {
                file_name: original,
                path,
            },
        ));
    }

    let mut file_name = original.clone();
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(&file_name);

        if !exists(&path).await {
            // create_new so a file that appeared since the check is not clobbered
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file, FileInfo { file_name, path })),
                Err(e) if e.kind() != io::ErrorKind::AlreadyExists => return Err(e),
                Err(_) => {}
            }
        }

        let id = if attempt == 0 {
            session_id.to_string()
        } else {
            Uuid::new_v4().to_string()
        };
        file_name = collision_name(&id, &original);
        debug!(taken = %path.display(), renamed = %file_name, "destination exists");
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name found for {}", original),
    ))
}

/// Last group of a UUID plus the extension of `original`.
fn collision_name(id: &str, original: &str) -> String {
    let stem = id.rsplit('-').next().unwrap_or(id);
    match Path::new(original).extension() {
        Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
        None => stem.to_string(),
    }
}

async fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok()
}

async fn remove_existing(path: &Path) {
    let result = match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        debug!(path = %path.display(), error = %e, "nothing removed before overwrite");
    }
}

/// Removes a partially written file. Missing files are fine.
pub(crate) async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove partial file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ID: &str = "0b7e6f0a-1c2d-4e5f-8a9b-3c4d5e6f7a8b";

    #[test]
    fn test_collision_name_keeps_extension() {
        assert_eq!(collision_name(ID, "archive.tar.gz"), "3c4d5e6f7a8b.gz");
        assert_eq!(collision_name(ID, "README"), "3c4d5e6f7a8b");
    }

    #[tokio::test]
    async fn test_free_name_is_used_as_is() {
        let dir = tempdir().unwrap();
        let (_file, info) = open_destination("http://host/a/data.csv?x=1", dir.path(), false, ID)
            .await
            .unwrap();

        assert_eq!(info.file_name, "data.csv");
        assert_eq!(info.path, dir.path().join("data.csv"));
        assert!(info.path.exists());
    }

    #[tokio::test]
    async fn test_taken_name_is_replaced() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), b"keep me").unwrap();

        let (_file, info) = open_destination("http://host/data.csv", dir.path(), false, ID)
            .await
            .unwrap();

        assert_eq!(info.file_name, "3c4d5e6f7a8b.csv");
        assert_eq!(
            std::fs::read(dir.path().join("data.csv")).unwrap(),
            b"keep me"
        );
    }

    #[tokio::test]
    async fn test_taken_id_name_falls_back_to_fresh_id() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), b"1").unwrap();
        std::fs::write(dir.path().join("3c4d5e6f7a8b.csv"), b"2").unwrap();

        let (_file, info) = open_destination("http://host/data.csv", dir.path(), false, ID)
            .await
            .unwrap();

        assert_ne!(info.file_name, "data.csv");
        assert_ne!(info.file_name, "3c4d5e6f7a8b.csv");
        assert!(info.file_name.ends_with(".csv"));
    }

    #[tokio::test]
    async fn test_overwrite_removes_file_and_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("data.csv");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("inner"), b"x").unwrap();

        let (_file, info) = open_destination("http://host/data.csv", dir.path(), true, ID)
            .await
            .unwrap();

        assert_eq!(info.path, target);
        assert!(target.is_file());
        assert_eq!(std::fs::metadata(&target).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_url_without_name_uses_session_id() {
        let dir = tempdir().unwrap();
        let (_file, info) = open_destination("http://host/", dir.path(), false, ID)
            .await
            .unwrap();

        assert_eq!(info.file_name, ID);
    }

    #[tokio::test]
    async fn test_discard_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        discard(&dir.path().join("never-written")).await;
    }
}
