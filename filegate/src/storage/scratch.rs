//! Local scratch directory for downloads.
//!
//! Objects are written here in full before being streamed back to the client. Each download
//! writes its own temporary file, opens it and only then renames it into place, so the handle a
//! response streams from is never rewritten by a concurrent download of the same (or a colliding)
//! key. Files are left in place after the response is sent.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

static STAGED: AtomicU64 = AtomicU64::new(0);

/// A scratch copy, opened for reading before it became visible under its final name.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub file: fs::File,
}

#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path used for `key`. Always a direct child of the scratch root, whatever the key
    /// contains.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(local_file_name(key))
    }

    /// Write `data` for `key` and return a handle to exactly those bytes.
    ///
    /// The handle stays valid even if another download replaces the file at [`Self::path_for`]
    /// while the caller is still reading.
    pub async fn stage(&self, key: &str, data: &[u8]) -> std::io::Result<StagedFile> {
        fs::create_dir_all(&self.root).await?;

        let path = self.path_for(key);
        let tmp = self.root.join(format!(
            ".{}.{}.{}.tmp",
            local_file_name(key),
            std::process::id(),
            STAGED.fetch_add(1, Ordering::Relaxed)
        ));

        match write_and_open(&tmp, &path, data).await {
            Ok(file) => Ok(StagedFile { path, file }),
            Err(e) => {
                let _ = fs::remove_file(&tmp).await;
                Err(e)
            }
        }
    }
}

async fn write_and_open(tmp: &Path, path: &Path, data: &[u8]) -> std::io::Result<fs::File> {
    fs::write(tmp, data).await?;
    let file = fs::File::open(tmp).await?;
    fs::rename(tmp, path).await?;
    Ok(file)
}

fn local_file_name(key: &str) -> String {
    let name: String = key.chars().map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c }).collect();
    match name.as_str() {
        "" | "." | ".." => format!("_{name}"),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_are_kept() {
        assert_eq!(local_file_name("report.pdf"), "report.pdf");
        assert_eq!(local_file_name("with spaces (1).txt"), "with spaces (1).txt");
    }

    #[test]
    fn test_separators_are_replaced() {
        assert_eq!(local_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(local_file_name("dir\\file"), "dir_file");
    }

    #[test]
    fn test_dot_names_are_prefixed() {
        assert_eq!(local_file_name(".."), "_..");
        assert_eq!(local_file_name("."), "_.");
        assert_eq!(local_file_name(""), "_");
    }

    #[test]
    fn test_path_stays_inside_root() {
        let scratch = ScratchDir::new("/tmp/filegate");
        let path = scratch.path_for("../escape");
        assert_eq!(path.parent(), Some(Path::new("/tmp/filegate")));
    }

    async fn read_all(mut file: fs::File) -> Vec<u8> {
        use tokio::io::AsyncReadExt;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_stage_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path().join("nested"));

        let staged = scratch.stage("a.txt", b"contents").await.unwrap();

        assert_eq!(staged.path, dir.path().join("nested").join("a.txt"));
        assert_eq!(tokio::fs::read(&staged.path).await.unwrap(), b"contents");
        assert_eq!(read_all(staged.file).await, b"contents");
    }

    #[tokio::test]
    async fn test_restaging_does_not_touch_open_handles() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path());

        // Both keys map to the same local file name
        let first = scratch.stage("x/y.bin", &[b'A'; 4096]).await.unwrap();
        let second = scratch.stage("x_y.bin", b"B").await.unwrap();
        let third = scratch.stage("x/y.bin", b"").await.unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(read_all(first.file).await, vec![b'A'; 4096]);
        assert_eq!(read_all(second.file).await, b"B");
        assert!(read_all(third.file).await.is_empty());
        assert!(tokio::fs::read(&third.path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stage_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path());

        for _ in 0..3 {
            scratch.stage("a.txt", b"contents").await.unwrap();
        }

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().into_string().unwrap());
        }
        assert_eq!(names, vec!["a.txt"]);
    }
}
