//! Tar-gzip archives for source bundle and stack state uploads

use std::fs;
use std::path::{Path, PathBuf};

use async_compression::tokio::write::GzipEncoder;
use log::debug;
use tokio::io::AsyncWriteExt;

use crate::error::{MigrateError, Result};

/// Regular files under `dir`, as (forward-slash relative path, absolute path)
/// pairs sorted by relative path. Symlinks are not followed.
pub fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(MigrateError::Io {
            message: format!("'{}' is not a directory", dir.display()),
        });
    }

    let mut files = Vec::new();
    walk(dir, dir, &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn walk(root: &Path, current: &Path, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk(root, &path, out)?;
        } else if file_type.is_file() {
            out.push((relative_name(root, &path)?, path));
        }
    }
    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| MigrateError::Io {
        message: format!("'{}' is outside '{}'", path.display(), root.display()),
    })?;

    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Gzip a byte buffer
pub async fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzipEncoder::new(Vec::new());
    encoder.write_all(data).await?;
    encoder.shutdown().await?;
    Ok(encoder.into_inner())
}

/// Archive every regular file under `dir` as a `.tar.gz`
pub async fn tar_gz_directory(dir: &Path) -> Result<Vec<u8>> {
    let files = list_files(dir)?;
    let mut builder = tar::Builder::new(Vec::new());

    for (name, path) in &files {
        builder.append_path_with_name(path, name)?;
    }
    let tarball = builder.into_inner()?;

    debug!(
        "Archived {} files from {} ({} bytes before compression)",
        files.len(),
        dir.display(),
        tarball.len()
    );
    gzip(&tarball).await
}

/// Archive a single file as a `.tar.gz` containing one entry called `name`
pub async fn tar_gz_file(path: &Path, name: &str) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    builder.append_path_with_name(path, name)?;
    let tarball = builder.into_inner()?;
    gzip(&tarball).await
}
