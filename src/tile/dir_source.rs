//! Filesystem-backed tile source.
//!
//! Tiles live at `{root}/{level}/{index}`, optionally with a file extension.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::source::{sniff_image, TileKey, TileSource};
use crate::error::FetchError;

/// Tile source reading pre-rendered tiles from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryTileSource {
    root: PathBuf,
    extension: Option<String>,
    identifier: String,
}

impl DirectoryTileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            identifier: format!("file://{}", root.display()),
            root,
            extension: None,
        }
    }

    /// Append `.{extension}` to every tile file name.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.');
        self.extension = (!extension.is_empty()).then(|| extension.to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        let file_name = match &self.extension {
            Some(ext) => format!("{}.{}", key.index, ext),
            None => key.index.to_string(),
        };
        self.root.join(key.level.to_string()).join(file_name)
    }
}

#[async_trait]
impl TileSource for DirectoryTileSource {
    async fn retrieve(&self, key: TileKey) -> Result<Bytes, FetchError> {
        let path = self.tile_path(key);
        let data = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io(format!("{}: {}", path.display(), e)),
        })?;

        sniff_image(&data)?;
        Ok(Bytes::from(data))
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
