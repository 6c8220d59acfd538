use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dao;
use crate::db::Database;
use crate::mapping::{asset_from_row, asset_row_from};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    /// 0 is the storage root.
    pub id: i64,
    /// Slash separated path from the root, e.g. `Media/Video`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Option<i64>,
    pub parent_id: i64,
    pub name: String,
    pub title: String,
    pub owner_id: i64,
    pub show_in_search: bool,
    /// Location of the blob relative to the assets root.
    pub file_path: String,
}

impl Asset {
    pub fn new(folder: &Folder, name: impl Into<String>) -> Self {
        let name = name.into();
        let file_path = join_rel(&folder.path, &name);
        Self { id: None, parent_id: folder.id, name, title: String::new(), owner_id: 0, show_in_search: true, file_path }
    }
}

/// Local file store used for mirrored thumbnails.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn find_or_make_folder(&self, path: &str) -> Result<Folder>;
    async fn find_asset(&self, name: &str, parent_id: i64) -> Result<Option<Asset>>;
    /// Write bytes under `folder/name`, replacing whatever is there.
    async fn write_blob(&self, folder: &Folder, name: &str, bytes: &[u8]) -> Result<String>;
    /// Insert or update; returns the asset id.
    async fn save_asset(&self, asset: &Asset) -> Result<i64>;
}

/// Asset records in the database, blobs on disk under `root`.
#[derive(Clone)]
pub struct LocalAssetStore {
    db: Database,
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(db: Database, root: impl Into<PathBuf>) -> Self { Self { db, root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    pub async fn get_asset(&self, id: i64) -> Result<Option<Asset>> {
        Ok(dao::get_asset(self.db.pool(), id).await?.map(asset_from_row))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn find_or_make_folder(&self, path: &str) -> Result<Folder> {
        let pool = self.db.pool();
        let mut parent_id = 0;
        let mut parts = Vec::new();
        for name in path_segments(path) {
            parent_id = match dao::find_folder_id(pool, parent_id, name).await? {
                Some(id) => id,
                None => dao::insert_folder(pool, parent_id, name)
                    .await
                    .with_context(|| format!("creating folder {name} under {parent_id}"))?,
            };
            parts.push(name);
        }
        Ok(Folder { id: parent_id, path: parts.join("/") })
    }

    async fn find_asset(&self, name: &str, parent_id: i64) -> Result<Option<Asset>> {
        Ok(dao::find_asset_by_name(self.db.pool(), name, parent_id).await?.map(asset_from_row))
    }

    async fn write_blob(&self, folder: &Folder, name: &str, bytes: &[u8]) -> Result<String> {
        let dir = path_segments(&folder.path).fold(self.root.clone(), |acc, seg| acc.join(seg));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating asset dir: {}", dir.display()))?;
        let file = blob_file_name(name);
        let target = dir.join(&file);
        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("writing asset: {}", target.display()))?;
        Ok(join_rel(&folder.path, &file))
    }

    async fn save_asset(&self, asset: &Asset) -> Result<i64> {
        let pool = self.db.pool();
        match asset.id {
            Some(id) => {
                dao::update_asset(pool, &asset_row_from(id, asset)).await?;
                Ok(id)
            }
            None => dao::insert_asset(pool, &asset_row_from(0, asset)).await,
        }
    }
}

// Empty, "." and ".." segments are dropped so blobs stay under the root.
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').map(str::trim).filter(|s| !s.is_empty() && *s != "." && *s != "..")
}

// Names made only of dots would resolve to the folder or its parent.
fn blob_file_name(name: &str) -> String {
    if name.trim_matches('.').is_empty() { format!("_{name}") } else { name.to_string() }
}

fn join_rel(folder: &str, name: &str) -> String {
    if folder.is_empty() { name.to_string() } else { format!("{folder}/{name}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_skip_traversal() {
        let segs: Vec<_> = path_segments("/Media/../Video//./clips").collect();
        assert_eq!(segs, vec!["Media", "Video", "clips"]);
    }

    #[test]
    fn dot_only_names_stay_inside_folder() {
        assert_eq!(blob_file_name("."), "_.");
        assert_eq!(blob_file_name(".."), "_..");
        assert_eq!(blob_file_name(""), "_");
        assert_eq!(blob_file_name(".jpg"), ".jpg");
        assert_eq!(blob_file_name("clip."), "clip.");
    }

    #[test]
    fn new_asset_lives_in_folder() {
        let folder = Folder { id: 4, path: "Video".into() };
        let a = Asset::new(&folder, "clip.jpg");
        assert_eq!(a.parent_id, 4);
        assert_eq!(a.file_path, "Video/clip.jpg");
        let root = Folder { id: 0, path: String::new() };
        assert_eq!(Asset::new(&root, "x.png").file_path, "x.png");
    }
}
