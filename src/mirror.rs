//! Copies a remote thumbnail into local asset storage.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::{Asset, AssetStore};
use crate::sync::MirrorRequest;

/// Characters of the title that make it into the file name.
pub const TITLE_LIMIT: usize = 55;

/// Lowercase URL-safe form of `s`. Non-ASCII text is transliterated first,
/// runs of separators become one dash, `&` becomes `and`, anything else
/// outside `[a-z0-9-]` is dropped.
pub fn slugify(s: &str) -> String {
    let ascii = deunicode::deunicode(s);
    let mut raw = String::with_capacity(ascii.len());
    for ch in ascii.chars() {
        match ch {
            '&' => raw.push_str("-and-"),
            '+' | '_' | '.' => raw.push('-'),
            c if c.is_whitespace() => raw.push('-'),
            c if c.is_ascii_alphanumeric() || c == '-' => raw.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch == '-' && (out.is_empty() || out.ends_with('-')) { continue; }
        out.push(ch);
    }
    while out.ends_with('-') { out.pop(); }
    out
}

/// Suffix after the last dot of the URL's final path segment; empty when there is none.
pub fn url_extension(image_url: &str) -> String {
    let last_segment = match url::Url::parse(image_url) {
        Ok(u) => u.path_segments().and_then(|mut s| s.next_back().map(str::to_string)).unwrap_or_default(),
        Err(_) => image_url.split(['?', '#']).next().unwrap_or("").rsplit('/').next().unwrap_or("").to_string(),
    };
    last_segment.rsplit_once('.').map(|(_, ext)| ext.to_string()).unwrap_or_default()
}

/// `<slug of first 55 title chars>.<extension>`. Degenerate inputs give degenerate names.
pub fn mirror_file_name(title: &str, image_url: &str) -> String {
    let limited: String = title.chars().take(TITLE_LIMIT).collect();
    format!("{}.{}", slugify(&limited), url_extension(image_url))
}

pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching image: {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching image: {url}"))?;
    Ok(resp.bytes().await?.to_vec())
}

pub struct ThumbnailMirror {
    client: reqwest::Client,
    store: Arc<dyn AssetStore>,
}

impl ThumbnailMirror {
    pub fn new(client: reqwest::Client, store: Arc<dyn AssetStore>) -> Self { Self { client, store } }

    /// Store the requested thumbnail in `folder` and return the saved asset.
    /// An asset with the same name in that folder is reused without downloading again.
    pub async fn mirror(&self, req: &MirrorRequest, folder: &str, acting_user: Option<i64>) -> Result<Asset> {
        let name = mirror_file_name(&req.record_title, &req.image_url);
        let folder = self.store.find_or_make_folder(folder).await?;

        let mut asset = match self.store.find_asset(&name, folder.id).await? {
            Some(existing) => {
                debug!(%name, folder = %folder.path, "reusing mirrored asset");
                existing
            }
            None => {
                let bytes = fetch_bytes(&self.client, &req.image_url).await?;
                let mut fresh = Asset::new(&folder, name.clone());
                fresh.file_path = self.store.write_blob(&folder, &name, &bytes).await?;
                info!(%name, folder = %folder.path, bytes = bytes.len(), "mirrored thumbnail");
                fresh
            }
        };

        asset.parent_id = folder.id;
        asset.name = name;
        asset.title = req.asset_title.clone();
        asset.owner_id = acting_user.unwrap_or(0);
        asset.show_in_search = false;
        let id = self.store.save_asset(&asset).await?;
        asset.id = Some(id);
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Folder;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn slug_of_punctuated_title() {
        assert_eq!(slugify("My Great Talk!!"), "my-great-talk");
        assert_eq!(slugify("  Tom & Jerry_Show.v2 "), "tom-and-jerry-show-v2");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slug_transliterates_non_latin_titles() {
        assert_eq!(slugify("Ünïcode"), "unicode");
        assert_eq!(slugify("Русское видео"), "russkoe-video");
        assert!(!slugify("日本語の動画").is_empty());
        assert_ne!(slugify("日本語の動画"), slugify("Русское видео"));
    }

    #[test]
    fn slash_is_removed_not_separated() {
        assert_eq!(slugify("AC/DC Live"), "acdc-live");
    }

    #[test]
    fn file_name_uses_image_extension() {
        assert_eq!(mirror_file_name("My Great Talk!!", "https://img.example/a/b/hq.jpg"), "my-great-talk.jpg");
        assert_eq!(mirror_file_name("Clip", "https://img.example/hq.png?w=640"), "clip.png");
    }

    #[test]
    fn file_name_truncates_title() {
        let title = "a".repeat(80);
        let name = mirror_file_name(&title, "https://img.example/x.gif");
        assert_eq!(name, format!("{}.gif", "a".repeat(TITLE_LIMIT)));
    }

    #[test]
    fn missing_extension_leaves_empty_suffix() {
        assert_eq!(url_extension("https://img.example/thumbnail"), "");
        assert_eq!(mirror_file_name("Clip", "https://img.example/thumbnail"), "clip.");
    }

    #[derive(Default)]
    struct MemStore {
        folders: Mutex<Vec<String>>,
        assets: Mutex<Vec<Asset>>,
        blobs: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl AssetStore for MemStore {
        async fn find_or_make_folder(&self, path: &str) -> Result<Folder> {
            let mut folders = self.folders.lock().unwrap();
            let idx = match folders.iter().position(|f| f == path) {
                Some(i) => i,
                None => { folders.push(path.to_string()); folders.len() - 1 }
            };
            Ok(Folder { id: idx as i64 + 1, path: path.to_string() })
        }

        async fn find_asset(&self, name: &str, parent_id: i64) -> Result<Option<Asset>> {
            Ok(self.assets.lock().unwrap().iter().find(|a| a.name == name && a.parent_id == parent_id).cloned())
        }

        async fn write_blob(&self, folder: &Folder, name: &str, bytes: &[u8]) -> Result<String> {
            let path = format!("{}/{}", folder.path, name);
            self.blobs.lock().unwrap().push((path.clone(), bytes.to_vec()));
            Ok(path)
        }

        async fn save_asset(&self, asset: &Asset) -> Result<i64> {
            let mut assets = self.assets.lock().unwrap();
            if let Some(id) = asset.id {
                if let Some(slot) = assets.iter_mut().find(|a| a.id == Some(id)) { *slot = asset.clone(); }
                return Ok(id);
            }
            let id = assets.len() as i64 + 1;
            let mut stored = asset.clone();
            stored.id = Some(id);
            assets.push(stored);
            Ok(id)
        }
    }

    fn request(url: String) -> MirrorRequest {
        MirrorRequest { image_url: url, record_title: "My Great Talk!!".into(), asset_title: "Remote".into() }
    }

    #[tokio::test]
    async fn downloads_and_stamps_new_asset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/thumb.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body("JPEGDATA")
            .expect(1)
            .create_async()
            .await;

        let store = Arc::new(MemStore::default());
        let mirror = ThumbnailMirror::new(reqwest::Client::new(), store.clone());
        let asset = mirror.mirror(&request(format!("{}/thumb.jpg", server.url())), "Video", Some(9)).await.unwrap();

        assert_eq!(asset.name, "my-great-talk.jpg");
        assert_eq!(asset.title, "Remote");
        assert_eq!(asset.owner_id, 9);
        assert!(!asset.show_in_search);
        assert_eq!(asset.file_path, "Video/my-great-talk.jpg");
        assert_eq!(store.blobs.lock().unwrap()[0].1, b"JPEGDATA".to_vec());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reuses_asset_with_same_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/thumb.jpg")
            .with_status(200)
            .with_body("JPEGDATA")
            .expect(1)
            .create_async()
            .await;

        let store = Arc::new(MemStore::default());
        let mirror = ThumbnailMirror::new(reqwest::Client::new(), store.clone());
        let url = format!("{}/thumb.jpg", server.url());
        let first = mirror.mirror(&request(url.clone()), "Embed", None).await.unwrap();
        let second = mirror.mirror(&request(url), "Embed", None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.owner_id, 0);
        assert_eq!(store.assets.lock().unwrap().len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_download_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/gone.jpg").with_status(404).create_async().await;

        let store = Arc::new(MemStore::default());
        let mirror = ThumbnailMirror::new(reqwest::Client::new(), store.clone());
        let res = mirror.mirror(&request(format!("{}/gone.jpg", server.url())), "Embed", None).await;
        assert!(res.is_err());
        assert!(store.assets.lock().unwrap().is_empty());
    }
}
