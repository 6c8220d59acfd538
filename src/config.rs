use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TAB: &str = "Main";

/// Per record type settings. Missing values fall back to the defaults the
/// accessor methods describe.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ProfileConfig {
    #[serde(default)]
    pub embed_tab: Option<String>,
    #[serde(default)]
    pub embed_folder: Option<String>,
    /// `None` means every type is accepted.
    #[serde(default)]
    pub allowed_embed_types: Option<Vec<String>>,
}

impl ProfileConfig {
    pub fn tab(&self) -> &str { self.embed_tab.as_deref().unwrap_or(DEFAULT_TAB) }

    /// Destination folder for mirrored thumbnails, defaulting to the record type name.
    pub fn folder<'a>(&'a self, record_type: &'a str) -> &'a str {
        self.embed_folder.as_deref().unwrap_or(record_type)
    }

    pub fn allowed_types(&self) -> Option<&[String]> { self.allowed_embed_types.as_deref() }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EmbedConfig {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl EmbedConfig {
    /// Read a TOML config file. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) if p.exists() => {
                let raw = fs::read_to_string(p).with_context(|| format!("reading config: {}", p.display()))?;
                toml::from_str::<EmbedConfig>(&raw).with_context(|| format!("parsing config: {}", p.display()))?
            }
            _ => EmbedConfig::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_nonempty("EMBEDDABLE_DATABASE_URL") { self.database_url = Some(v); }
        if let Some(v) = env_nonempty("EMBEDDABLE_ASSETS_DIR") { self.assets_dir = Some(PathBuf::from(v)); }
        if let Some(v) = env_nonempty("EMBEDDABLE_TEMPLATES_DIR") { self.templates_dir = Some(PathBuf::from(v)); }
    }

    /// Profile for a record type: configured values layered over the built-in ones.
    pub fn profile(&self, record_type: &str) -> ProfileConfig {
        let base = builtin_profile(record_type);
        match self.profiles.get(record_type) {
            Some(p) => ProfileConfig {
                embed_tab: p.embed_tab.clone().or(base.embed_tab),
                embed_folder: p.embed_folder.clone().or(base.embed_folder),
                allowed_embed_types: p.allowed_embed_types.clone().or(base.allowed_embed_types),
            },
            None => base,
        }
    }

    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| format!("embeddable/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn assets_dir(&self) -> Result<PathBuf> {
        match &self.assets_dir {
            Some(p) => Ok(p.clone()),
            None => Ok(data_dir()?.join("assets")),
        }
    }
}

/// Profiles shipped with the crate: a generic embed and a video-only one.
pub fn builtin_profile(record_type: &str) -> ProfileConfig {
    match record_type {
        "Embed" => ProfileConfig { embed_folder: Some("Embed".into()), ..Default::default() },
        "Video" => ProfileConfig {
            embed_folder: Some("Video".into()),
            allowed_embed_types: Some(vec!["video".into()]),
            ..Default::default()
        },
        _ => ProfileConfig::default(),
    }
}

pub(crate) fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "embeddable", "embeddable")
        .context("unable to determine data directory")?;
    Ok(proj.data_dir().to_path_buf())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_video_profile_restricts_types() {
        let cfg = EmbedConfig::default();
        let video = cfg.profile("Video");
        assert_eq!(video.allowed_types(), Some(&["video".to_string()][..]));
        assert_eq!(video.folder("Video"), "Video");
        assert_eq!(video.tab(), "Main");
        assert_eq!(cfg.profile("Embed").allowed_types(), None);
    }

    #[test]
    fn unknown_record_type_uses_its_name_as_folder() {
        let cfg = EmbedConfig::default();
        let p = cfg.profile("PressItem");
        assert_eq!(p.folder("PressItem"), "PressItem");
        assert_eq!(p.allowed_types(), None);
    }

    #[test]
    fn file_values_layer_over_builtins() {
        let raw = r#"
            user_agent = "test-agent"

            [profiles.Video]
            embed_tab = "Media"

            [profiles.Gallery]
            embed_folder = "Photos"
            allowed_embed_types = ["photo", "rich"]
        "#;
        let cfg: EmbedConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.user_agent(), "test-agent");

        let video = cfg.profile("Video");
        assert_eq!(video.tab(), "Media");
        assert_eq!(video.folder("Video"), "Video");
        assert_eq!(video.allowed_types().map(|t| t.len()), Some(1));

        let gallery = cfg.profile("Gallery");
        assert_eq!(gallery.folder("Gallery"), "Photos");
        assert_eq!(gallery.allowed_types().map(|t| t.len()), Some(2));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EmbedConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert!(cfg.profiles.is_empty());
    }
}
