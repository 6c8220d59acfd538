pub mod config;
pub mod dao;
pub mod db;
pub mod error;
pub mod extractor;
pub mod form;
pub mod mapping;
pub mod mirror;
pub mod render;
pub mod storage;
pub mod sync;
pub mod types;
pub mod validation;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::{EmbedConfig, ProfileConfig};
    pub use crate::error::EmbedError;
    pub use crate::extractor::{Extractor, HttpExtractor};
    pub use crate::render::{DirectoryTemplates, MemoryTemplates, RenderOptions, TemplateRegistry};
    pub use crate::types::{EmbedRecord, EmbedType, SourceMetadata};
    pub use crate::{EmbedInput, EmbedSummary, Embeddable};
}

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EmbedConfig;
use crate::db::Database;
use crate::error::EmbedError;
use crate::extractor::{Extractor, HttpExtractor};
use crate::form::{FieldList, FormBuilder, FormContext};
use crate::mapping::{embed_row_from_record, record_from_embed_row};
use crate::mirror::ThumbnailMirror;
use crate::render::{render_embed, DirectoryTemplates, MemoryTemplates, RenderOptions, TemplateRegistry};
use crate::storage::{Asset, LocalAssetStore};
use crate::sync::{synchronize, SyncInput};
use crate::types::{EmbedRecord, SourceMetadata};
use crate::validation::check_allowed_type;

pub const DEFAULT_RECORD_TYPE: &str = "Embed";

/// Editor supplied values for one save. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedInput {
    pub id: Option<i64>,
    /// Only read when creating a record.
    pub record_type: Option<String>,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub description: Option<String>,
    /// Manually uploaded image; once set, thumbnails are no longer mirrored.
    pub image_id: Option<i64>,
}

/// Listing row: title, type and URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedSummary {
    pub id: i64,
    pub title: String,
    pub embed_type: String,
    pub source_url: String,
}

impl From<&EmbedRecord> for EmbedSummary {
    fn from(r: &EmbedRecord) -> Self {
        Self {
            id: r.id.unwrap_or_default(),
            title: r.title.clone(),
            embed_type: r.embed_type.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            source_url: r.source_url.clone(),
        }
    }
}

/// Async library entry point. Owns the database, asset store and collaborators.
pub struct Embeddable {
    db: Database,
    config: EmbedConfig,
    extractor: Arc<dyn Extractor>,
    assets: LocalAssetStore,
    mirror: ThumbnailMirror,
    templates: Box<dyn TemplateRegistry>,
    forms: FormBuilder,
}

impl Embeddable {
    /// Connect with the HTTP extractor. Runs migrations.
    pub async fn connect(config: EmbedConfig) -> Result<Self> {
        let client = http_client(&config)?;
        let extractor = Arc::new(HttpExtractor::new(client.clone())?);
        Self::build(config, client, extractor).await
    }

    /// Connect with a caller supplied extractor.
    pub async fn with_extractor(config: EmbedConfig, extractor: Arc<dyn Extractor>) -> Result<Self> {
        let client = http_client(&config)?;
        Self::build(config, client, extractor).await
    }

    async fn build(config: EmbedConfig, client: reqwest::Client, extractor: Arc<dyn Extractor>) -> Result<Self> {
        let db = Database::connect(config.database_url.as_deref()).await?;
        db.run_migrations().await?;
        let assets = LocalAssetStore::new(db.clone(), config.assets_dir()?);
        let mirror = ThumbnailMirror::new(client, Arc::new(assets.clone()));
        let templates: Box<dyn TemplateRegistry> = match &config.templates_dir {
            Some(dir) => Box::new(DirectoryTemplates::load(dir)?),
            None => Box::new(MemoryTemplates::new()?),
        };
        Ok(Self { db, config, extractor, assets, mirror, templates, forms: FormBuilder::with_embed_fields() })
    }

    pub fn config(&self) -> &EmbedConfig { &self.config }

    pub fn database(&self) -> &Database { &self.db }

    pub fn set_templates(&mut self, registry: impl TemplateRegistry + 'static) { self.templates = Box::new(registry); }

    /// Register extra form field contributors; they run after the embed fields.
    pub fn forms_mut(&mut self) -> &mut FormBuilder { &mut self.forms }

    /// Apply editor input, synchronize with the remote source and persist.
    ///
    /// Extractor and thumbnail download failures abort the save, as does an
    /// extracted type the record's profile does not allow.
    pub async fn save_embed(&self, input: EmbedInput, acting_user: Option<i64>) -> Result<EmbedRecord> {
        let (mut record, previous_url) = match input.id {
            Some(id) => {
                let existing = self.get_embed(id).await?;
                let prev = existing.source_url.clone();
                (existing, Some(prev))
            }
            None => (EmbedRecord::new(input.record_type.unwrap_or_else(|| DEFAULT_RECORD_TYPE.to_string())), None),
        };

        if let Some(t) = input.title { record.title = t; }
        if let Some(u) = input.source_url { record.source_url = u.trim().to_string(); }
        if let Some(d) = input.description { record.description = d; }
        if input.image_id.is_some() { record.image_id = input.image_id; }

        let url_changed = previous_url.as_deref() != Some(record.source_url.as_str());

        if !record.source_url.is_empty() {
            let meta = self.extractor.extract(&record.source_url).await?;
            let profile = self.config.profile(&record.record_type);
            if let Err(e) = check_allowed_type(profile.allowed_types(), &meta.embed_type) {
                warn!(url = %record.source_url, embed_type = %meta.embed_type, "embed type rejected");
                return Err(e.into());
            }

            let outcome = synchronize(SyncInput::from_record(&record, url_changed), &meta);
            outcome.patch.apply(&mut record);
            if let Some(req) = outcome.mirror {
                let asset = self.mirror.mirror(&req, profile.folder(&record.record_type), acting_user).await?;
                record.image_id = asset.id;
            }
        }

        let pool = self.db.pool();
        let id = match record.id {
            Some(id) => {
                dao::update_embed(pool, &embed_row_from_record(id, &record)).await?;
                id
            }
            None => dao::insert_embed(pool, &embed_row_from_record(0, &record)).await?,
        };
        record.id = Some(id);
        info!(id, url = %record.source_url, changed = url_changed, "embed saved");
        Ok(record)
    }

    pub async fn get_embed(&self, id: i64) -> Result<EmbedRecord> {
        let row = dao::find_embed(self.db.pool(), id).await?.ok_or(EmbedError::NotFound { id })?;
        Ok(record_from_embed_row(row))
    }

    pub async fn list_embeds(&self, record_type: Option<&str>) -> Result<Vec<EmbedRecord>> {
        let rows = dao::list_embeds(self.db.pool(), record_type).await?;
        Ok(rows.into_iter().map(record_from_embed_row).collect())
    }

    pub async fn list_summaries(&self, record_type: Option<&str>) -> Result<Vec<EmbedSummary>> {
        Ok(self.list_embeds(record_type).await?.iter().map(EmbedSummary::from).collect())
    }

    /// Remove an embed. Mirrored assets stay in storage.
    pub async fn delete_embed(&self, id: i64) -> Result<bool> {
        Ok(dao::delete_embed(self.db.pool(), id).await? > 0)
    }

    pub async fn render_embed(&self, id: i64, opts: &RenderOptions) -> Result<String> {
        let record = self.get_embed(id).await?;
        self.render_record(&record, opts)
    }

    pub fn render_record(&self, record: &EmbedRecord, opts: &RenderOptions) -> Result<String> {
        render_embed(record, opts, self.templates.as_ref())
    }

    pub fn form_fields(&self, record_type: &str) -> FieldList {
        let profile = self.config.profile(record_type);
        let ctx = FormContext { record_type, profile: &profile };
        self.forms.build(&ctx, FieldList::default())
    }

    pub async fn fetch_metadata(&self, url: &str) -> Result<SourceMetadata> {
        if url.trim().is_empty() {
            return Err(EmbedError::MissingSourceUrl.into());
        }
        self.extractor.extract(url.trim()).await
    }

    pub async fn get_asset(&self, id: i64) -> Result<Option<Asset>> { self.assets.get_asset(id).await }

    pub fn assets_root(&self) -> &std::path::Path { self.assets.root() }
}

fn http_client(config: &EmbedConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(config.user_agent()).build()?)
}
