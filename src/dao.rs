use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmbedRow {
    pub id: i64,
    pub record_type: String,
    pub title: String,
    pub embed_type: Option<String>,
    pub source_url: String,
    pub source_image_url: String,
    pub html: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub aspect_ratio: Option<f64>,
    pub description: String,
    pub image_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssetRow {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub title: String,
    pub owner_id: i64,
    pub show_in_search: i64,
    pub file_path: String,
}

const EMBED_COLUMNS: &str = "id, record_type, title, embed_type, source_url, source_image_url, html, width, height, aspect_ratio, description, image_id";
const ASSET_COLUMNS: &str = "id, parent_id, name, title, owner_id, show_in_search, file_path";

pub async fn insert_embed(pool: &AnyPool, e: &EmbedRow) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO embeds(record_type, title, embed_type, source_url, source_image_url, html, width, height, aspect_ratio, description, image_id)\n         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&e.record_type)
    .bind(&e.title)
    .bind(&e.embed_type)
    .bind(&e.source_url)
    .bind(&e.source_image_url)
    .bind(&e.html)
    .bind(e.width)
    .bind(e.height)
    .bind(e.aspect_ratio)
    .bind(&e.description)
    .bind(e.image_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update_embed(pool: &AnyPool, e: &EmbedRow) -> Result<u64> {
    let res = sqlx::query(
        "UPDATE embeds SET\n           record_type=?, title=?, embed_type=?, source_url=?, source_image_url=?, html=?,\n           width=?, height=?, aspect_ratio=?, description=?, image_id=?, updated_at=CURRENT_TIMESTAMP\n         WHERE id = ?",
    )
    .bind(&e.record_type)
    .bind(&e.title)
    .bind(&e.embed_type)
    .bind(&e.source_url)
    .bind(&e.source_image_url)
    .bind(&e.html)
    .bind(e.width)
    .bind(e.height)
    .bind(e.aspect_ratio)
    .bind(&e.description)
    .bind(e.image_id)
    .bind(e.id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn find_embed(pool: &AnyPool, id: i64) -> Result<Option<EmbedRow>> {
    let sql = format!("SELECT {EMBED_COLUMNS} FROM embeds WHERE id = ?");
    let row = sqlx::query_as::<_, EmbedRow>(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row)
}

pub async fn list_embeds(pool: &AnyPool, record_type: Option<&str>) -> Result<Vec<EmbedRow>> {
    let rows = if let Some(rt) = record_type {
        let sql = format!("SELECT {EMBED_COLUMNS} FROM embeds WHERE record_type = ? ORDER BY id");
        sqlx::query_as::<_, EmbedRow>(&sql).bind(rt).fetch_all(pool).await?
    } else {
        let sql = format!("SELECT {EMBED_COLUMNS} FROM embeds ORDER BY id");
        sqlx::query_as::<_, EmbedRow>(&sql).fetch_all(pool).await?
    };
    Ok(rows)
}

pub async fn delete_embed(pool: &AnyPool, id: i64) -> Result<u64> {
    let res = sqlx::query("DELETE FROM embeds WHERE id = ?").bind(id).execute(pool).await?;
    Ok(res.rows_affected())
}

pub async fn find_folder_id(pool: &AnyPool, parent_id: i64, name: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM folders WHERE parent_id = ? AND name = ? LIMIT 1")
        .bind(parent_id)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

pub async fn insert_folder(pool: &AnyPool, parent_id: i64, name: &str) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>("INSERT INTO folders(parent_id, name) VALUES(?, ?) RETURNING id")
        .bind(parent_id)
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

pub async fn find_asset_by_name(pool: &AnyPool, name: &str, parent_id: i64) -> Result<Option<AssetRow>> {
    let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE name = ? AND parent_id = ? ORDER BY id LIMIT 1");
    let row = sqlx::query_as::<_, AssetRow>(&sql).bind(name).bind(parent_id).fetch_optional(pool).await?;
    Ok(row)
}

pub async fn get_asset(pool: &AnyPool, id: i64) -> Result<Option<AssetRow>> {
    let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?");
    let row = sqlx::query_as::<_, AssetRow>(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row)
}

pub async fn insert_asset(pool: &AnyPool, a: &AssetRow) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO assets(parent_id, name, title, owner_id, show_in_search, file_path)\n         VALUES(?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(a.parent_id)
    .bind(&a.name)
    .bind(&a.title)
    .bind(a.owner_id)
    .bind(a.show_in_search)
    .bind(&a.file_path)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update_asset(pool: &AnyPool, a: &AssetRow) -> Result<u64> {
    let res = sqlx::query(
        "UPDATE assets SET parent_id=?, name=?, title=?, owner_id=?, show_in_search=?, file_path=?, updated_at=CURRENT_TIMESTAMP\n         WHERE id = ?",
    )
    .bind(a.parent_id)
    .bind(&a.name)
    .bind(&a.title)
    .bind(a.owner_id)
    .bind(a.show_in_search)
    .bind(&a.file_path)
    .bind(a.id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn count_assets(pool: &AnyPool) -> Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assets").fetch_one(pool).await?;
    Ok(n)
}
