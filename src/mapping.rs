use crate::dao::{AssetRow, EmbedRow};
use crate::storage::Asset;
use crate::types::{EmbedRecord, EmbedType};

pub fn embed_row_from_record(id: i64, r: &EmbedRecord) -> EmbedRow {
    EmbedRow {
        id,
        record_type: r.record_type.clone(),
        title: r.title.clone(),
        embed_type: r.embed_type.as_ref().map(|t| t.as_str().to_string()),
        source_url: r.source_url.clone(),
        source_image_url: r.source_image_url.clone(),
        html: r.html.clone(),
        width: r.width,
        height: r.height,
        aspect_ratio: r.aspect_ratio,
        description: r.description.clone(),
        image_id: r.image_id,
    }
}

pub fn record_from_embed_row(row: EmbedRow) -> EmbedRecord {
    EmbedRecord {
        id: Some(row.id),
        record_type: row.record_type,
        title: row.title,
        embed_type: row.embed_type.filter(|s| !s.is_empty()).map(EmbedType::from),
        source_url: row.source_url,
        source_image_url: row.source_image_url,
        html: row.html,
        width: row.width,
        height: row.height,
        aspect_ratio: row.aspect_ratio,
        description: row.description,
        image_id: row.image_id,
    }
}

pub fn asset_from_row(row: AssetRow) -> Asset {
    Asset {
        id: Some(row.id),
        parent_id: row.parent_id,
        name: row.name,
        title: row.title,
        owner_id: row.owner_id,
        show_in_search: row.show_in_search != 0,
        file_path: row.file_path,
    }
}

pub fn asset_row_from(id: i64, a: &Asset) -> AssetRow {
    AssetRow {
        id,
        parent_id: a.parent_id,
        name: a.name.clone(),
        title: a.title.clone(),
        owner_id: a.owner_id,
        show_in_search: i64::from(a.show_in_search),
        file_path: a.file_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_row_keeps_type_as_text() {
        let rec = EmbedRecord {
            title: "Clip".into(),
            embed_type: Some(EmbedType::Video),
            source_url: "https://video.example/1".into(),
            width: Some(640),
            ..EmbedRecord::new("Video")
        };
        let row = embed_row_from_record(3, &rec);
        assert_eq!(row.embed_type.as_deref(), Some("video"));
        let back = record_from_embed_row(row);
        assert_eq!(back.id, Some(3));
        assert_eq!(back.embed_type, Some(EmbedType::Video));
        assert_eq!(back.width, Some(640));
    }

    #[test]
    fn blank_type_column_reads_as_none() {
        let row = embed_row_from_record(1, &EmbedRecord::new("Embed"));
        assert_eq!(row.embed_type, None);
        let mut row = row;
        row.embed_type = Some(String::new());
        assert_eq!(record_from_embed_row(row).embed_type, None);
    }
}
