use serde::Serialize;

use crate::config::ProfileConfig;

/// Fields the embed contributor owns; any scaffolded copies are removed first.
pub const EMBED_FIELD_NAMES: [&str; 10] = [
    "EmbedTitle",
    "EmbedType",
    "EmbedSourceURL",
    "EmbedSourceImageURL",
    "EmbedHTML",
    "EmbedWidth",
    "EmbedHeight",
    "EmbedAspectRatio",
    "EmbedDescription",
    "EmbedImage",
];

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "gif"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    ReadOnly,
    Upload { folder: String, allowed_extensions: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub tab: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FormField {
    fn new(name: &str, label: &str, tab: &str, kind: FieldKind) -> Self {
        Self { name: name.into(), label: label.into(), tab: tab.into(), kind, description: None }
    }

    fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Ordered field list for an edit form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldList {
    pub fields: Vec<FormField>,
}

impl FieldList {
    pub fn push(&mut self, field: FormField) { self.fields.push(field); }

    pub fn remove_by_name(&mut self, names: &[&str]) {
        self.fields.retain(|f| !names.contains(&f.name.as_str()));
    }

    /// Insert before the named field, or append when it is absent.
    pub fn insert_before(&mut self, before: &str, field: FormField) {
        match self.fields.iter().position(|f| f.name == before) {
            Some(i) => self.fields.insert(i, field),
            None => self.fields.push(field),
        }
    }

    pub fn names(&self) -> Vec<&str> { self.fields.iter().map(|f| f.name.as_str()).collect() }
}

/// What a contributor knows about the record being edited.
#[derive(Debug, Clone, Copy)]
pub struct FormContext<'a> {
    pub record_type: &'a str,
    pub profile: &'a ProfileConfig,
}

pub type FieldContributor = fn(&FormContext<'_>, &mut FieldList);

/// Runs contributors in registration order over a shared field list.
#[derive(Clone, Default)]
pub struct FormBuilder {
    contributors: Vec<FieldContributor>,
}

impl FormBuilder {
    pub fn new() -> Self { Self::default() }

    /// Builder preloaded with the embed fields contributor.
    pub fn with_embed_fields() -> Self {
        let mut b = Self::new();
        b.register(embed_fields);
        b
    }

    pub fn register(&mut self, contributor: FieldContributor) -> &mut Self {
        self.contributors.push(contributor);
        self
    }

    pub fn build(&self, ctx: &FormContext<'_>, mut fields: FieldList) -> FieldList {
        for contribute in &self.contributors {
            contribute(ctx, &mut fields);
        }
        fields
    }
}

pub fn embed_fields(ctx: &FormContext<'_>, fields: &mut FieldList) {
    let tab = format!("Root.{}", ctx.profile.tab());
    fields.remove_by_name(&EMBED_FIELD_NAMES);

    fields.push(FormField::new("EmbedTitle", "Title", &tab, FieldKind::Text).describe("Optional. Will be auto-generated if left blank"));
    fields.push(FormField::new("EmbedSourceURL", "Source URL", &tab, FieldKind::Text).describe("Specify a external URL"));
    fields.push(FormField::new(
        "EmbedImage",
        "Image",
        &tab,
        FieldKind::Upload {
            folder: ctx.profile.folder(ctx.record_type).to_string(),
            allowed_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        },
    ));
    fields.push(FormField::new("EmbedDescription", "Description", &tab, FieldKind::TextArea));

    // Type is informative only when the profile permits a choice.
    if ctx.profile.allowed_types().is_some_and(|t| t.len() > 1) {
        fields.insert_before("EmbedImage", FormField::new("EmbedType", "Type", &tab, FieldKind::ReadOnly));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(record_type: &str, profile: &ProfileConfig) -> FieldList {
        let ctx = FormContext { record_type, profile };
        FormBuilder::with_embed_fields().build(&ctx, FieldList::default())
    }

    #[test]
    fn default_form_layout() {
        let fields = build("Embed", &ProfileConfig::default());
        assert_eq!(fields.names(), vec!["EmbedTitle", "EmbedSourceURL", "EmbedImage", "EmbedDescription"]);
        assert!(fields.fields.iter().all(|f| f.tab == "Root.Main"));
        match &fields.fields[2].kind {
            FieldKind::Upload { folder, allowed_extensions } => {
                assert_eq!(folder, "Embed");
                assert_eq!(allowed_extensions, &vec!["jpg".to_string(), "png".into(), "gif".into()]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn type_shown_only_with_several_allowed_types() {
        let one = ProfileConfig { allowed_embed_types: Some(vec!["video".into()]), ..Default::default() };
        assert!(!build("Video", &one).names().contains(&"EmbedType"));

        let two = ProfileConfig {
            embed_tab: Some("Media".into()),
            allowed_embed_types: Some(vec!["video".into(), "rich".into()]),
            ..Default::default()
        };
        let fields = build("Clip", &two);
        assert_eq!(fields.names(), vec!["EmbedTitle", "EmbedSourceURL", "EmbedType", "EmbedImage", "EmbedDescription"]);
        assert_eq!(fields.fields[2].kind, FieldKind::ReadOnly);
        assert_eq!(fields.fields[2].tab, "Root.Media");
    }

    #[test]
    fn scaffolded_fields_are_replaced_and_others_kept() {
        let mut scaffold = FieldList::default();
        scaffold.push(FormField::new("EmbedHTML", "HTML", "Root.Main", FieldKind::TextArea));
        scaffold.push(FormField::new("Sort", "Sort", "Root.Main", FieldKind::Text));
        let ctx = FormContext { record_type: "Embed", profile: &ProfileConfig::default() };
        let fields = FormBuilder::with_embed_fields().build(&ctx, scaffold);
        assert_eq!(fields.names()[0], "Sort");
        assert!(!fields.names().contains(&"EmbedHTML"));
    }

    #[test]
    fn contributors_run_in_registration_order() {
        fn extra(_: &FormContext<'_>, fields: &mut FieldList) {
            fields.insert_before("EmbedDescription", FormField::new("Credit", "Credit", "Root.Main", FieldKind::Text));
        }
        let mut builder = FormBuilder::with_embed_fields();
        builder.register(extra);
        let ctx = FormContext { record_type: "Embed", profile: &ProfileConfig::default() };
        let fields = builder.build(&ctx, FieldList::default());
        assert_eq!(fields.names(), vec!["EmbedTitle", "EmbedSourceURL", "EmbedImage", "Credit", "EmbedDescription"]);
    }

    #[test]
    fn serializes_kind_inline() {
        let fields = build("Embed", &ProfileConfig::default());
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["fields"][0]["kind"], "text");
        assert_eq!(json["fields"][2]["folder"], "Embed");
    }
}
