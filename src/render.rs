//! Turns an embed record into HTML.
//!
//! A registered template named `<base>_<type>` wins, then `<base>`. Without
//! either, markup is synthesized from the embed type.

use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::types::{EmbedRecord, EmbedType};

pub const DEFAULT_TEMPLATE: &str = "Embed";

/// CSS classes in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedClasses(Vec<String>);

impl EmbedClasses {
    /// Add one or more space separated classes.
    pub fn add(&mut self, classes: &str) -> &mut Self {
        for c in classes.split(' ').filter(|c| !c.is_empty()) {
            if !self.0.iter().any(|have| have == c) {
                self.0.push(c.to_string());
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn joined(&self) -> Option<String> {
        if self.0.is_empty() { None } else { Some(self.0.join(" ")) }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub template: String,
    pub classes: EmbedClasses,
}

impl Default for RenderOptions {
    fn default() -> Self { Self { template: DEFAULT_TEMPLATE.to_string(), classes: EmbedClasses::default() } }
}

impl RenderOptions {
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_class(mut self, classes: &str) -> Self {
        self.classes.add(classes);
        self
    }
}

/// Values a template can reference.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub record: &'a EmbedRecord,
    pub class: Option<String>,
}

impl RenderContext<'_> {
    /// Placeholder value and whether it is inserted without escaping.
    pub fn value(&self, key: &str) -> Option<(String, bool)> {
        let r = self.record;
        let num = |n: Option<i64>| n.map(|v| v.to_string()).unwrap_or_default();
        Some(match key {
            "html" => (r.html.clone(), true),
            "title" => (r.title.clone(), false),
            "type" => (r.embed_type.as_ref().map(|t| t.as_str().to_string()).unwrap_or_default(), false),
            "class" => (self.class.clone().unwrap_or_default(), false),
            "source_url" => (r.source_url.clone(), false),
            "width" => (num(r.width), false),
            "height" => (num(r.height), false),
            "aspect_ratio" => (r.aspect_ratio.map(|v| v.to_string()).unwrap_or_default(), false),
            "description" => (r.description.clone(), false),
            _ => return None,
        })
    }
}

pub trait TemplateRegistry: Send + Sync {
    fn has_template(&self, name: &str) -> bool;
    fn render(&self, name: &str, ctx: &RenderContext<'_>) -> Result<String>;
}

/// Templates held in memory. `{{ key }}` placeholders are replaced with escaped
/// values; `{{ html }}` is inserted as is. Unknown keys render empty.
pub struct MemoryTemplates {
    templates: HashMap<String, String>,
    placeholder: Regex,
}

impl MemoryTemplates {
    pub fn new() -> Result<Self> {
        Ok(Self { templates: HashMap::new(), placeholder: Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}")? })
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.templates.insert(name.into(), source.into());
        self
    }

    pub fn len(&self) -> usize { self.templates.len() }

    pub fn is_empty(&self) -> bool { self.templates.is_empty() }
}

impl TemplateRegistry for MemoryTemplates {
    fn has_template(&self, name: &str) -> bool { self.templates.contains_key(name) }

    fn render(&self, name: &str, ctx: &RenderContext<'_>) -> Result<String> {
        let source = self.templates.get(name).ok_or_else(|| anyhow!("template not found: {name}"))?;
        let out = self.placeholder.replace_all(source, |caps: &Captures| match ctx.value(&caps[1]) {
            Some((v, true)) => v,
            Some((v, false)) => escape_html(&v),
            None => String::new(),
        });
        Ok(out.into_owned())
    }
}

/// Templates read from `<name>.html` files in a directory.
pub struct DirectoryTemplates {
    inner: MemoryTemplates,
}

impl DirectoryTemplates {
    pub fn load(dir: &Path) -> Result<Self> {
        let mut inner = MemoryTemplates::new()?;
        let entries = std::fs::read_dir(dir).with_context(|| format!("reading templates dir: {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") { continue; }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else { continue };
            let source = std::fs::read_to_string(&path).with_context(|| format!("reading template: {}", path.display()))?;
            inner.insert(name, source);
        }
        debug!(dir = %dir.display(), count = inner.len(), "templates loaded");
        Ok(Self { inner })
    }

    pub fn len(&self) -> usize { self.inner.len() }

    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

impl TemplateRegistry for DirectoryTemplates {
    fn has_template(&self, name: &str) -> bool { self.inner.has_template(name) }

    fn render(&self, name: &str, ctx: &RenderContext<'_>) -> Result<String> { self.inner.render(name, ctx) }
}

/// Minimal element builder for the inline fallbacks.
#[derive(Debug, Clone)]
pub struct HtmlTag {
    name: &'static str,
    inner: Option<String>,
    attrs: Vec<(&'static str, String)>,
}

impl HtmlTag {
    pub fn new(name: &'static str) -> Self { Self { name, inner: None, attrs: Vec::new() } }

    pub fn raw(mut self, html: &str) -> Self {
        self.inner = Some(html.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.inner = Some(escape_html(text));
        self
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    pub fn class(self, class: Option<String>) -> Self {
        match class {
            Some(c) => self.attr("class", c),
            None => self,
        }
    }

    fn is_void(&self) -> bool { matches!(self.name, "img" | "br" | "hr" | "input" | "meta" | "link") }
}

impl fmt::Display for HtmlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (k, v) in &self.attrs {
            write!(f, " {}=\"{}\"", k, escape_html(v))?;
        }
        if self.is_void() {
            return f.write_str(" />");
        }
        write!(f, ">{}</{}>", self.inner.as_deref().unwrap_or(""), self.name)
    }
}

/// Template names to try, most specific first.
pub fn candidate_templates(base: &str, embed_type: Option<&EmbedType>) -> Vec<String> {
    let mut names = Vec::with_capacity(2);
    if let Some(t) = embed_type {
        names.push(format!("{}_{}", base, t.as_str()));
    }
    names.push(base.to_string());
    names
}

pub fn render_embed(record: &EmbedRecord, opts: &RenderOptions, registry: &dyn TemplateRegistry) -> Result<String> {
    let class = opts.classes.joined();
    for name in candidate_templates(&opts.template, record.embed_type.as_ref()) {
        if registry.has_template(&name) {
            debug!(template = %name, "rendering with template");
            let ctx = RenderContext { record, class };
            return registry.render(&name, &ctx);
        }
    }
    Ok(inline_markup(record).map(|tag| tag.class(class).to_string()).unwrap_or_default())
}

fn inline_markup(r: &EmbedRecord) -> Option<HtmlTag> {
    match r.embed_type.as_ref()? {
        EmbedType::Video | EmbedType::Rich => Some(HtmlTag::new("div").raw(&r.html)),
        EmbedType::Link => Some(HtmlTag::new("a").attr("href", r.source_url.as_str()).text(&r.title)),
        EmbedType::Photo => {
            let mut img = HtmlTag::new("img").attr("src", r.source_url.as_str());
            if let Some(w) = r.width { img = img.attr("width", w.to_string()); }
            if let Some(h) = r.height { img = img.attr("height", h.to_string()); }
            Some(img.attr("alt", r.title.as_str()))
        }
        EmbedType::Other(_) => None,
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
