//! Remote metadata lookup: oEmbed discovery first, OpenGraph and plain HTML as fallback.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::error::EmbedError;
use crate::types::{aspect_ratio, EmbedType, SourceMetadata};

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<SourceMetadata>;
}

/// oEmbed response fields we use. Providers disagree on numbers vs strings for sizes.
#[derive(Debug, Default, Deserialize)]
struct OEmbed {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    width: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    height: Option<i64>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    })
}

/// What the HTML head tells us.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub oembed_url: Option<String>,
    /// `og:*` properties, first occurrence wins.
    pub og: HashMap<String, String>,
}

pub struct PageParser {
    tag: Regex,
    attr: Regex,
    title: Regex,
}

impl PageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag: Regex::new(r#"(?is)<(meta|link)\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#)?,
            attr: Regex::new(r#"(?s)([a-zA-Z_:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)?,
            title: Regex::new(r"(?is)<title[^>]*>(.*?)</title>")?,
        })
    }

    pub fn parse(&self, html: &str, base: &Url) -> PageMeta {
        let mut page = PageMeta::default();
        for cap in self.tag.captures_iter(html) {
            let tag = cap[1].to_ascii_lowercase();
            let attrs = self.attributes(&cap[2]);
            if tag == "link" {
                let is_oembed = attrs.get("type").is_some_and(|t| t.eq_ignore_ascii_case("application/json+oembed"));
                if is_oembed && page.oembed_url.is_none() {
                    page.oembed_url = attrs.get("href").and_then(|h| resolve(base, h));
                }
                continue;
            }
            let Some(content) = attrs.get("content") else { continue };
            if let Some(prop) = attrs.get("property").or_else(|| attrs.get("name")) {
                let prop = prop.to_ascii_lowercase();
                if prop.starts_with("og:") {
                    page.og.entry(prop).or_insert_with(|| content.clone());
                } else if prop == "description" && page.description.is_none() {
                    page.description = Some(content.clone());
                }
            }
        }
        page.title = self.title.captures(html).map(|c| decode_entities(c[1].trim())).filter(|t| !t.is_empty());
        page
    }

    fn attributes(&self, raw: &str) -> HashMap<String, String> {
        self.attr
            .captures_iter(raw)
            .map(|c| {
                let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4)).map(|m| m.as_str()).unwrap_or("");
                (c[1].to_ascii_lowercase(), decode_entities(value))
            })
            .collect()
    }
}

pub struct HttpExtractor {
    client: reqwest::Client,
    parser: PageParser,
}

impl HttpExtractor {
    pub fn new(client: reqwest::Client) -> Result<Self> {
        Ok(Self { client, parser: PageParser::new()? })
    }

    async fn fetch_oembed(&self, endpoint: &str) -> Result<OEmbed> {
        let resp = self
            .client
            .get(endpoint)
            .send()
            .await
            .with_context(|| format!("fetching oEmbed: {endpoint}"))?
            .error_for_status()
            .with_context(|| format!("fetching oEmbed: {endpoint}"))?;
        resp.json::<OEmbed>().await.with_context(|| format!("parsing oEmbed: {endpoint}"))
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<SourceMetadata> {
        let page_url = Url::parse(url.trim()).map_err(|_| EmbedError::InvalidUrl { url: url.to_string() })?;
        let resp = self
            .client
            .get(page_url.clone())
            .send()
            .await
            .with_context(|| format!("fetching {page_url}"))?
            .error_for_status()
            .with_context(|| format!("fetching {page_url}"))?;

        let final_url = resp.url().clone();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("image/") {
            debug!(url = %final_url, %content_type, "source is an image");
            return Ok(photo_metadata(&final_url));
        }

        let body = resp.text().await.with_context(|| format!("reading {final_url}"))?;
        let page = self.parser.parse(&body, &final_url);
        let oembed = match &page.oembed_url {
            Some(endpoint) => {
                debug!(%endpoint, "oEmbed discovered");
                Some(self.fetch_oembed(endpoint).await?)
            }
            None => None,
        };
        Ok(merge(oembed, page, &final_url))
    }
}

fn photo_metadata(url: &Url) -> SourceMetadata {
    let title = url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| url.host_str().unwrap_or(""))
        .to_string();
    SourceMetadata { title, embed_type: EmbedType::Photo, image: Some(url.to_string()), ..Default::default() }
}

fn merge(oembed: Option<OEmbed>, page: PageMeta, base: &Url) -> SourceMetadata {
    let oe = oembed.unwrap_or_default();
    let og = |key: &str| page.og.get(key).filter(|v| !v.is_empty()).cloned();

    let embed_type = match oe.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(k) => EmbedType::from(k),
        None => match og("og:type") {
            Some(t) if t.to_ascii_lowercase().starts_with("video") => EmbedType::Video,
            _ => EmbedType::Link,
        },
    };

    let width = oe.width.or_else(|| og("og:video:width").and_then(|v| v.trim().parse().ok()));
    let height = oe.height.or_else(|| og("og:video:height").and_then(|v| v.trim().parse().ok()));

    let photo_url = if embed_type == EmbedType::Photo { oe.url.clone() } else { None };
    let image = non_empty(oe.thumbnail_url)
        .or(photo_url)
        .or_else(|| og("og:image"))
        .and_then(|u| resolve(base, &u));

    SourceMetadata {
        title: non_empty(oe.title).or_else(|| og("og:title")).or(page.title).unwrap_or_default(),
        description: non_empty(oe.description).or_else(|| og("og:description")).or(page.description).unwrap_or_default(),
        code: oe.html.unwrap_or_default(),
        embed_type,
        width,
        height,
        aspect_ratio: aspect_ratio(width, height),
        image,
    }
}

fn non_empty(v: Option<String>) -> Option<String> { v.filter(|s| !s.trim().is_empty()) }

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}

pub fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
