//! Page metadata pulled from the DOM: authors, images, video embeds,
//! meta tags and the publication date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use url::Url;

use crate::extractor::cleaner::resolve_link;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static META: LazyLock<Selector> = LazyLock::new(|| selector("meta[content]"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img[src]"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='canonical'][href]"));
static IMAGE_SRC: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='image_src'][href]"));
static HTML_LANG: LazyLock<Selector> = LazyLock::new(|| selector("html[lang]"));
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| selector("script[type='application/ld+json']"));
static TIME_DATETIME: LazyLock<Selector> = LazyLock::new(|| selector("time[datetime]"));
static MOVIE_SOURCES: LazyLock<Selector> =
    LazyLock::new(|| selector("iframe[src], embed[src], video[src], video source[src], object[data]"));
static AUTHOR_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    selector("[rel='author'], [itemprop='author'], .byline, .author, .author-name, .byline-name")
});

static URL_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/((?:19|20)\d{2})[/-](0[1-9]|1[0-2])[/-](0[1-9]|[12]\d|3[01])(?:/|$)").unwrap()
});
static AUTHOR_SPLIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:,|\band\b|&|\|)\s*").unwrap());
static BY_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*by[:\s]+").unwrap());

/// Meta tags checked for a publication date, in priority order.
const DATE_META_KEYS: &[&str] = &[
    "article:published_time",
    "og:published_time",
    "article:published",
    "datepublished",
    "pubdate",
    "publishdate",
    "publish-date",
    "publication_date",
    "sailthru.date",
    "dc.date.issued",
    "dc.date",
    "date",
];

const MOVIE_HOSTS: &[&str] = &[
    "youtube.com",
    "youtube-nocookie.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "facebook.com/plugins/video",
    "players.brightcove.net",
    "twitch.tv",
];

/// Longest plausible byline; anything longer is prose, not a name.
const MAX_AUTHOR_LEN: usize = 60;

/// Every `meta[name|property|itemprop]`, keyed lowercase. The first occurrence wins.
pub fn meta_data(document: &Html) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    for element in document.select(&META) {
        let value = element.value();
        let Some(key) = value
            .attr("property")
            .or_else(|| value.attr("name"))
            .or_else(|| value.attr("itemprop"))
        else {
            continue;
        };
        let content = value.attr("content").unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        meta.entry(key.trim().to_lowercase())
            .or_insert_with(|| content.to_string());
    }
    meta
}

pub fn canonical_link(document: &Html, meta: &BTreeMap<String, String>, base: &Url) -> Option<String> {
    document
        .select(&CANONICAL)
        .filter_map(|e| e.value().attr("href"))
        .find_map(|href| resolve_link(base, href))
        .or_else(|| meta.get("og:url").and_then(|u| resolve_link(base, u)))
}

/// All `img[src]` in document order, resolved and deduplicated.
pub fn images(document: &Html, base: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .select(&IMG)
        .filter_map(|e| e.value().attr("src"))
        .filter_map(|src| resolve_link(base, src))
        .filter(|src| seen.insert(src.clone()))
        .collect()
}

pub fn top_image(
    document: &Html,
    meta: &BTreeMap<String, String>,
    images: &[String],
    base: &Url,
) -> Option<String> {
    ["og:image", "og:image:url", "twitter:image", "twitter:image:src"]
        .iter()
        .filter_map(|key| meta.get(*key))
        .find_map(|src| resolve_link(base, src))
        .or_else(|| {
            document
                .select(&IMAGE_SRC)
                .filter_map(|e| e.value().attr("href"))
                .find_map(|href| resolve_link(base, href))
        })
        .or_else(|| images.first().cloned())
}

/// Embedded videos from known hosting providers.
pub fn movies(document: &Html, base: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .select(&MOVIE_SOURCES)
        .filter_map(|e| e.value().attr("src").or_else(|| e.value().attr("data")))
        .filter_map(|src| resolve_link(base, src))
        .filter(|src| MOVIE_HOSTS.iter().any(|host| src.contains(host)))
        .filter(|src| seen.insert(src.clone()))
        .collect()
}

pub fn authors(document: &Html, meta: &BTreeMap<String, String>) -> Vec<String> {
    let mut candidates: Vec<String> = ["author", "article:author", "byl", "dc.creator", "sailthru.author"]
        .iter()
        .filter_map(|key| meta.get(*key).cloned())
        .filter(|value| !value.starts_with("http"))
        .collect();

    for element in document.select(&AUTHOR_ELEMENTS) {
        let text = element
            .value()
            .attr("content")
            .map(str::to_string)
            .unwrap_or_else(|| element.text().collect::<Vec<_>>().join(" "));
        candidates.push(text);
    }

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for candidate in candidates {
        let stripped = BY_PREFIX_REGEX.replace(candidate.trim(), "");
        for name in AUTHOR_SPLIT_REGEX.split(&stripped) {
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            if name.is_empty() || name.len() > MAX_AUTHOR_LEN || name.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            if seen.insert(name.to_lowercase()) {
                names.push(name);
            }
        }
    }
    names
}

/// Declared page language from `<html lang>` or `og:locale`.
pub fn declared_language(document: &Html, meta: &BTreeMap<String, String>) -> Option<String> {
    document
        .select(&HTML_LANG)
        .filter_map(|e| e.value().attr("lang"))
        .map(str::trim)
        .find(|lang| !lang.is_empty())
        .map(str::to_string)
        .or_else(|| meta.get("og:locale").cloned())
        .or_else(|| meta.get("content-language").cloned())
}

/// Publication date as epoch seconds. `None` means the page gives no usable date.
pub fn publish_date(document: &Html, meta: &BTreeMap<String, String>, url: &Url) -> Option<i64> {
    DATE_META_KEYS
        .iter()
        .filter_map(|key| meta.get(*key))
        .find_map(|raw| parse_date(raw))
        .or_else(|| json_ld_date(document))
        .or_else(|| {
            document
                .select(&TIME_DATETIME)
                .filter_map(|e| e.value().attr("datetime"))
                .find_map(parse_date)
        })
        .or_else(|| date_from_url(url))
        .map(|date| date.timestamp())
}

fn json_ld_date(document: &Html) -> Option<DateTime<Utc>> {
    document.select(&JSON_LD).find_map(|script| {
        let raw = script.text().collect::<String>();
        let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
        find_date_published(&value)
    })
}

fn find_date_published(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Object(map) => map
            .get("datePublished")
            .and_then(|v| v.as_str())
            .and_then(parse_date)
            .or_else(|| map.get("@graph").and_then(find_date_published)),
        serde_json::Value::Array(items) => items.iter().find_map(find_date_published),
        _ => None,
    }
}

fn date_from_url(url: &Url) -> Option<DateTime<Utc>> {
    let caps = URL_DATE_REGEX.captures(url.path())?;
    let date = NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}
