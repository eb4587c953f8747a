use readability::extractor;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::extractor::model::ReadabilityResult;

/// Text shorter than this in a candidate container is treated as chrome.
const MIN_CONTAINER_TEXT: usize = 100;

static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "article",
        "main",
        "[role='main']",
        "[itemprop='articleBody']",
        ".article-body",
        ".entry-content",
        ".post-content",
        ".content",
        ".article",
        "#content",
        "#main",
    ]
    .iter()
    .filter_map(|s| Selector::parse(s).ok())
    .collect()
});

static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, h2, h3, li, blockquote").unwrap());

static TITLE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["meta[property='og:title']", "title", "h1"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

pub fn extract(html: &str, url: &Url) -> Option<ReadabilityResult> {
    if let Ok(article) = extractor::extract(&mut html.as_bytes(), url)
        && !article.text.trim().is_empty()
    {
        let document = Html::parse_document(html);
        let title = if article.title.trim().is_empty() {
            extract_title(&document).unwrap_or_default()
        } else {
            article.title.trim().to_string()
        };
        return Some(ReadabilityResult {
            title,
            text: article.text,
        });
    }

    fallback_extract(html)
}

fn fallback_extract(html: &str) -> Option<ReadabilityResult> {
    let document = Html::parse_document(html);
    let title = extract_title(&document).unwrap_or_default();
    let text = extract_main_content(&document);

    if title.is_empty() && text.trim().is_empty() {
        return None;
    }
    Some(ReadabilityResult { title, text })
}

pub fn extract_title(document: &Html) -> Option<String> {
    for selector in TITLE_SELECTORS.iter() {
        for element in document.select(selector) {
            let title = match element.value().attr("content") {
                Some(content) => content.trim().to_string(),
                None => element.text().collect::<String>().trim().to_string(),
            };
            if !title.is_empty() {
                return Some(title);
            }
        }
    }
    None
}

fn extract_main_content(document: &Html) -> String {
    for selector in CONTENT_SELECTORS.iter() {
        for element in document.select(selector) {
            let blocks: Vec<String> = element
                .select(&PARAGRAPH_SELECTOR)
                .map(|p| p.text().collect::<String>().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            let text = if blocks.is_empty() {
                element.text().collect::<String>()
            } else {
                blocks.join("\n\n")
            };
            if text.trim().len() > MIN_CONTAINER_TEXT {
                return text;
            }
        }
    }

    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    paragraphs.join("\n\n")
}
