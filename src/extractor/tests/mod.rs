use url::Url;

use crate::extractor::{ExtractError, parse_article};
use crate::fetcher::types::PageResponse;

const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en-US">
<head>
  <title>Senate Passes Budget Bill | News Site</title>
  <meta property="og:title" content="Senate Passes Budget Bill">
  <meta property="og:site_name" content="News Site">
  <meta property="og:image" content="/images/capitol.jpg">
  <meta name="author" content="By Jane Doe">
  <meta name="keywords" content="senate, budget">
  <meta property="article:published_time" content="2018-03-04T10:00:00Z">
  <link rel="canonical" href="https://news.example.com/politics/senate-budget">
  <script>var tracking = true;</script>
</head>
<body>
  <nav><a href="/">Home</a> <a href="/politics">Politics</a></nav>
  <article>
    <h1>Senate Passes Budget Bill</h1>
    <p>The senate passed the budget bill late on Saturday after a long debate over spending priorities for the coming fiscal year.</p>
    <p>Supporters of the budget said the bill would fund infrastructure, schools and hospitals while trimming administrative overhead across agencies.</p>
    <p>Critics of the budget argued that the senate ignored rising deficits and warned that the bill pushes difficult decisions onto future lawmakers.</p>
    <img src="/images/vote.jpg" alt="vote">
    <iframe src="https://www.youtube.com/embed/abc123"></iframe>
  </article>
  <footer>Copyright News Site</footer>
</body>
</html>"#;

fn page(html: &str, url: &str) -> PageResponse {
    PageResponse::from_html(Url::parse(url).unwrap(), html)
}

#[test]
fn test_parse_full_article() {
    let article = parse_article(&page(ARTICLE_HTML, "https://news.example.com/politics/senate-budget")).unwrap();

    assert!(article.title.contains("Senate Passes Budget Bill"));
    assert!(article.text.contains("passed the budget bill"));
    assert!(article.text.contains("Critics of the budget"));
    assert!(!article.text.contains("var tracking"));
    assert_eq!(article.authors, vec!["Jane Doe".to_string()]);
    assert_eq!(
        article.top_image.as_deref(),
        Some("https://news.example.com/images/capitol.jpg")
    );
    assert!(
        article
            .images
            .contains(&"https://news.example.com/images/vote.jpg".to_string())
    );
    assert_eq!(article.movies, vec!["https://www.youtube.com/embed/abc123".to_string()]);
    assert_eq!(
        article.canonical_link.as_deref(),
        Some("https://news.example.com/politics/senate-budget")
    );
    assert_eq!(article.publish_date, Some(1_520_157_600));
    assert_eq!(article.source, "https://news.example.com");
    assert_eq!(article.language.as_deref(), Some("en"));
    assert_eq!(
        article.meta_data.get("keywords").map(String::as_str),
        Some("senate, budget")
    );
    assert!(article.keywords.contains(&"budget".to_string()));
    assert!(!article.summary.is_empty());
}

#[test]
fn test_article_without_date_has_none() {
    let html = format!(
        r#"<html><head><title>Undated Story</title></head><body><article><p>{}</p></article></body></html>"#,
        "This story has plenty of words but no publication date anywhere on the page. ".repeat(5)
    );
    let article = parse_article(&page(&html, "https://example.com/undated")).unwrap();
    assert_eq!(article.publish_date, None);
    assert_eq!(article.title, "Undated Story");
}

#[test]
fn test_thin_page_is_still_parsed() {
    let html = "<html><head><title>Just A Title</title></head><body></body></html>";
    let article = parse_article(&page(html, "https://example.com/thin")).unwrap();
    assert_eq!(article.title, "Just A Title");
    assert!(article.authors.is_empty());
    assert!(article.movies.is_empty());
}

#[test]
fn test_empty_page_is_parse_failure() {
    let result = parse_article(&page("<html><head></head><body></body></html>", "https://example.com/empty"));
    match result {
        Err(ExtractError::Parse { url }) => assert_eq!(url, "https://example.com/empty"),
        other => panic!("expected parse failure, got {other:?}"),
    }
}

#[test]
fn test_malformed_html() {
    let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";
    // Should handle malformed HTML gracefully
    if let Ok(article) = parse_article(&page(html, "https://example.com/broken")) {
        assert_eq!(article.title, "Broken");
    }
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_parse_never_panics(
            html in ".*",
            url in "https://[a-z]+\\.com/[a-z0-9/]*"
        ) {
            let _ = parse_article(&page(&html, &url));
        }

        #[test]
        fn test_publish_date_is_never_zero_for_missing_dates(
            body in "[a-zA-Z ]{0,200}",
        ) {
            let html = format!("<html><head><title>T</title></head><body><p>{body}</p></body></html>");
            if let Ok(article) = parse_article(&page(&html, "https://example.com/a")) {
                prop_assert_eq!(article.publish_date, None);
            }
        }
    }
}
