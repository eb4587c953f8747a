#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use newsgather::extractor::parse_article;
use newsgather::fetcher::PageResponse;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data).to_string();
    let Ok(url) = Url::parse("https://example.com/story") else {
        return;
    };

    // Parsing must never panic, whatever the page looks like
    let page = PageResponse::from_html(url, html);
    if let Ok(article) = parse_article(&page) {
        assert!(!(article.title.is_empty() && article.text.is_empty()));
    }
});
