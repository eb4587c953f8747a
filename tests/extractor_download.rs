use newsgather::extractor::{ContentExtractor, ExtractError, ReadabilityExtractor};
use newsgather::fetcher::FetchError;
use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const STORY: &str = r#"<html lang="en">
<head>
  <title>Local Library Reopens</title>
  <meta name="author" content="Sam Rivera">
  <meta property="article:published_time" content="2019-05-06T00:00:00Z">
</head>
<body>
  <article>
    <h1>Local Library Reopens</h1>
    <p>The local library reopened its doors on Monday after a renovation that lasted almost two years and added a new reading room.</p>
    <p>Visitors lined up before opening time to see the new children's section, the restored windows and the expanded collection of local history.</p>
  </article>
</body>
</html>"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_download_and_parse_article() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/library"))
        .respond_with(html(STORY))
        .mount(&mock_server)
        .await;

    let extractor = ReadabilityExtractor::new(Duration::ZERO);
    let url = format!("{}/library", mock_server.uri());
    let article = extractor.download_and_parse(&url).await.unwrap();

    assert_eq!(article.source_url, url);
    assert!(article.title.contains("Local Library Reopens"));
    assert!(article.text.contains("renovation"));
    assert_eq!(article.authors, vec!["Sam Rivera".to_string()]);
    assert_eq!(article.publish_date, Some(1_557_100_800));
}

#[tokio::test]
async fn test_download_failure_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let extractor = ReadabilityExtractor::new(Duration::ZERO);
    let result = extractor
        .download_and_parse(&format!("{}/missing", mock_server.uri()))
        .await;

    match result {
        Err(ExtractError::Download(FetchError::Http(status))) => assert_eq!(status.as_u16(), 404),
        other => panic!("expected download failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_settle_delay_is_applied_after_download() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/library"))
        .respond_with(html(STORY))
        .mount(&mock_server)
        .await;

    let extractor = ReadabilityExtractor::new(Duration::from_millis(150));
    let started = Instant::now();
    extractor
        .download_and_parse(&format!("{}/library", mock_server.uri()))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_failed_attempts_are_spaced_by_settle_delay() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let delay = Duration::from_millis(200);
    let extractor = ReadabilityExtractor::new(delay);
    let started = Instant::now();
    for page in ["/http-attempt", "/https-attempt"] {
        let result = extractor
            .download_and_parse(&format!("{}{page}", mock_server.uri()))
            .await;
        assert!(matches!(result, Err(ExtractError::Download(_))));
    }

    assert!(
        started.elapsed() >= delay * 2,
        "two failed attempts finished in {:?}",
        started.elapsed()
    );
}
